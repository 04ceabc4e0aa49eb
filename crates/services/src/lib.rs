pub mod analysis;
pub mod conversion;
pub mod error;
pub mod server;
pub mod upload;

#[cfg(test)]
mod testing;

pub use analysis::{analysis_router, AnalysisState};
pub use conversion::{conversion_router, ConversionState};
pub use error::ApiError;
pub use server::{init_tracing, serve, ServerConfig, DEFAULT_MAX_UPLOAD_MB};
pub use upload::{UploadForm, UploadedFile};
