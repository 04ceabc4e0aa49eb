pub mod aggregate;
pub mod loader;
pub mod pipeline;

pub use aggregate::{top_class, SegmentAggregator};
pub use loader::{load_keywords, load_yamnet};
pub use pipeline::{AnalysisJob, AnalysisPipeline};
