pub mod error;
pub mod musicxml;
pub mod omr;
pub mod raster;
pub mod tool;

pub use error::ConvertError;
pub use musicxml::{extract_mxl, locate_artifact, read_artifact, MusicXmlArtifact};
pub use omr::{OmrRunner, DEFAULT_OMR_TIMEOUT};
pub use raster::{PageImage, PdfRasterizer, RasterOptions, DEFAULT_RASTER_TIMEOUT};
pub use tool::{run_with_deadline, ScratchSpace, ToolCommand, ToolOutput};
