//! Optical music recognition by delegating to Audiveris in batch mode.

use std::ffi::OsStr;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::musicxml::{locate_artifact, read_artifact};
use crate::tool::{run_with_deadline, truncate_chars, ScratchSpace, ToolCommand};
use crate::ConvertError;

pub const DEFAULT_OMR_TIMEOUT: Duration = Duration::from_secs(600);

const LOG_EXCERPT_CHARS: usize = 500;
const ERROR_EXCERPT_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct OmrRunner {
    tool: ToolCommand,
    deadline: Duration,
    scratch: ScratchSpace,
}

impl OmrRunner {
    pub fn new(tool: ToolCommand, scratch: ScratchSpace) -> Self {
        Self {
            tool,
            deadline: DEFAULT_OMR_TIMEOUT,
            scratch,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Recognize `pdf` and return the MusicXML document text.
    ///
    /// The exit status of the tool is logged but not trusted: a run counts as
    /// successful whenever it leaves a MusicXML file in its output directory.
    #[instrument(skip(self, pdf), fields(bytes = pdf.len()))]
    pub async fn recognize(&self, pdf: &[u8]) -> Result<String, ConvertError> {
        let workdir = self.scratch.create("etude-omr-")?;
        let input = workdir.path().join("input.pdf");
        let output_dir = workdir.path().join("output");
        tokio::fs::write(&input, pdf).await?;
        tokio::fs::create_dir_all(&output_dir).await?;

        let args = [
            OsStr::new("-batch"),
            OsStr::new("-export"),
            OsStr::new("-output"),
            output_dir.as_os_str(),
            OsStr::new("--"),
            input.as_os_str(),
        ];
        let output = run_with_deadline(&self.tool, args, self.deadline).await?;
        info!(
            status = %output.status,
            stdout = %truncate_chars(&output.stdout, LOG_EXCERPT_CHARS),
            stderr = %truncate_chars(&output.stderr, LOG_EXCERPT_CHARS),
            "omr finished"
        );

        let Some(artifact) = locate_artifact(&output_dir)? else {
            warn!("omr produced no musicxml");
            return Err(ConvertError::NoOutput {
                program: self.tool.display_name(),
                stderr: truncate_chars(&output.stderr, ERROR_EXCERPT_CHARS),
            });
        };
        info!(?artifact, "found musicxml artifact");
        read_artifact(&artifact)
    }
}
