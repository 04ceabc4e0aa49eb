use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use etude_convert::tool::truncate_chars;
use etude_convert::{run_with_deadline, ToolCommand};
use tracing::{debug, info};

pub const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(120);

/// Converts containers symphonia cannot read (WebM/Opus browser recordings)
/// into mono PCM WAV by shelling out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    tool: ToolCommand,
    sample_rate: u32,
    deadline: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self::with_command(ToolCommand::new(program), sample_rate)
    }

    pub fn with_command(tool: ToolCommand, sample_rate: u32) -> Self {
        Self {
            tool,
            sample_rate,
            deadline: DEFAULT_TRANSCODE_TIMEOUT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn tool(&self) -> &ToolCommand {
        &self.tool
    }

    /// Blocking; drives its own single-threaded runtime so it can be called
    /// from CLI code and from `spawn_blocking` alike.
    pub fn transcode_to_wav(&self, bytes: &[u8], extension: Option<&str>) -> Result<Vec<u8>> {
        let suffix = format!(".{}", extension.unwrap_or("bin"));
        let input = tempfile::Builder::new()
            .prefix("etude-upload-")
            .suffix(&suffix)
            .tempfile()
            .context("create temporary upload file")?;
        fs::write(input.path(), bytes).context("write temporary upload file")?;
        let output = tempfile::Builder::new()
            .prefix("etude-pcm-")
            .suffix(".wav")
            .tempfile()
            .context("create temporary WAV file")?;

        let rate = self.sample_rate.to_string();
        let args = [
            OsStr::new("-hide_banner"),
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.path().as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-ac"),
            OsStr::new("1"),
            OsStr::new("-ar"),
            OsStr::new(&rate),
            OsStr::new("-f"),
            OsStr::new("wav"),
            output.path().as_os_str(),
        ];

        info!(program = %self.tool.display_name(), bytes = bytes.len(), "transcoding upload with ffmpeg");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("start transcoder runtime")?;
        let result = runtime
            .block_on(run_with_deadline(&self.tool, args, self.deadline))
            .with_context(|| format!("run {}", self.tool.display_name()))?;

        if !result.status.success() {
            bail!(
                "ffmpeg exited with {}: {}",
                result.status,
                truncate_chars(&result.stderr, 500)
            );
        }

        let wav = fs::read(output.path()).context("read transcoded WAV")?;
        debug!(bytes = wav.len(), "ffmpeg transcode finished");
        Ok(wav)
    }
}
