use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} did not produce an output file")]
    NoOutput { program: String, stderr: String },
    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },
    #[error("could not read MusicXML archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("could not extract XML from the .mxl archive")]
    EmptyArchive,
    #[error("MusicXML is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ConvertError {
    pub fn invalid_option<T: Into<String>>(message: T) -> Self {
        Self::InvalidOption(message.into())
    }
}
