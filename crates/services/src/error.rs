use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::{error, warn};

use etude_convert::ConvertError;

/// Handler failures, rendered as `{"error": "..."}` bodies.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    Timeout(String),
    /// Conversion ran but left nothing usable; `stderr` is the tool's output.
    ConversionFailed {
        message: String,
        stderr: Option<String>,
    },
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }

    pub fn from_raster(err: ConvertError) -> Self {
        match err {
            ConvertError::InvalidOption(message) => Self::BadRequest(message),
            ConvertError::Timeout { seconds, .. } => {
                Self::Timeout(format!("PDF conversion timed out ({seconds}s)"))
            }
            other => Self::Internal(format!("PDF conversion error: {other}")),
        }
    }

    pub fn from_omr(err: ConvertError) -> Self {
        match err {
            ConvertError::Timeout { seconds, .. } => {
                Self::Timeout(format!("MusicXML conversion timed out ({seconds}s)"))
            }
            ConvertError::NoOutput { program, stderr } => Self::ConversionFailed {
                message: format!(
                    "MusicXML conversion failed: {program} did not produce an output file"
                ),
                stderr: Some(stderr),
            },
            ConvertError::EmptyArchive => Self::ConversionFailed {
                message: "MusicXML conversion failed: could not extract XML from the .mxl file"
                    .to_string(),
                stderr: None,
            },
            other => Self::Internal(format!("MusicXML conversion error: {other}")),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ConversionFailed { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) | Self::PayloadTooLarge(message) => {
                warn!(%status, %message, "rejected request");
                json!({ "error": message })
            }
            Self::Timeout(message) | Self::Internal(message) => {
                error!(%status, %message, "request failed");
                json!({ "error": message })
            }
            Self::ConversionFailed { message, stderr } => {
                error!(%status, %message, "conversion failed");
                match stderr {
                    Some(stderr) => json!({ "error": message, "stderr": stderr }),
                    None => json!({ "error": message }),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
