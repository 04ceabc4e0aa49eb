//! Buffered multipart form parsing shared by the upload routes.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client-supplied file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Parts carrying a file name are files, all other parts are text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, ApiError> {
        let mut form = Self::default();
        let Ok(mut multipart) = multipart else {
            return Ok(form);
        };
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(ApiError::from_multipart)?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;
                    debug!(%name, %filename, bytes = bytes.len(), "received file part");
                    form.files.insert(name, UploadedFile { filename, bytes });
                }
                None => {
                    let text = field.text().await.map_err(ApiError::from_multipart)?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// A file part that is present and has a non-empty file name.
    pub fn require_named_file(&mut self, name: &str) -> Result<UploadedFile, ApiError> {
        let file = self
            .take_file(name)
            .ok_or_else(|| ApiError::bad_request(format!("a '{name}' file is required")))?;
        if file.filename.trim().is_empty() {
            return Err(ApiError::bad_request("the uploaded file has no name"));
        }
        Ok(file)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Parse a text field, using `default` when it is absent or blank.
    pub fn parse_field<T: FromStr>(&self, name: &str, default: T) -> Result<T, ApiError> {
        match self.field(name).map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::bad_request(format!("'{name}' must be a number, got '{raw}'"))),
        }
    }
}
