use std::path::Path;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::AppError;

/// One file part of a multipart request.
#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// File extension from the client's file name, when it's a plausible one.
    pub fn extension(&self) -> Option<String> {
        let ext = Path::new(self.file_name.as_deref()?).extension()?.to_str()?;
        let plausible = !ext.is_empty()
            && ext.len() <= 8
            && ext.chars().all(|c| c.is_ascii_alphanumeric());
        plausible.then(|| ext.to_ascii_lowercase())
    }
}

/// Pulls the part named `name` out of the request, skipping the others.
pub async fn read_file_field(mut multipart: Multipart, name: &str) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::MissingField("No selected file".to_string()));
        }
        return Ok(Upload { file_name, bytes });
    }
    Err(AppError::MissingField(format!("No {name} file provided")))
}
