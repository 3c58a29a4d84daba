//! Media files, coordinates and object naming.

use std::path::Path;

use chrono::Utc;

use crate::error::{AppError, AppResult};

/// A picked or recorded file, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Local reference the file was picked from.
    pub uri: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(uri: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a local file, inferring its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        Ok(Self {
            uri: path.display().to_string(),
            content_type: content_type_for_extension(extension).to_string(),
            bytes,
        })
    }

    /// File extension used when storing this file.
    pub fn extension(&self) -> &'static str {
        extension_for_content_type(&self.content_type)
    }
}

/// Latitude/longitude pair from the geolocation service.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Free-text location stored on reports.
    pub fn to_location(&self) -> String {
        format!("Lat: {}, Lon: {}", self.latitude, self.longitude)
    }
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Inverse of [`content_type_for_extension`]; unknown types fall back to `bin`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/heic" => "heic",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/aac" => "aac",
        "audio/wav" => "wav",
        _ => "bin",
    }
}

/// Collision-resistant, time-based object name: `{prefix}_{millis}_{random}.{ext}`.
pub fn unique_object_name(prefix: &str, extension: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_suffix(),
        extension
    )
}

/// Nine lowercase base-36 characters.
fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value: u64 = rand::random();
    let mut suffix = String::with_capacity(9);
    for _ in 0..9 {
        suffix.push(ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    suffix
}
