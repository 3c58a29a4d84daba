//! Multipart form reading for media uploads.

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::{AppError, AppResult};
use crate::workflow::MediaFile;
use crate::workflow::media::content_type_for_extension;

/// Multipart payload limit in bytes, shared by all upload endpoints.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Text fields and files of one multipart request, in arrival order.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<(String, MediaFile)>,
}

impl UploadForm {
    /// Read the whole payload, failing once it grows past `limit` bytes.
    pub async fn read(payload: &mut Multipart, limit: usize) -> AppResult<Self> {
        let mut form = Self::default();
        let mut total = 0usize;

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

            let name = field
                .name()
                .ok_or_else(|| AppError::InvalidInput("Missing field name in multipart".to_string()))?
                .to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let declared_type = field.content_type().map(|m| m.essence_str().to_string());

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
                total += chunk.len();
                if total > limit {
                    return Err(AppError::InvalidInput(format!(
                        "Upload exceeds the {} byte limit",
                        limit
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            match filename {
                Some(filename) => {
                    let content_type = resolve_content_type(declared_type, &filename);
                    form.files
                        .push((name, MediaFile::new(filename, content_type, data)));
                }
                None => {
                    let value = String::from_utf8(data).map_err(|_| {
                        AppError::InvalidInput(format!("Field '{}' is not valid UTF-8", name))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text field `name`, empty when absent.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// Remove and return the first file sent as `name`.
    pub fn take_file(&mut self, name: &str) -> Option<MediaFile> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }

    /// Remove and return every file sent as `name`, in order.
    pub fn take_files(&mut self, name: &str) -> Vec<MediaFile> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition::<Vec<_>, _>(|(field, _)| field == name);
        self.files = kept;
        taken.into_iter().map(|(_, file)| file).collect()
    }
}

/// Media family a file field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    fn accepts(&self, content_type: &str) -> bool {
        let prefix = match self {
            Self::Image => "image/",
            Self::Audio => "audio/",
        };
        content_type.starts_with(prefix)
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Image => "an image",
            Self::Audio => "an audio file",
        }
    }
}

/// Reject `file` unless its content type belongs to `kind`.
pub fn require_kind(file: &MediaFile, kind: MediaKind, label: &str) -> AppResult<()> {
    if kind.accepts(&file.content_type) {
        return Ok(());
    }
    Err(AppError::InvalidInput(format!(
        "{} must be {} (got {})",
        label,
        kind.noun(),
        file.content_type
    )))
}

/// Trust the declared type unless the client sent a generic one.
fn resolve_content_type(declared: Option<String>, filename: &str) -> String {
    match declared {
        Some(content_type) if content_type != "application/octet-stream" => content_type,
        _ => {
            let extension = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
            content_type_for_extension(extension).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_content_type() {
        assert_eq!(
            resolve_content_type(Some("image/png".to_string()), "a.jpg"),
            "image/png"
        );
        assert_eq!(
            resolve_content_type(Some("application/octet-stream".to_string()), "clip.m4a"),
            "audio/mp4"
        );
        assert_eq!(resolve_content_type(None, "photo.JPG"), "image/jpeg");
        assert_eq!(resolve_content_type(None, "noext"), "application/octet-stream");
    }

    #[test]
    fn test_require_kind_checks_content_type_family() {
        let photo = MediaFile::new("a.jpg", "image/jpeg", vec![1]);
        let clip = MediaFile::new("b.m4a", "audio/mp4", vec![2]);
        let notes = MediaFile::new("notes.txt", "text/plain", vec![3]);

        assert!(require_kind(&photo, MediaKind::Image, "Photo").is_ok());
        assert!(require_kind(&clip, MediaKind::Audio, "Audio").is_ok());
        assert!(require_kind(&clip, MediaKind::Image, "Photo").is_err());
        assert!(require_kind(&photo, MediaKind::Audio, "Audio").is_err());

        let err = require_kind(&notes, MediaKind::Image, "Photo").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Photo must be an image (got text/plain)"
        );
    }

    #[test]
    fn test_take_files_keeps_order_and_rest() {
        let mut form = UploadForm::default();
        form.files.push(("photo".to_string(), MediaFile::new("a", "image/jpeg", vec![1])));
        form.files.push(("audio".to_string(), MediaFile::new("b", "audio/mpeg", vec![2])));
        form.files.push(("photo".to_string(), MediaFile::new("c", "image/jpeg", vec![3])));

        let photos = form.take_files("photo");
        assert_eq!(
            photos.iter().map(|p| p.uri.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(form.take_file("audio").unwrap().uri, "b");
        assert!(form.take_file("audio").is_none());
    }
}
