//! Workflow error taxonomy.
//!
//! Every failure is reported at the step where it happens and renders as a
//! blocking [`Alert`] naming the failing action. The step keeps its
//! pre-failure state.

use serde::Serialize;
use utoipa::ToSchema;

use super::ports::{Capability, DeviceError};
use crate::error::AppError;

/// A single inline field error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field errors collected by local validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for `field`, if it failed validation.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was pushed.
    pub fn into_result(self) -> Result<(), WorkflowError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Failures surfaced by workflow steps.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("You must be logged in to {action}")]
    IdentityUnresolved { action: &'static str },

    #[error("Failed to upload {item}: {source}")]
    Upload {
        item: String,
        #[source]
        source: AppError,
    },

    #[error("Failed to {action}: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: AppError,
    },

    #[error("{0} permission is required")]
    PermissionDenied(Capability),

    #[error("{0}")]
    Device(String),

    #[error("You can only add up to {limit} images")]
    PhotoLimit { limit: usize },

    #[error("Please add at least one image or audio recording")]
    NothingToSubmit,

    #[error("{0}")]
    Recording(&'static str),

    #[error("Cannot {action} while the report is at the {stage} step")]
    OutOfOrder {
        action: &'static str,
        stage: &'static str,
    },

    /// Some evidence was committed, the rest failed and stays pending.
    #[error("{committed} evidence item(s) saved, {} failed: {}", .failures.len(), describe(.failures))]
    PartialEvidence {
        committed: usize,
        failures: Vec<WorkflowError>,
    },
}

fn describe(failures: &[WorkflowError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<DeviceError> for WorkflowError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied(capability) => Self::PermissionDenied(capability),
            DeviceError::Unavailable(message) => Self::Device(message),
        }
    }
}

/// Blocking user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl WorkflowError {
    /// Render as the alert shown to the officer.
    pub fn alert(&self) -> Alert {
        match self {
            Self::Validation(errors) => Alert::new("Check the form", errors.to_string()),
            Self::IdentityUnresolved { .. } => Alert::new("Error", self.to_string()),
            Self::Upload { item, source } => {
                let title = if item.starts_with("audio") {
                    "Audio Upload Error"
                } else {
                    "Image Upload Error"
                };
                Alert::new(title, format!("Failed to upload {}: {}", item, source))
            }
            Self::Persistence { action, .. } => Alert::new(
                "Database Error",
                format!("Failed to {}. Please try again.", action),
            ),
            Self::PermissionDenied(capability) => Alert::new(
                "Permission Required",
                format!("{} permission is required.", capability),
            ),
            Self::Device(message) => Alert::new("Error", message.clone()),
            Self::PhotoLimit { limit } => Alert::new(
                "Limit Reached",
                format!("You can only add up to {} images.", limit),
            ),
            Self::NothingToSubmit => Alert::new(
                "Add Evidence",
                "Please add at least one image or audio recording.",
            ),
            Self::Recording(message) => Alert::new("Recording", *message),
            Self::OutOfOrder { .. } => Alert::new("Error", self.to_string()),
            Self::PartialEvidence { .. } => Alert::new("Submission Error", self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_in_order() {
        let mut errors = ValidationErrors::default();
        assert!(errors.clone().into_result().is_ok());

        errors.push("title", "Title is required");
        errors.push("description", "Description must be at least 10 characters");

        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("location"), None);
        assert_eq!(
            errors.to_string(),
            "Title is required; Description must be at least 10 characters"
        );
        assert!(matches!(
            errors.into_result(),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_identity_alert_mentions_login() {
        let alert = WorkflowError::IdentityUnresolved {
            action: "submit a report",
        }
        .alert();
        assert_eq!(alert.message, "You must be logged in to submit a report");
    }

    #[test]
    fn test_limit_alert() {
        let alert = WorkflowError::PhotoLimit { limit: 5 }.alert();
        assert_eq!(alert.title, "Limit Reached");
        assert_eq!(alert.message, "You can only add up to 5 images.");
    }

    #[test]
    fn test_upload_alert_names_media_kind() {
        let err = WorkflowError::Upload {
            item: "audio recording".to_string(),
            source: AppError::Storage("timeout".to_string()),
        };
        assert_eq!(err.alert().title, "Audio Upload Error");
    }

    #[test]
    fn test_device_errors_convert() {
        assert!(matches!(
            WorkflowError::from(DeviceError::PermissionDenied(Capability::Microphone)),
            WorkflowError::PermissionDenied(Capability::Microphone)
        ));
        assert!(matches!(
            WorkflowError::from(DeviceError::Unavailable("busy".to_string())),
            WorkflowError::Device(_)
        ));
    }
}
