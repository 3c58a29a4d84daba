//! Step 2: suspect details and photo.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::context::WorkflowContext;
use super::error::{ValidationErrors, WorkflowError};
use super::evidence_step::EvidenceStep;
use super::media::{MediaFile, unique_object_name};
use super::ports::PickSource;
use crate::models::{Ethnicity, EvidenceType, Gender, NewEvidence, NewSuspect, Report, Suspect};

/// Object key prefix for suspect photos.
pub const SUSPECT_PHOTO_PREFIX: &str = "evidence-files/suspects";

/// Raw suspect fields as entered. Enumerations are parsed on validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SuspectInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub ethnicity: String,
    #[serde(default)]
    pub description: String,
}

/// Suspect fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSuspect {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub description: String,
}

impl SuspectInput {
    pub fn validate(&self) -> Result<ValidSuspect, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        }

        let age = match self.age.trim() {
            "" => {
                errors.push("age", "Age is required");
                None
            }
            raw => match raw.parse::<i32>() {
                Ok(age) if age >= 0 => Some(age),
                Ok(_) => {
                    errors.push("age", "Age cannot be negative");
                    None
                }
                Err(_) => {
                    errors.push("age", "Age must be a whole number");
                    None
                }
            },
        };

        let gender = match self.gender.trim() {
            "" => {
                errors.push("gender", "Gender is required");
                None
            }
            raw => {
                let parsed = Gender::parse(raw);
                if parsed.is_none() {
                    errors.push("gender", format!("Unknown gender: {}", raw));
                }
                parsed
            }
        };

        let ethnicity = match self.ethnicity.trim() {
            "" => {
                errors.push("ethnicity", "Ethnicity is required");
                None
            }
            raw => {
                let parsed = Ethnicity::parse(raw);
                if parsed.is_none() {
                    errors.push("ethnicity", format!("Unknown ethnicity: {}", raw));
                }
                parsed
            }
        };

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("description", "Description is required");
        }

        match (age, gender, ethnicity) {
            (Some(age), Some(gender), Some(ethnicity)) if errors.is_empty() => Ok(ValidSuspect {
                name: name.to_string(),
                age,
                gender,
                ethnicity,
                description: description.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Suspect capture step for one report.
///
/// Writes already committed by a failed attempt are remembered, so a
/// manual retry resumes after them instead of duplicating rows.
pub struct SuspectStep {
    ctx: WorkflowContext,
    report: Report,
    input: SuspectInput,
    photo: Option<MediaFile>,
    uploaded_photo_url: Option<String>,
    inserted: Option<Suspect>,
}

impl std::fmt::Debug for SuspectStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuspectStep")
            .field("report_id", &self.report.id)
            .field("input", &self.input)
            .field("has_photo", &self.photo.is_some())
            .field("uploaded_photo_url", &self.uploaded_photo_url)
            .field("inserted", &self.inserted.as_ref().map(|s| s.id))
            .finish_non_exhaustive()
    }
}

impl SuspectStep {
    pub fn new(ctx: WorkflowContext, report: Report) -> Self {
        Self {
            ctx,
            report,
            input: SuspectInput::default(),
            photo: None,
            uploaded_photo_url: None,
            inserted: None,
        }
    }

    pub fn report_id(&self) -> Uuid {
        self.report.id
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn input(&self) -> &SuspectInput {
        &self.input
    }

    pub fn photo(&self) -> Option<&MediaFile> {
        self.photo.as_ref()
    }

    pub fn inserted_suspect(&self) -> Option<&Suspect> {
        self.inserted.as_ref()
    }

    pub(crate) fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.ctx
    }

    pub fn set_input(&mut self, input: SuspectInput) {
        self.input = input;
    }

    /// Select the suspect photo, replacing any previous one.
    pub fn attach_photo(&mut self, photo: MediaFile) {
        self.photo = Some(photo);
        self.uploaded_photo_url = None;
    }

    /// Pick the photo from the camera or gallery. Cancelling keeps the
    /// current selection.
    pub async fn pick_photo(&mut self, source: PickSource) -> Result<bool, WorkflowError> {
        match self.ctx.devices().picker.pick_image(source).await? {
            Some(photo) => {
                self.attach_photo(photo);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Submission is unavailable until a photo is selected.
    pub fn can_submit(&self) -> bool {
        self.photo.is_some() || self.inserted.is_some()
    }

    /// Upload the photo, then insert the suspect and its image evidence.
    pub async fn submit(&mut self) -> Result<EvidenceStep, WorkflowError> {
        let valid = self.input.validate();
        let valid = match (valid, self.can_submit()) {
            (Ok(valid), true) => valid,
            (result, has_photo) => {
                let mut errors = result.err().unwrap_or_default();
                if !has_photo {
                    errors.push("photo", "No image selected");
                }
                return Err(WorkflowError::Validation(errors));
            }
        };

        let officer = self.ctx.officer_id("add a suspect").await?;

        let photo_url = match &self.uploaded_photo_url {
            Some(url) => url.clone(),
            None => {
                let photo = self.photo.as_ref().ok_or_else(|| {
                    let mut errors = ValidationErrors::default();
                    errors.push("photo", "No image selected");
                    WorkflowError::Validation(errors)
                })?;
                let key = format!(
                    "{}/{}",
                    SUSPECT_PHOTO_PREFIX,
                    unique_object_name("suspect", photo.extension())
                );
                let path = self
                    .ctx
                    .objects()
                    .upload(&key, photo.bytes.clone(), &photo.content_type)
                    .await
                    .map_err(|source| {
                        tracing::error!(key = %key, "Suspect photo upload failed: {}", source);
                        WorkflowError::Upload {
                            item: "suspect photo".to_string(),
                            source,
                        }
                    })?;
                let url = self.ctx.objects().public_url(&path);
                self.uploaded_photo_url = Some(url.clone());
                url
            }
        };

        let suspect = match &self.inserted {
            Some(suspect) => suspect.clone(),
            None => {
                let suspect = self
                    .ctx
                    .data()
                    .insert_suspect(NewSuspect {
                        report_id: self.report.id,
                        created_by: officer.clone(),
                        name: valid.name,
                        age: valid.age,
                        gender: valid.gender,
                        ethnicity: valid.ethnicity,
                        description: valid.description,
                    })
                    .await
                    .map_err(|source| {
                        tracing::error!(report_id = %self.report.id, "Failed to insert suspect: {}", source);
                        WorkflowError::Persistence {
                            action: "save the suspect",
                            source,
                        }
                    })?;
                self.inserted = Some(suspect.clone());
                suspect
            }
        };

        let evidence = self
            .ctx
            .data()
            .insert_evidence(vec![NewEvidence {
                suspect_id: suspect.id,
                case_id: self.report.id,
                added_by: officer,
                evidence_type: EvidenceType::Image,
                file_url: photo_url,
            }])
            .await
            .map_err(|source| {
                tracing::error!(suspect_id = %suspect.id, "Failed to record suspect photo: {}", source);
                WorkflowError::Persistence {
                    action: "save the suspect photo",
                    source,
                }
            })?;

        tracing::info!(
            report_id = %self.report.id,
            suspect_id = %suspect.id,
            "Suspect recorded"
        );

        Ok(EvidenceStep::new(self.ctx.clone(), suspect, evidence))
    }
}
