//! Step 1: incident details.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::context::WorkflowContext;
use super::draft::ReportDraft;
use super::error::{ValidationErrors, WorkflowError};
use super::suspect_step::SuspectStep;
use crate::models::NewReport;

/// Minimum length of the incident description, in characters.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Current step-1 form values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IncidentForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub incident_date: DateTime<Utc>,
}

impl Default for IncidentForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            incident_date: Utc::now(),
        }
    }
}

impl IncidentForm {
    fn from_draft(draft: ReportDraft) -> Self {
        let mut form = Self::default();
        form.apply(draft);
        form
    }

    fn apply(&mut self, edit: ReportDraft) {
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(location) = edit.location {
            self.location = location;
        }
        if let Some(incident_date) = edit.incident_date {
            self.incident_date = incident_date;
        }
    }

    /// Local validation; no network call is made for an invalid form.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut errors = ValidationErrors::default();

        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("description", "Incident description is required");
        } else if description.chars().count() < MIN_DESCRIPTION_LEN {
            errors.push(
                "description",
                format!(
                    "Description must be at least {} characters",
                    MIN_DESCRIPTION_LEN
                ),
            );
        }

        errors.into_result()
    }
}

/// Incident details step. Every edit writes through to the draft store.
pub struct IncidentStep {
    ctx: WorkflowContext,
    form: IncidentForm,
}

impl std::fmt::Debug for IncidentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentStep")
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

impl IncidentStep {
    /// Mount the step, pre-populating the form from a saved draft.
    pub async fn mount(ctx: WorkflowContext) -> Self {
        let form = match ctx.drafts().load().await {
            Some(draft) => {
                tracing::debug!(key = %ctx.drafts().key(), "Restored report draft");
                IncidentForm::from_draft(draft)
            }
            None => IncidentForm::default(),
        };
        Self { ctx, form }
    }

    pub fn form(&self) -> &IncidentForm {
        &self.form
    }

    pub(crate) fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.ctx
    }

    /// Apply the fields present in `edit` and save them to the draft.
    pub async fn edit(&mut self, edit: ReportDraft) {
        self.form.apply(edit.clone());
        self.ctx.drafts().save(edit).await;
    }

    pub async fn set_title(&mut self, title: impl Into<String>) {
        self.edit(ReportDraft {
            title: Some(title.into()),
            ..Default::default()
        })
        .await;
    }

    pub async fn set_description(&mut self, description: impl Into<String>) {
        self.edit(ReportDraft {
            description: Some(description.into()),
            ..Default::default()
        })
        .await;
    }

    pub async fn set_incident_date(&mut self, incident_date: DateTime<Utc>) {
        self.edit(ReportDraft {
            incident_date: Some(incident_date),
            ..Default::default()
        })
        .await;
    }

    /// Tag the report with the device's current position.
    ///
    /// On failure the location is left unchanged.
    pub async fn tag_location(&mut self) -> Result<&str, WorkflowError> {
        let coords = self.ctx.devices().geolocator.current_position().await?;
        self.edit(ReportDraft {
            location: Some(coords.to_location()),
            ..Default::default()
        })
        .await;
        Ok(&self.form.location)
    }

    /// Validate, resolve the officer and create the report in `pending`.
    ///
    /// The draft is cleared only after the insert succeeds. On any failure
    /// the form is kept as it was.
    pub async fn submit(&mut self) -> Result<SuspectStep, WorkflowError> {
        self.form.validate()?;

        let created_by = self.ctx.officer_id("submit a report").await?;
        let new_report = NewReport {
            title: self.form.title.trim().to_string(),
            description: self.form.description.trim().to_string(),
            created_by,
            location: self.form.location.clone(),
            incident_date: self.form.incident_date,
        };

        let report = self
            .ctx
            .data()
            .insert_report(new_report)
            .await
            .map_err(|source| {
                tracing::error!("Failed to insert report: {}", source);
                WorkflowError::Persistence {
                    action: "submit the report",
                    source,
                }
            })?;

        self.ctx.drafts().clear().await;
        tracing::info!(report_id = %report.id, created_by = %report.created_by, "Report created");

        Ok(SuspectStep::new(self.ctx.clone(), report))
    }
}
