//! Guided multi-step report workflow.
//!
//! A run moves through four stages: incident details, suspect, evidence and
//! summary. Each stage is a value produced only by the previous stage's
//! successful submission, and the run owns exactly one of them at a time.

pub mod context;
pub mod draft;
pub mod error;
pub mod evidence_step;
pub mod identity;
pub mod media;
pub mod ports;
pub mod recorder;
pub mod report_step;
pub mod summary;
pub mod suspect_step;

use serde::Serialize;
use tokio::sync::watch;
use utoipa::ToSchema;
use uuid::Uuid;

pub use context::{Collaborators, Devices, WorkflowContext};
pub use draft::{DraftStore, ReportDraft};
pub use error::{Alert, FieldError, ValidationErrors, WorkflowError};
pub use evidence_step::{EvidenceStep, MAX_PHOTOS};
pub use identity::IdentityResolver;
pub use media::{Coordinates, MediaFile};
pub use ports::{
    Capability, DataService, DeviceError, Geolocator, KeyValueStore, MediaPicker, Microphone,
    ObjectStore, PickSource, SessionProvider,
};
pub use recorder::{AudioRecorder, LeaveDecision, RecorderState, RecorderStatus};
pub use report_step::{IncidentForm, IncidentStep};
pub use summary::{EvidenceView, Summary, SummaryState, SummaryStep};
pub use suspect_step::{SuspectInput, SuspectStep};

use crate::models::{Evidence, Report, Session, Suspect};

/// The step a run is currently on.
pub enum Stage {
    Incident(IncidentStep),
    Suspect(SuspectStep),
    Evidence(EvidenceStep),
    Summary(SummaryStep),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Incident(_) => "incident",
            Self::Suspect(_) => "suspect",
            Self::Evidence(_) => "evidence",
            Self::Summary(_) => "summary",
        }
    }

    fn context_mut(&mut self) -> &mut WorkflowContext {
        match self {
            Self::Incident(step) => step.context_mut(),
            Self::Suspect(step) => step.context_mut(),
            Self::Evidence(step) => step.context_mut(),
            Self::Summary(step) => step.context_mut(),
        }
    }
}

fn out_of_order(action: &'static str, stage: &Stage) -> WorkflowError {
    WorkflowError::OutOfOrder {
        action,
        stage: stage.name(),
    }
}

/// One run of the report workflow.
pub struct ReportWorkflow {
    stage: Stage,
    sessions: watch::Receiver<Option<Session>>,
}

impl ReportWorkflow {
    /// Start a run for the provider's current session, restoring any draft.
    pub async fn start(collaborators: Collaborators, sessions: &dyn SessionProvider) -> Self {
        let mut receiver = sessions.subscribe();
        let session = receiver.borrow_and_update().clone();
        let ctx = WorkflowContext::new(collaborators, session).await;

        Self {
            stage: Stage::Incident(IncidentStep::mount(ctx).await),
            sessions: receiver,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Pick up session changes published since the last operation.
    async fn sync_session(&mut self) {
        if self.sessions.has_changed().unwrap_or(false) {
            let session = self.sessions.borrow_and_update().clone();
            tracing::debug!(stage = self.stage.name(), "Session changed during workflow");
            self.stage.context_mut().set_session(session).await;
        }
    }

    fn out_of_order(&self, action: &'static str) -> WorkflowError {
        out_of_order(action, &self.stage)
    }

    pub fn incident_mut(&mut self) -> Result<&mut IncidentStep, WorkflowError> {
        let err = out_of_order("edit incident details", &self.stage);
        match &mut self.stage {
            Stage::Incident(step) => Ok(step),
            _ => Err(err),
        }
    }

    pub fn suspect_mut(&mut self) -> Result<&mut SuspectStep, WorkflowError> {
        let err = out_of_order("edit the suspect", &self.stage);
        match &mut self.stage {
            Stage::Suspect(step) => Ok(step),
            _ => Err(err),
        }
    }

    pub fn evidence_mut(&mut self) -> Result<&mut EvidenceStep, WorkflowError> {
        let err = out_of_order("edit evidence", &self.stage);
        match &mut self.stage {
            Stage::Evidence(step) => Ok(step),
            _ => Err(err),
        }
    }

    pub fn summary_mut(&mut self) -> Result<&mut SummaryStep, WorkflowError> {
        let err = out_of_order("view the summary", &self.stage);
        match &mut self.stage {
            Stage::Summary(step) => Ok(step),
            _ => Err(err),
        }
    }

    /// Step 1. Returns the created report.
    pub async fn submit_incident(&mut self) -> Result<&Report, WorkflowError> {
        self.sync_session().await;
        let next = self.incident_mut()?.submit().await?;
        self.stage = Stage::Suspect(next);
        match &self.stage {
            Stage::Suspect(step) => Ok(step.report()),
            _ => Err(self.out_of_order("submit the report")),
        }
    }

    /// Step 2. Returns the inserted suspect.
    pub async fn submit_suspect(&mut self) -> Result<&Suspect, WorkflowError> {
        self.sync_session().await;
        let next = self.suspect_mut()?.submit().await?;
        self.stage = Stage::Evidence(next);
        match &self.stage {
            Stage::Evidence(step) => Ok(step.suspect()),
            _ => Err(self.out_of_order("add a suspect")),
        }
    }

    /// Step 3. Returns the full evidence list handed to the summary.
    pub async fn submit_evidence(&mut self) -> Result<&[Evidence], WorkflowError> {
        self.sync_session().await;
        let next = self.evidence_mut()?.submit().await?;
        self.stage = Stage::Summary(next);
        match &self.stage {
            Stage::Summary(step) => Ok(step.evidence()),
            _ => Err(self.out_of_order("submit evidence")),
        }
    }

    /// Step 4. Loads the summary if it was never loaded, or reloads it.
    pub async fn load_summary(&mut self) -> Result<&SummaryState, WorkflowError> {
        let step = self.summary_mut()?;
        Ok(step.load().await)
    }

    /// Navigation guard for the whole run.
    pub async fn leave(&mut self, confirmed: bool) -> LeaveDecision {
        match &mut self.stage {
            Stage::Evidence(step) => step.leave(confirmed).await,
            _ => LeaveDecision::Leave,
        }
    }

    /// Serializable view of the run.
    pub fn snapshot(&self, id: Uuid) -> WorkflowSnapshot {
        let mut snapshot = WorkflowSnapshot {
            id,
            stage: self.stage.name(),
            incident: None,
            report: None,
            suspect_input: None,
            suspect_photo: None,
            suspect: None,
            pending_photos: Vec::new(),
            recorder: None,
            evidence: Vec::new(),
            summary: None,
        };

        match &self.stage {
            Stage::Incident(step) => snapshot.incident = Some(step.form().clone()),
            Stage::Suspect(step) => {
                snapshot.report = Some(step.report().clone());
                snapshot.suspect_input = Some(step.input().clone());
                snapshot.suspect_photo = step.photo().map(|p| p.uri.clone());
                snapshot.suspect = step.inserted_suspect().cloned();
            }
            Stage::Evidence(step) => {
                snapshot.suspect = Some(step.suspect().clone());
                snapshot.pending_photos = step.photos().iter().map(|p| p.uri.clone()).collect();
                snapshot.recorder = Some(step.recorder().status());
                snapshot.evidence = step
                    .carried_evidence()
                    .iter()
                    .chain(step.committed_evidence())
                    .cloned()
                    .collect();
            }
            Stage::Summary(step) => {
                snapshot.suspect = Some(step.suspect().clone());
                snapshot.evidence = step.evidence().to_vec();
                snapshot.summary = Some(step.state().clone());
            }
        }

        snapshot
    }
}

/// Client view of a run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkflowSnapshot {
    pub id: Uuid,
    pub stage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<IncidentForm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspect_input: Option<SuspectInput>,
    /// Client reference of the selected suspect photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspect_photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspect: Option<Suspect>,
    /// Client references of photos not yet submitted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<RecorderStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryState>,
}
