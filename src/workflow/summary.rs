//! Step 4: read-only summary of the submitted report.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::context::WorkflowContext;
use super::error::Alert;
use crate::models::{Evidence, EvidenceType, Suspect};

/// How one piece of evidence is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceView {
    InlineImage { id: Uuid, url: String },
    AudioPlayback { id: Uuid, url: String },
}

impl From<&Evidence> for EvidenceView {
    fn from(evidence: &Evidence) -> Self {
        match evidence.evidence_type {
            EvidenceType::Image => Self::InlineImage {
                id: evidence.id,
                url: evidence.file_url.clone(),
            },
            EvidenceType::Audio => Self::AudioPlayback {
                id: evidence.id,
                url: evidence.file_url.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Summary {
    pub report_id: Uuid,
    pub report_title: String,
    pub report_description: String,
    pub suspect_name: String,
    pub evidence: Vec<EvidenceView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SummaryState {
    Loading,
    Ready(Summary),
    Failed(Alert),
}

/// Summary step. Loading is manual; a failed load stays failed until
/// [`SummaryStep::load`] is called again.
pub struct SummaryStep {
    ctx: WorkflowContext,
    suspect: Suspect,
    evidence: Vec<Evidence>,
    state: SummaryState,
}

impl std::fmt::Debug for SummaryStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryStep")
            .field("suspect_id", &self.suspect.id)
            .field("evidence", &self.evidence.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SummaryStep {
    pub fn new(ctx: WorkflowContext, suspect: Suspect, evidence: Vec<Evidence>) -> Self {
        Self {
            ctx,
            suspect,
            evidence,
            state: SummaryState::Loading,
        }
    }

    pub fn suspect(&self) -> &Suspect {
        &self.suspect
    }

    /// Evidence handed forward from the earlier steps, in submission order.
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn state(&self) -> &SummaryState {
        &self.state
    }

    pub(crate) fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.ctx
    }

    /// Fetch the parent report and render the summary.
    pub async fn load(&mut self) -> &SummaryState {
        let report_id = self.suspect.report_id;
        self.state = match self.ctx.data().get_report(report_id).await {
            Ok(Some(report)) => SummaryState::Ready(Summary {
                report_id: report.id,
                report_title: report.title,
                report_description: report.description,
                suspect_name: self.suspect.name.clone(),
                evidence: self.evidence.iter().map(EvidenceView::from).collect(),
            }),
            Ok(None) => {
                tracing::warn!(report_id = %report_id, "Report for summary not found");
                SummaryState::Failed(Alert::new("Error", "Report not found"))
            }
            Err(e) => {
                tracing::error!(report_id = %report_id, "Failed to load report summary: {}", e);
                SummaryState::Failed(Alert::new("Error", "Unable to load the report."))
            }
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestHarness;

    #[tokio::test]
    async fn test_ready_summary_dispatches_by_type() {
        let harness = TestHarness::new();
        let (suspect, photo) = harness.seed_suspect("O1");
        let audio = harness.seed_evidence(&suspect, EvidenceType::Audio);
        let mut step = SummaryStep::new(
            harness.context("jane@x.com").await,
            suspect.clone(),
            vec![photo.clone(), audio.clone()],
        );
        assert_eq!(step.state(), &SummaryState::Loading);

        match step.load().await {
            SummaryState::Ready(summary) => {
                assert_eq!(summary.suspect_name, suspect.name);
                assert_eq!(summary.report_id, suspect.report_id);
                assert_eq!(
                    summary.evidence,
                    vec![
                        EvidenceView::InlineImage {
                            id: photo.id,
                            url: photo.file_url.clone()
                        },
                        EvidenceView::AudioPlayback {
                            id: audio.id,
                            url: audio.file_url.clone()
                        },
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_distinct_state_and_reloadable() {
        let harness = TestHarness::new();
        let (suspect, photo) = harness.seed_suspect("O1");
        let mut step = SummaryStep::new(harness.context("jane@x.com").await, suspect, vec![photo]);
        harness.data.fail_next("get_report");

        assert!(matches!(step.load().await, SummaryState::Failed(_)));
        // No automatic retry: the state stays failed until reloaded.
        assert!(matches!(step.state(), SummaryState::Failed(_)));

        assert!(matches!(step.load().await, SummaryState::Ready(_)));
    }
}
