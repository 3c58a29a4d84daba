//! Step 3: evidence photos and audio.
//!
//! Photos and the audio clip are independent units. Each photo uploads on
//! its own, the uploaded photos are registered as one batch, then the clip
//! is uploaded and registered. Nothing is rolled back across units; items
//! that failed stay pending and a resubmission only retries those.

use super::context::WorkflowContext;
use super::error::WorkflowError;
use super::media::{MediaFile, unique_object_name};
use super::ports::PickSource;
use super::recorder::{AudioRecorder, LeaveDecision};
use super::summary::SummaryStep;
use crate::models::{Evidence, EvidenceType, NewEvidence, OfficerId, Suspect};

/// Maximum number of evidence photos per run.
pub const MAX_PHOTOS: usize = 5;

pub const IMAGE_PREFIX: &str = "evidence-files/images";
pub const AUDIO_PREFIX: &str = "evidence-files/audio";

pub struct EvidenceStep {
    ctx: WorkflowContext,
    suspect: Suspect,
    /// Evidence recorded by the suspect step.
    carried: Vec<Evidence>,
    photos: Vec<MediaFile>,
    recorder: AudioRecorder,
    /// Rows committed by earlier, partially failed submissions.
    committed: Vec<Evidence>,
}

impl std::fmt::Debug for EvidenceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceStep")
            .field("suspect_id", &self.suspect.id)
            .field("pending_photos", &self.photos.len())
            .field("recorder", &self.recorder.status())
            .field("carried", &self.carried.len())
            .field("committed", &self.committed.len())
            .finish_non_exhaustive()
    }
}

impl EvidenceStep {
    pub fn new(ctx: WorkflowContext, suspect: Suspect, carried: Vec<Evidence>) -> Self {
        let recorder = AudioRecorder::new(ctx.devices().microphone.clone());
        Self {
            ctx,
            suspect,
            carried,
            photos: Vec::new(),
            recorder,
            committed: Vec::new(),
        }
    }

    pub fn suspect(&self) -> &Suspect {
        &self.suspect
    }

    pub fn carried_evidence(&self) -> &[Evidence] {
        &self.carried
    }

    pub fn committed_evidence(&self) -> &[Evidence] {
        &self.committed
    }

    pub fn photos(&self) -> &[MediaFile] {
        &self.photos
    }

    pub fn recorder(&self) -> &AudioRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut AudioRecorder {
        &mut self.recorder
    }

    pub(crate) fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.ctx
    }

    /// Photos already committed by this step plus pending ones.
    fn photo_count(&self) -> usize {
        let committed = self
            .committed
            .iter()
            .filter(|e| e.evidence_type == EvidenceType::Image)
            .count();
        committed + self.photos.len()
    }

    /// Append a photo. A photo past the limit is rejected and the list is
    /// left unchanged.
    pub fn add_photo(&mut self, photo: MediaFile) -> Result<usize, WorkflowError> {
        if self.photo_count() >= MAX_PHOTOS {
            return Err(WorkflowError::PhotoLimit { limit: MAX_PHOTOS });
        }
        self.photos.push(photo);
        Ok(self.photos.len())
    }

    /// Pick a photo from the camera or gallery.
    pub async fn pick_photo(&mut self, source: PickSource) -> Result<Option<usize>, WorkflowError> {
        if self.photo_count() >= MAX_PHOTOS {
            return Err(WorkflowError::PhotoLimit { limit: MAX_PHOTOS });
        }
        match self.ctx.devices().picker.pick_image(source).await? {
            Some(photo) => self.add_photo(photo).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<MediaFile> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub async fn leave(&mut self, confirmed: bool) -> LeaveDecision {
        self.recorder.leave(confirmed).await
    }

    /// Upload and register all pending evidence.
    ///
    /// On full success the step hands the suspect and the concatenated
    /// evidence list to the summary.
    pub async fn submit(&mut self) -> Result<SummaryStep, WorkflowError> {
        if self.recorder.is_recording() {
            return Err(WorkflowError::Recording(
                "Stop the recording before submitting evidence",
            ));
        }
        if self.photos.is_empty() && self.recorder.clip().is_none() && self.committed.is_empty() {
            return Err(WorkflowError::NothingToSubmit);
        }

        let added_by = self.ctx.officer_id("submit evidence").await?;
        let before = self.committed.len();
        let mut failures = Vec::new();

        self.submit_photos(&added_by, &mut failures).await;
        self.submit_audio(&added_by, &mut failures).await;

        if failures.is_empty() {
            tracing::info!(
                suspect_id = %self.suspect.id,
                evidence = self.committed.len(),
                "Evidence submitted"
            );
            let mut evidence = self.carried.clone();
            evidence.append(&mut self.committed);
            return Ok(SummaryStep::new(
                self.ctx.clone(),
                self.suspect.clone(),
                evidence,
            ));
        }

        let committed = self.committed.len() - before;
        if committed == 0 && failures.len() == 1 {
            if let Some(failure) = failures.pop() {
                return Err(failure);
            }
        }
        tracing::warn!(
            suspect_id = %self.suspect.id,
            committed,
            failed = failures.len(),
            "Evidence partially submitted"
        );
        Err(WorkflowError::PartialEvidence {
            committed,
            failures,
        })
    }

    async fn submit_photos(&mut self, added_by: &OfficerId, failures: &mut Vec<WorkflowError>) {
        if self.photos.is_empty() {
            return;
        }

        let mut uploaded = Vec::new();
        let mut pending = Vec::new();
        for (index, photo) in std::mem::take(&mut self.photos).into_iter().enumerate() {
            let key = format!(
                "{}/{}",
                IMAGE_PREFIX,
                unique_object_name("evidence", photo.extension())
            );
            match self
                .ctx
                .objects()
                .upload(&key, photo.bytes.clone(), &photo.content_type)
                .await
            {
                Ok(path) => {
                    let url = self.ctx.objects().public_url(&path);
                    uploaded.push((index, photo, url));
                }
                Err(source) => {
                    tracing::error!(key = %key, "Evidence photo upload failed: {}", source);
                    failures.push(WorkflowError::Upload {
                        item: format!("photo {}", index + 1),
                        source,
                    });
                    pending.push((index, photo));
                }
            }
        }

        if !uploaded.is_empty() {
            let rows = uploaded
                .iter()
                .map(|(_, _, url)| self.new_evidence(added_by, EvidenceType::Image, url))
                .collect();
            match self.ctx.data().insert_evidence(rows).await {
                Ok(rows) => self.committed.extend(rows),
                Err(source) => {
                    tracing::error!(suspect_id = %self.suspect.id, "Failed to record evidence photos: {}", source);
                    failures.push(WorkflowError::Persistence {
                        action: "save image evidence",
                        source,
                    });
                    pending.extend(uploaded.into_iter().map(|(index, photo, _)| (index, photo)));
                }
            }
        }

        pending.sort_by_key(|(index, _)| *index);
        self.photos = pending.into_iter().map(|(_, photo)| photo).collect();
    }

    async fn submit_audio(&mut self, added_by: &OfficerId, failures: &mut Vec<WorkflowError>) {
        let Some(clip) = self.recorder.clip() else {
            return;
        };

        let key = format!(
            "{}/{}",
            AUDIO_PREFIX,
            unique_object_name("evidence_audio", clip.extension())
        );
        let path = match self
            .ctx
            .objects()
            .upload(&key, clip.bytes.clone(), &clip.content_type)
            .await
        {
            Ok(path) => path,
            Err(source) => {
                tracing::error!(key = %key, "Audio upload failed: {}", source);
                failures.push(WorkflowError::Upload {
                    item: "audio recording".to_string(),
                    source,
                });
                return;
            }
        };

        let url = self.ctx.objects().public_url(&path);
        let row = self.new_evidence(added_by, EvidenceType::Audio, &url);
        match self.ctx.data().insert_evidence(vec![row]).await {
            Ok(rows) => {
                self.committed.extend(rows);
                // Registered clips are not resent on retry.
                self.recorder.take_clip();
            }
            Err(source) => {
                tracing::error!(suspect_id = %self.suspect.id, "Failed to record audio evidence: {}", source);
                failures.push(WorkflowError::Persistence {
                    action: "save audio evidence",
                    source,
                });
            }
        }
    }

    fn new_evidence(&self, added_by: &OfficerId, kind: EvidenceType, url: &str) -> NewEvidence {
        NewEvidence {
            suspect_id: self.suspect.id,
            case_id: self.suspect.report_id,
            added_by: added_by.clone(),
            evidence_type: kind,
            file_url: url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestHarness, jpeg, mp3};

    async fn step(harness: &TestHarness) -> EvidenceStep {
        let (suspect, photo) = harness.seed_suspect("O1");
        EvidenceStep::new(harness.context("jane@x.com").await, suspect, vec![photo])
    }

    #[tokio::test]
    async fn test_sixth_photo_is_rejected() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        for i in 0..MAX_PHOTOS {
            step.add_photo(jpeg(&format!("P{i}"))).unwrap();
        }

        let err = step.add_photo(jpeg("P6")).unwrap_err();
        assert!(matches!(err, WorkflowError::PhotoLimit { limit: 5 }));
        assert_eq!(step.photos().len(), 5);
    }

    #[tokio::test]
    async fn test_remove_photo_by_index() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        step.add_photo(jpeg("P2")).unwrap();
        step.add_photo(jpeg("P3")).unwrap();

        assert_eq!(step.remove_photo(1).map(|p| p.uri), Some("P2".to_string()));
        assert!(step.remove_photo(7).is_none());
        let uris: Vec<&str> = step.photos().iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, vec!["P1", "P3"]);
    }

    #[tokio::test]
    async fn test_nothing_to_submit_makes_no_calls() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        let calls_before = harness.data.calls().len();

        let err = step.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::NothingToSubmit));
        assert_eq!(harness.data.calls().len(), calls_before);
        assert!(harness.objects.keys().is_empty());
    }

    #[tokio::test]
    async fn test_five_photos_and_clip_make_six_rows() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        let suspect_id = step.suspect().id;
        for i in 0..5 {
            step.add_photo(jpeg(&format!("P{i}"))).unwrap();
        }
        step.recorder_mut().attach(mp3("A1")).unwrap();
        let rows_before = harness.data.evidence().len();

        let summary = step.submit().await.unwrap();

        let new_rows: Vec<Evidence> = harness
            .data
            .evidence()
            .into_iter()
            .skip(rows_before)
            .collect();
        assert_eq!(new_rows.len(), 6);
        assert_eq!(
            new_rows
                .iter()
                .filter(|e| e.evidence_type == EvidenceType::Image)
                .count(),
            5
        );
        assert_eq!(new_rows[5].evidence_type, EvidenceType::Audio);
        assert!(new_rows.iter().all(|e| e.suspect_id == suspect_id));

        let keys = harness.objects.keys();
        assert!(keys[..5].iter().all(|k| k.starts_with("evidence-files/images/evidence_")));
        assert!(keys[5].starts_with("evidence-files/audio/evidence_audio_"));
        assert!(keys[5].ends_with(".mp3"));

        // Summary list: suspect photo row first, then the six new rows.
        assert_eq!(summary.evidence().len(), 7);
    }

    #[tokio::test]
    async fn test_submit_while_recording_is_rejected() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        step.recorder_mut().start().await.unwrap();

        let err = step.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Recording(_)));
        assert!(harness.objects.keys().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_committed_and_retries_only_failures() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        step.add_photo(jpeg("P2")).unwrap();
        step.recorder_mut().attach(mp3("A1")).unwrap();
        harness.objects.fail_key_containing("audio");

        let err = step.submit().await.unwrap_err();
        match &err {
            WorkflowError::PartialEvidence {
                committed,
                failures,
            } => {
                assert_eq!(*committed, 2);
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(step.photos().is_empty());
        assert_eq!(step.committed_evidence().len(), 2);
        assert!(step.recorder().clip().is_some());

        harness.objects.clear_failures();
        let summary = step.submit().await.unwrap();
        assert_eq!(summary.evidence().len(), 4);
        // Committed photos are not uploaded again.
        let image_uploads = harness
            .objects
            .keys()
            .iter()
            .filter(|k| k.starts_with(IMAGE_PREFIX))
            .count();
        assert_eq!(image_uploads, 2);
    }

    #[tokio::test]
    async fn test_committed_clip_is_not_resent_on_retry() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        step.recorder_mut().attach(mp3("A1")).unwrap();
        harness.objects.fail_key_containing("images");

        step.submit().await.unwrap_err();
        assert_eq!(step.committed_evidence().len(), 1);
        assert!(step.recorder().clip().is_none());

        harness.objects.clear_failures();
        let summary = step.submit().await.unwrap();
        assert_eq!(summary.evidence().len(), 3);
        let audio_uploads = harness
            .objects
            .keys()
            .iter()
            .filter(|k| k.starts_with(AUDIO_PREFIX))
            .count();
        assert_eq!(audio_uploads, 1);
    }

    #[tokio::test]
    async fn test_single_upload_failure_is_reported_directly() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        harness.objects.fail_next();

        let err = step.submit().await.unwrap_err();
        assert_eq!(err.alert().title, "Image Upload Error");
        assert_eq!(step.photos().len(), 1);
        assert!(step.committed_evidence().is_empty());
    }

    #[tokio::test]
    async fn test_batch_insert_failure_keeps_photos_pending() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        step.add_photo(jpeg("P1")).unwrap();
        step.add_photo(jpeg("P2")).unwrap();
        harness.data.fail_next("insert_evidence");

        let err = step.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Persistence { .. }));
        let uris: Vec<&str> = step.photos().iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn test_committed_photos_count_toward_limit() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        for i in 0..5 {
            step.add_photo(jpeg(&format!("P{i}"))).unwrap();
        }
        step.recorder_mut().attach(mp3("A1")).unwrap();
        harness.objects.fail_key_containing("audio");
        assert!(step.submit().await.is_err());

        assert!(matches!(
            step.add_photo(jpeg("P6")),
            Err(WorkflowError::PhotoLimit { .. })
        ));
    }

    #[tokio::test]
    async fn test_unresolved_identity_uploads_nothing() {
        let harness = TestHarness::new();
        let (suspect, photo) = harness.seed_suspect("O1");
        let mut step =
            EvidenceStep::new(harness.context("nobody@x.com").await, suspect, vec![photo]);
        step.add_photo(jpeg("P1")).unwrap();

        let err = step.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::IdentityUnresolved { .. }));
        assert!(harness.objects.keys().is_empty());
    }

    #[tokio::test]
    async fn test_pick_photo_checks_limit_before_picking() {
        let harness = TestHarness::new();
        let mut step = step(&harness).await;
        for i in 0..5 {
            step.add_photo(jpeg(&format!("P{i}"))).unwrap();
        }
        harness.devices.queue_image(jpeg("P6"));

        assert!(step.pick_photo(PickSource::Camera).await.is_err());
        assert_eq!(harness.devices.queued_images(), 1);
    }
}
