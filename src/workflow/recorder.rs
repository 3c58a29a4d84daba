//! Audio recorder state machine and the navigation-away guard.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::error::{Alert, WorkflowError};
use super::media::MediaFile;
use super::ports::Microphone;

/// Recorder state. Playback only exists while a clip is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped { clip: MediaFile, playing: bool },
}

/// Serializable view of [`RecorderState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    Idle,
    Recording,
    Stopped,
    Playing,
}

/// Outcome of asking to leave a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveDecision {
    Leave,
    /// A recording is running; leaving needs explicit confirmation.
    ConfirmRequired(Alert),
}

/// At most one clip per run.
pub struct AudioRecorder {
    microphone: Arc<dyn Microphone>,
    state: RecorderState,
}

impl AudioRecorder {
    pub fn new(microphone: Arc<dyn Microphone>) -> Self {
        Self {
            microphone,
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn status(&self) -> RecorderStatus {
        match &self.state {
            RecorderState::Idle => RecorderStatus::Idle,
            RecorderState::Recording => RecorderStatus::Recording,
            RecorderState::Stopped { playing: false, .. } => RecorderStatus::Stopped,
            RecorderState::Stopped { playing: true, .. } => RecorderStatus::Playing,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording)
    }

    pub fn clip(&self) -> Option<&MediaFile> {
        match &self.state {
            RecorderState::Stopped { clip, .. } => Some(clip),
            _ => None,
        }
    }

    /// `Idle -> Recording`. Starting while a clip exists is rejected.
    pub async fn start(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            RecorderState::Idle => {}
            RecorderState::Recording => {
                return Err(WorkflowError::Recording("A recording is already running"));
            }
            RecorderState::Stopped { .. } => {
                return Err(WorkflowError::Recording(
                    "Discard the current recording before starting a new one",
                ));
            }
        }

        self.microphone.start().await?;
        self.state = RecorderState::Recording;
        tracing::debug!("Recording started");
        Ok(())
    }

    /// `Recording -> Stopped(clip)`.
    pub async fn stop(&mut self) -> Result<(), WorkflowError> {
        if !self.is_recording() {
            return Err(WorkflowError::Recording("No recording is running"));
        }

        let clip = self.microphone.stop_and_unload().await?;
        tracing::debug!(bytes = clip.bytes.len(), "Recording saved");
        self.state = RecorderState::Stopped {
            clip,
            playing: false,
        };
        Ok(())
    }

    /// `Idle -> Stopped(clip)` with a clip recorded elsewhere.
    pub fn attach(&mut self, clip: MediaFile) -> Result<(), WorkflowError> {
        match self.state {
            RecorderState::Idle => {
                self.state = RecorderState::Stopped {
                    clip,
                    playing: false,
                };
                Ok(())
            }
            RecorderState::Recording => Err(WorkflowError::Recording(
                "Stop the running recording before attaching another",
            )),
            RecorderState::Stopped { .. } => Err(WorkflowError::Recording(
                "Discard the current recording before attaching another",
            )),
        }
    }

    /// Toggle playback of the held clip. Returns whether it is now playing.
    pub fn toggle_playback(&mut self) -> Result<bool, WorkflowError> {
        match &mut self.state {
            RecorderState::Stopped { playing, .. } => {
                *playing = !*playing;
                Ok(*playing)
            }
            _ => Err(WorkflowError::Recording("There is no recording to play")),
        }
    }

    /// `Stopped -> Idle`, dropping the clip.
    pub fn discard(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            RecorderState::Recording => Err(WorkflowError::Recording(
                "Stop the recording before discarding it",
            )),
            _ => {
                self.state = RecorderState::Idle;
                Ok(())
            }
        }
    }

    /// Hand over the held clip, returning to `Idle`. A running recording is
    /// left alone.
    pub fn take_clip(&mut self) -> Option<MediaFile> {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Stopped { clip, .. } => Some(clip),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Stop and unload a running recording, discarding its output.
    pub async fn release(&mut self) {
        if self.is_recording() {
            if let Err(e) = self.microphone.stop_and_unload().await {
                tracing::error!("Error stopping recording on exit: {}", e);
            }
            self.state = RecorderState::Idle;
        }
    }

    /// Navigation guard: leaving while recording needs confirmation, and a
    /// confirmed leave stops and unloads the recording first.
    pub async fn leave(&mut self, confirmed: bool) -> LeaveDecision {
        if !self.is_recording() {
            return LeaveDecision::Leave;
        }
        if !confirmed {
            return LeaveDecision::ConfirmRequired(Alert::new(
                "Exit Warning",
                "You are recording audio. Stop the recording first before exiting.",
            ));
        }
        self.release().await;
        LeaveDecision::Leave
    }
}
