//! Context handed from one workflow step to the next.

use std::sync::Arc;

use async_trait::async_trait;

use super::draft::DraftStore;
use super::error::WorkflowError;
use super::identity::IdentityResolver;
use super::media::{Coordinates, MediaFile};
use super::ports::{
    DataService, DeviceError, Geolocator, KeyValueStore, MediaPicker, Microphone, ObjectStore,
    PickSource,
};
use crate::models::{OfficerId, Session};

/// Device capabilities available to the run.
#[derive(Clone)]
pub struct Devices {
    pub picker: Arc<dyn MediaPicker>,
    pub microphone: Arc<dyn Microphone>,
    pub geolocator: Arc<dyn Geolocator>,
}

impl Devices {
    /// Devices for hosted runs, where the client captures media itself and
    /// uploads the files.
    pub fn unavailable() -> Self {
        let none = Arc::new(NoDevice);
        Self {
            picker: none.clone(),
            microphone: none.clone(),
            geolocator: none,
        }
    }
}

struct NoDevice;

const NO_DEVICE: &str = "This device capability is not available on the server";

#[async_trait]
impl MediaPicker for NoDevice {
    async fn pick_image(&self, _source: PickSource) -> Result<Option<MediaFile>, DeviceError> {
        Err(DeviceError::Unavailable(NO_DEVICE.to_string()))
    }
}

#[async_trait]
impl Microphone for NoDevice {
    async fn start(&self) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable(NO_DEVICE.to_string()))
    }

    async fn stop_and_unload(&self) -> Result<MediaFile, DeviceError> {
        Err(DeviceError::Unavailable(NO_DEVICE.to_string()))
    }
}

#[async_trait]
impl Geolocator for NoDevice {
    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        Err(DeviceError::Unavailable(NO_DEVICE.to_string()))
    }
}

/// Everything a workflow run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub data: Arc<dyn DataService>,
    pub objects: Arc<dyn ObjectStore>,
    pub kv: Arc<dyn KeyValueStore>,
    pub devices: Devices,
}

/// Owned state shared by every step of one run.
///
/// The officer id is resolved once when the context is built and cached;
/// a step that finds no cached id resolves again before failing closed.
#[derive(Clone)]
pub struct WorkflowContext {
    data: Arc<dyn DataService>,
    objects: Arc<dyn ObjectStore>,
    devices: Devices,
    drafts: DraftStore,
    identity: IdentityResolver,
    session: Option<Session>,
    officer_id: Option<OfficerId>,
}

impl WorkflowContext {
    pub async fn new(collaborators: Collaborators, session: Option<Session>) -> Self {
        let identity = IdentityResolver::new(collaborators.data.clone());
        let officer_id = identity.resolve_session(session.as_ref()).await;
        let drafts = DraftStore::new(
            collaborators.kv,
            session.as_ref().and_then(Session::authenticated_email),
        );

        Self {
            data: collaborators.data,
            objects: collaborators.objects,
            devices: collaborators.devices,
            drafts,
            identity,
            session,
            officer_id,
        }
    }

    pub fn data(&self) -> &dyn DataService {
        self.data.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cached_officer_id(&self) -> Option<&OfficerId> {
        self.officer_id.as_ref()
    }

    /// Replace the session after sign-in, sign-out or a token refresh.
    ///
    /// The draft store stays bound to the email the run started with.
    pub async fn set_session(&mut self, session: Option<Session>) {
        let same_email = self.session.as_ref().and_then(Session::authenticated_email)
            == session.as_ref().and_then(Session::authenticated_email);
        self.session = session;
        if !same_email || self.officer_id.is_none() {
            self.officer_id = self.identity.resolve_session(self.session.as_ref()).await;
        }
    }

    /// Officer id for a write, or `IdentityUnresolved` naming `action`.
    pub async fn officer_id(&mut self, action: &'static str) -> Result<OfficerId, WorkflowError> {
        if let Some(id) = &self.officer_id {
            return Ok(id.clone());
        }

        self.officer_id = self.identity.resolve_session(self.session.as_ref()).await;
        match &self.officer_id {
            Some(id) => Ok(id.clone()),
            None => {
                tracing::warn!(action, "Refusing write without a resolved officer");
                Err(WorkflowError::IdentityUnresolved { action })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestHarness, officer};

    #[tokio::test]
    async fn test_identity_resolved_at_construction() {
        let harness = TestHarness::new();
        let ctx = harness.context("jane@x.com").await;
        assert_eq!(ctx.cached_officer_id(), Some(&OfficerId::new("O1")));
        assert_eq!(ctx.drafts().key(), "report-draft:jane@x.com");
    }

    #[tokio::test]
    async fn test_officer_id_re_resolves_when_missing() {
        let harness = TestHarness::new();
        let mut ctx = harness.context("late@x.com").await;
        assert_eq!(ctx.cached_officer_id(), None);

        // Profile completed after the run started.
        harness.data.add_officer(officer("O2", "late@x.com"));
        assert_eq!(
            ctx.officer_id("submit a report").await.unwrap(),
            OfficerId::new("O2")
        );
    }

    #[tokio::test]
    async fn test_officer_id_fails_closed() {
        let harness = TestHarness::new();
        let mut ctx = harness.context("nobody@x.com").await;
        let err = ctx.officer_id("submit a report").await.unwrap_err();
        assert_eq!(err.to_string(), "You must be logged in to submit a report");
    }

    #[tokio::test]
    async fn test_sign_out_drops_cached_identity() {
        let harness = TestHarness::new();
        let mut ctx = harness.context("jane@x.com").await;
        ctx.set_session(None).await;
        assert_eq!(ctx.cached_officer_id(), None);
    }

    #[tokio::test]
    async fn test_hosted_devices_are_unavailable() {
        let devices = Devices::unavailable();
        assert!(matches!(
            devices.geolocator.current_position().await,
            Err(DeviceError::Unavailable(_))
        ));
    }
}
