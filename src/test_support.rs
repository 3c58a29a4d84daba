//! In-memory adapters, fake devices and fixtures for tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration tests under `tests/`.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use crate::auth::SessionVerifier;
use crate::config::SessionSettings;
use crate::error::{AppError, AppResult};
use crate::models::{
    Ethnicity, Evidence, EvidenceType, Gender, MonthlyCount, NewEvidence, NewOfficer, NewReport,
    NewSuspect, Officer, OfficerId, Report, ReportActivity, ReportStatus, Session, Suspect,
};
use crate::services::MemoryKvStore;
use crate::workflow::{
    Capability, Collaborators, Coordinates, DataService, DeviceError, Devices, Geolocator,
    KeyValueStore, MediaFile, MediaPicker, Microphone, ObjectStore, PickSource, WorkflowContext,
};

/// Secret the test verifier signs and checks tokens with.
pub const TEST_SESSION_SECRET: &str = "test-session-secret";
/// Audience the test verifier expects.
pub const TEST_SESSION_AUDIENCE: &str = "authenticated";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Officer fixture with a fixed badge, rank and contact.
pub fn officer(id: &str, email: &str) -> Officer {
    Officer {
        id: OfficerId::new(id),
        name: format!("Officer {}", id),
        badge_number: 4411,
        rank: "Sergeant".to_string(),
        email: email.to_string(),
        contact: "0123456789".to_string(),
        profile_picture: None,
    }
}

/// JPEG picked from `uri`.
pub fn jpeg(uri: &str) -> MediaFile {
    MediaFile::new(uri, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

/// MP3 clip recorded at `uri`.
pub fn mp3(uri: &str) -> MediaFile {
    MediaFile::new(uri, "audio/mpeg", vec![0x49, 0x44, 0x33])
}

/// Session verifier using [`TEST_SESSION_SECRET`].
pub fn session_verifier() -> SessionVerifier {
    SessionVerifier::new(&SessionSettings {
        secret: SecretString::from(TEST_SESSION_SECRET.to_string()),
        audience: TEST_SESSION_AUDIENCE.to_string(),
    })
}

/// `Authorization` header value for a signed-in user.
pub fn bearer(user_id: &str, email: &str) -> String {
    let token = session_verifier()
        .issue(user_id, Some(email), 3600)
        .unwrap_or_default();
    format!("Bearer {}", token)
}

// ============================================================================
// Data service
// ============================================================================

#[derive(Default)]
struct Tables {
    officers: Vec<Officer>,
    reports: Vec<Report>,
    suspects: Vec<Suspect>,
    evidence: Vec<Evidence>,
}

/// [`DataService`] over in-memory tables.
///
/// Every call is recorded by method name. [`fail_next`](Self::fail_next)
/// makes the next call of one method fail before it touches any table.
#[derive(Default)]
pub struct InMemoryDataService {
    tables: Mutex<Tables>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashSet<&'static str>>,
}

impl InMemoryDataService {
    pub fn add_officer(&self, officer: Officer) {
        lock(&self.tables).officers.push(officer);
    }

    /// Fail the next call of `method`.
    pub fn fail_next(&self, method: &'static str) {
        lock(&self.failures).insert(method);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn reports(&self) -> Vec<Report> {
        lock(&self.tables).reports.clone()
    }

    pub fn suspects(&self) -> Vec<Suspect> {
        lock(&self.tables).suspects.clone()
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        lock(&self.tables).evidence.clone()
    }

    fn record(&self, method: &'static str) -> AppResult<()> {
        lock(&self.calls).push(method);
        if lock(&self.failures).remove(method) {
            return Err(AppError::Database(format!("injected failure in {}", method)));
        }
        Ok(())
    }

    fn store_report(&self, new: NewReport) -> Report {
        let report = Report {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            created_by: new.created_by,
            status: ReportStatus::Pending,
            location: new.location,
            incident_date: new.incident_date,
            created_at: Utc::now(),
        };
        lock(&self.tables).reports.push(report.clone());
        report
    }

    fn store_suspect(&self, new: NewSuspect) -> Suspect {
        let suspect = Suspect {
            id: Uuid::new_v4(),
            report_id: new.report_id,
            created_by: new.created_by,
            name: new.name,
            age: new.age,
            gender: new.gender,
            ethnicity: new.ethnicity,
            description: new.description,
            created_at: Utc::now(),
        };
        lock(&self.tables).suspects.push(suspect.clone());
        suspect
    }

    fn store_evidence(&self, entries: Vec<NewEvidence>) -> Vec<Evidence> {
        let rows: Vec<Evidence> = entries
            .into_iter()
            .map(|new| Evidence {
                id: Uuid::new_v4(),
                suspect_id: new.suspect_id,
                case_id: new.case_id,
                added_by: new.added_by,
                evidence_type: new.evidence_type,
                file_url: new.file_url,
                created_at: Utc::now(),
            })
            .collect();
        lock(&self.tables).evidence.extend(rows.iter().cloned());
        rows
    }

    fn update_officer(
        &self,
        id: &OfficerId,
        apply: impl FnOnce(&mut Officer),
    ) -> AppResult<Officer> {
        let mut tables = lock(&self.tables);
        let officer = tables
            .officers
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Officer {}", id)))?;
        apply(officer);
        Ok(officer.clone())
    }
}

fn monthly_counts<'a>(dates: impl Iterator<Item = &'a DateTime<Utc>>) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for date in dates {
        *counts.entry(date.format("%Y-%m").to_string()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn ping(&self) -> AppResult<()> {
        self.record("ping")
    }

    async fn find_officer_id_by_email(&self, email: &str) -> AppResult<Option<OfficerId>> {
        self.record("find_officer_id_by_email")?;
        Ok(lock(&self.tables)
            .officers
            .iter()
            .find(|o| o.email == email)
            .map(|o| o.id.clone()))
    }

    async fn get_officer(&self, id: &OfficerId) -> AppResult<Option<Officer>> {
        self.record("get_officer")?;
        Ok(lock(&self.tables)
            .officers
            .iter()
            .find(|o| &o.id == id)
            .cloned())
    }

    async fn insert_officer(&self, new: NewOfficer) -> AppResult<Officer> {
        self.record("insert_officer")?;
        let mut tables = lock(&self.tables);
        if tables
            .officers
            .iter()
            .any(|o| o.id == new.id || o.badge_number == new.badge_number)
        {
            return Err(AppError::Database(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }
        let officer = Officer {
            id: new.id,
            name: new.name,
            badge_number: new.badge_number,
            rank: new.rank,
            email: new.email,
            contact: new.contact,
            profile_picture: new.profile_picture,
        };
        tables.officers.push(officer.clone());
        Ok(officer)
    }

    async fn update_officer_contact(&self, id: &OfficerId, contact: &str) -> AppResult<Officer> {
        self.record("update_officer_contact")?;
        self.update_officer(id, |o| o.contact = contact.to_string())
    }

    async fn update_officer_picture(&self, id: &OfficerId, url: &str) -> AppResult<Officer> {
        self.record("update_officer_picture")?;
        self.update_officer(id, |o| o.profile_picture = Some(url.to_string()))
    }

    async fn insert_report(&self, report: NewReport) -> AppResult<Report> {
        self.record("insert_report")?;
        Ok(self.store_report(report))
    }

    async fn get_report(&self, id: Uuid) -> AppResult<Option<Report>> {
        self.record("get_report")?;
        Ok(lock(&self.tables)
            .reports
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_reports(
        &self,
        officer: &OfficerId,
        status: ReportStatus,
    ) -> AppResult<Vec<Report>> {
        self.record("list_reports")?;
        let mut reports: Vec<Report> = lock(&self.tables)
            .reports
            .iter()
            .rev()
            .filter(|r| &r.created_by == officer && r.status == status)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<Report> {
        self.record("update_report_status")?;
        let mut tables = lock(&self.tables);
        let report = tables
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;
        report.status = status;
        Ok(report.clone())
    }

    async fn insert_suspect(&self, suspect: NewSuspect) -> AppResult<Suspect> {
        self.record("insert_suspect")?;
        Ok(self.store_suspect(suspect))
    }

    async fn list_suspects(&self, report_id: Uuid) -> AppResult<Vec<Suspect>> {
        self.record("list_suspects")?;
        Ok(lock(&self.tables)
            .suspects
            .iter()
            .filter(|s| s.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn insert_evidence(&self, entries: Vec<NewEvidence>) -> AppResult<Vec<Evidence>> {
        self.record("insert_evidence")?;
        Ok(self.store_evidence(entries))
    }

    async fn list_evidence(&self, case_id: Uuid) -> AppResult<Vec<Evidence>> {
        self.record("list_evidence")?;
        Ok(lock(&self.tables)
            .evidence
            .iter()
            .filter(|e| e.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn report_activity(&self, officer: &OfficerId) -> AppResult<ReportActivity> {
        self.record("report_activity")?;
        let tables = lock(&self.tables);
        let own: Vec<&Report> = tables
            .reports
            .iter()
            .filter(|r| &r.created_by == officer)
            .collect();

        Ok(ReportActivity {
            completed_by_incident_month: monthly_counts(
                own.iter()
                    .filter(|r| r.status == ReportStatus::Completed)
                    .map(|r| &r.incident_date),
            ),
            reported_by_month: monthly_counts(own.iter().map(|r| &r.created_at)),
        })
    }
}

// ============================================================================
// Object store
// ============================================================================

/// [`ObjectStore`] that keeps uploaded keys in order.
#[derive(Default)]
pub struct InMemoryObjectStore {
    keys: Mutex<Vec<String>>,
    fail_next: AtomicBool,
    fail_patterns: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    /// Keys of successful uploads, in upload order.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.keys).clone()
    }

    /// Fail the next upload.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Fail every upload whose key contains `pattern`.
    pub fn fail_key_containing(&self, pattern: &str) {
        lock(&self.fail_patterns).push(pattern.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_next.store(false, Ordering::SeqCst);
        lock(&self.fail_patterns).clear();
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> AppResult<String> {
        let matches_pattern = lock(&self.fail_patterns)
            .iter()
            .any(|pattern| key.contains(pattern.as_str()));
        if self.fail_next.swap(false, Ordering::SeqCst) || matches_pattern {
            return Err(AppError::Storage(format!("injected failure for {}", key)));
        }
        lock(&self.keys).push(key.to_string());
        Ok(key.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/{}", path)
    }
}

// ============================================================================
// Key-value store
// ============================================================================

/// [`KeyValueStore`] whose every operation fails.
pub struct FailingKvStore;

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Err(AppError::Storage(format!("cannot read {}", key)))
    }

    async fn set(&self, key: &str, _value: String) -> AppResult<()> {
        Err(AppError::Storage(format!("cannot write {}", key)))
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        Err(AppError::Storage(format!("cannot remove {}", key)))
    }
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Default)]
struct DeviceState {
    images: Mutex<VecDeque<MediaFile>>,
    microphone_denied: AtomicBool,
    location_denied: AtomicBool,
    unloads: AtomicUsize,
}

/// Scriptable camera/gallery picker, microphone and geolocator.
///
/// Clones share state, so a test can flip a permission after handing the
/// devices to a step.
#[derive(Clone, Default)]
pub struct FakeDevices {
    state: Arc<DeviceState>,
}

impl FakeDevices {
    pub fn devices(&self) -> Devices {
        Devices {
            picker: Arc::new(self.clone()),
            microphone: self.microphone(),
            geolocator: Arc::new(self.clone()),
        }
    }

    pub fn microphone(&self) -> Arc<dyn Microphone> {
        Arc::new(self.clone())
    }

    /// Image returned by the next pick. An empty queue means "cancelled".
    pub fn queue_image(&self, image: MediaFile) {
        lock(&self.state.images).push_back(image);
    }

    pub fn queued_images(&self) -> usize {
        lock(&self.state.images).len()
    }

    pub fn deny_microphone(&self) {
        self.state.microphone_denied.store(true, Ordering::SeqCst);
    }

    pub fn deny_location(&self) {
        self.state.location_denied.store(true, Ordering::SeqCst);
    }

    /// How often a recording was stopped and the device released.
    pub fn microphone_unloads(&self) -> usize {
        self.state.unloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaPicker for FakeDevices {
    async fn pick_image(&self, _source: PickSource) -> Result<Option<MediaFile>, DeviceError> {
        Ok(lock(&self.state.images).pop_front())
    }
}

#[async_trait]
impl Microphone for FakeDevices {
    async fn start(&self) -> Result<(), DeviceError> {
        if self.state.microphone_denied.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied(Capability::Microphone));
        }
        Ok(())
    }

    async fn stop_and_unload(&self) -> Result<MediaFile, DeviceError> {
        let n = self.state.unloads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MediaFile::new(
            format!("recording-{}.m4a", n),
            "audio/mp4",
            vec![0x00, 0x00, 0x00, 0x20],
        ))
    }
}

#[async_trait]
impl Geolocator for FakeDevices {
    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        if self.state.location_denied.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied(Capability::Location));
        }
        Ok(Coordinates {
            latitude: 51.5,
            longitude: -0.12,
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Collaborators for one test, with officer `O1` (`jane@x.com`) registered.
pub struct TestHarness {
    pub data: Arc<InMemoryDataService>,
    pub objects: Arc<InMemoryObjectStore>,
    pub devices: FakeDevices,
    kv: Arc<dyn KeyValueStore>,
    memory_kv: Arc<MemoryKvStore>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        let memory_kv = Arc::new(MemoryKvStore::default());
        Self::build(memory_kv.clone(), memory_kv)
    }

    /// Harness whose key-value store fails every operation.
    pub fn with_failing_kv() -> Self {
        Self::build(Arc::new(FailingKvStore), Arc::new(MemoryKvStore::default()))
    }

    fn build(kv: Arc<dyn KeyValueStore>, memory_kv: Arc<MemoryKvStore>) -> Self {
        let data = Arc::new(InMemoryDataService::default());
        data.add_officer(officer("O1", "jane@x.com"));
        Self {
            data,
            objects: Arc::new(InMemoryObjectStore::default()),
            devices: FakeDevices::default(),
            kv,
            memory_kv,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            data: self.data.clone(),
            objects: self.objects.clone(),
            kv: self.kv.clone(),
            devices: self.devices.devices(),
        }
    }

    /// Context for a session signed in as `email`.
    pub async fn context(&self, email: &str) -> WorkflowContext {
        let session = Session::new("u1", Some(email.to_string()));
        WorkflowContext::new(self.collaborators(), Some(session)).await
    }

    /// Whether no drafts are stored.
    pub async fn kv_is_empty(&self) -> bool {
        self.memory_kv.is_empty()
    }

    /// Pending report created by `officer_id`, written straight to the tables.
    pub fn seed_report(&self, officer_id: &str, title: &str) -> Report {
        self.data.store_report(NewReport {
            title: title.to_string(),
            description: "Wallet stolen from car".to_string(),
            created_by: OfficerId::new(officer_id),
            location: String::new(),
            incident_date: Utc::now(),
        })
    }

    /// A report with one suspect and the suspect's photo evidence row.
    pub fn seed_suspect(&self, officer_id: &str) -> (Suspect, Evidence) {
        let report = self.seed_report(officer_id, "Theft");
        let suspect = self.data.store_suspect(NewSuspect {
            report_id: report.id,
            created_by: OfficerId::new(officer_id),
            name: "Suspect A".to_string(),
            age: 30,
            gender: Gender::Male,
            ethnicity: Ethnicity::White,
            description: "Tall, dark jacket".to_string(),
        });
        let photo = self.seed_evidence(&suspect, EvidenceType::Image);
        (suspect, photo)
    }

    pub fn seed_evidence(&self, suspect: &Suspect, evidence_type: EvidenceType) -> Evidence {
        let file_url = format!(
            "https://storage.test/seed/{}.{}",
            Uuid::new_v4(),
            if evidence_type == EvidenceType::Audio { "mp3" } else { "jpg" }
        );
        let mut rows = self.data.store_evidence(vec![NewEvidence {
            suspect_id: suspect.id,
            case_id: suspect.report_id,
            added_by: suspect.created_by.clone(),
            evidence_type,
            file_url,
        }]);
        rows.remove(0)
    }
}
