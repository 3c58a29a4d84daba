//! Draft store for step-1 fields.
//!
//! This is an advisory cache over [`KeyValueStore`]: every read or write
//! failure is logged and treated as a no-op. A broken store never blocks
//! the form.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ports::KeyValueStore;

const KEY_PREFIX: &str = "report-draft";

/// Unsubmitted step-1 fields. Absent fields were never entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<DateTime<Utc>>,
}

impl ReportDraft {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.incident_date.is_none()
    }

    /// Overlay the fields present in `partial`.
    pub fn merge(&mut self, partial: ReportDraft) {
        if partial.title.is_some() {
            self.title = partial.title;
        }
        if partial.description.is_some() {
            self.description = partial.description;
        }
        if partial.location.is_some() {
            self.location = partial.location;
        }
        if partial.incident_date.is_some() {
            self.incident_date = partial.incident_date;
        }
    }
}

/// Persists one officer's draft under `report-draft:<email>`.
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DraftStore {
    /// Draft store scoped to `email`, or the shared anonymous slot.
    pub fn new(store: Arc<dyn KeyValueStore>, email: Option<&str>) -> Self {
        let owner = email.unwrap_or("anonymous").to_lowercase();
        Self {
            store,
            key: format!("{}:{}", KEY_PREFIX, owner),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last saved draft, or `None` when absent or unreadable.
    pub async fn load(&self) -> Option<ReportDraft> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to load report draft: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ReportDraft>(&raw) {
            Ok(draft) if !draft.is_empty() => Some(draft),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = %self.key, "Discarding unreadable report draft: {}", e);
                None
            }
        }
    }

    /// Merge `partial` over the last saved draft and overwrite it.
    pub async fn save(&self, partial: ReportDraft) {
        let mut draft = self.load().await.unwrap_or_default();
        draft.merge(partial);

        let raw = match serde_json::to_string(&draft) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to encode report draft: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, raw).await {
            tracing::warn!(key = %self.key, "Failed to save report draft: {}", e);
        }
    }

    /// Remove the draft entirely.
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key).await {
            tracing::warn!(key = %self.key, "Failed to clear report draft: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryKvStore;
    use crate::test_support::FailingKvStore;

    fn draft_store() -> (Arc<MemoryKvStore>, DraftStore) {
        let kv = Arc::new(MemoryKvStore::default());
        let store = DraftStore::new(kv.clone(), Some("Jane@X.com"));
        (kv, store)
    }

    #[test]
    fn test_key_is_scoped_by_email() {
        let (_, store) = draft_store();
        assert_eq!(store.key(), "report-draft:jane@x.com");

        let anonymous = DraftStore::new(Arc::new(MemoryKvStore::default()), None);
        assert_eq!(anonymous.key(), "report-draft:anonymous");
    }

    #[tokio::test]
    async fn test_round_trip_across_mounts() {
        let (kv, store) = draft_store();
        store
            .save(ReportDraft {
                title: Some("T".to_string()),
                description: Some("D.........".to_string()),
                ..Default::default()
            })
            .await;

        // A fresh mount over the same storage sees the same fields.
        let remounted = DraftStore::new(kv, Some("jane@x.com"));
        let draft = remounted.load().await.unwrap();
        assert_eq!(draft.title.as_deref(), Some("T"));
        assert_eq!(draft.description.as_deref(), Some("D........."));
        assert_eq!(draft.location, None);
    }

    #[tokio::test]
    async fn test_save_merges_over_last_save() {
        let (_, store) = draft_store();
        store
            .save(ReportDraft {
                title: Some("Theft".to_string()),
                ..Default::default()
            })
            .await;
        store
            .save(ReportDraft {
                location: Some("Lat: 1, Lon: 2".to_string()),
                ..Default::default()
            })
            .await;

        let draft = store.load().await.unwrap();
        assert_eq!(draft.title.as_deref(), Some("Theft"));
        assert_eq!(draft.location.as_deref(), Some("Lat: 1, Lon: 2"));
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let (_, store) = draft_store();
        store
            .save(ReportDraft {
                title: Some("Theft".to_string()),
                ..Default::default()
            })
            .await;
        store.clear().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_unreadable_record_loads_as_absent() {
        let (kv, store) = draft_store();
        kv.set(store.key(), "{not json".to_string()).await.unwrap();
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let store = DraftStore::new(Arc::new(FailingKvStore), Some("jane@x.com"));
        store
            .save(ReportDraft {
                title: Some("Theft".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(store.load().await, None);
        store.clear().await;
    }
}
