//! Maps an authenticated session to the acting officer.

use std::sync::Arc;

use super::ports::DataService;
use crate::models::{OfficerId, Session};

/// Resolves the officer id used for `created_by` / `added_by`.
#[derive(Clone)]
pub struct IdentityResolver {
    data: Arc<dyn DataService>,
}

impl IdentityResolver {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }

    /// Officer id for `email`.
    ///
    /// Returns `None` when there is no email, no matching officer, or the
    /// lookup fails. Callers must treat `None` as "cannot proceed".
    pub async fn resolve(&self, email: Option<&str>) -> Option<OfficerId> {
        let email = email.map(str::trim).filter(|e| !e.is_empty())?;

        match self.data.find_officer_id_by_email(email).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                tracing::warn!(email = %email, "No officer registered for session email");
                None
            }
            Err(e) => {
                tracing::error!(email = %email, "Officer lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn resolve_session(&self, session: Option<&Session>) -> Option<OfficerId> {
        self.resolve(session.and_then(Session::authenticated_email))
            .await
    }
}
