//! Officer domain models and DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque officer identity (equal to the auth provider's user id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OfficerId(String);

impl OfficerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OfficerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Officer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Officer {
    pub id: OfficerId,
    pub name: String,
    pub badge_number: i32,
    pub rank: String,
    pub email: String,
    pub contact: String,
    /// Public URL of the profile picture, if one was uploaded.
    pub profile_picture: Option<String>,
}

/// Officer row to insert at profile completion.
#[derive(Debug, Clone)]
pub struct NewOfficer {
    pub id: OfficerId,
    pub name: String,
    pub badge_number: i32,
    pub rank: String,
    pub email: String,
    pub contact: String,
    pub profile_picture: Option<String>,
}

/// Profile completion request (signup follow-up).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompleteProfileRequest {
    pub name: String,
    pub badge_number: i32,
    pub rank: String,
    /// Exactly 10 digits.
    pub contact: String,
}

impl CompleteProfileRequest {
    /// Validate the request, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if self.rank.trim().is_empty() {
            return Err("Rank is required".to_string());
        }
        if self.badge_number <= 0 {
            return Err("Badge number must be a positive number".to_string());
        }
        validate_contact(&self.contact)
    }
}

/// Contact number update request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    pub contact: String,
}

/// A contact number must be exactly 10 ASCII digits.
pub fn validate_contact(contact: &str) -> Result<(), String> {
    if contact.len() != 10 || !contact.bytes().all(|b| b.is_ascii_digit()) {
        return Err("Contact must be exactly 10 digits".to_string());
    }
    Ok(())
}
