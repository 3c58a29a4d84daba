//! Suspect domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::OfficerId;

/// Suspect gender as offered by the capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Self::Male, Self::Female, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suspect ethnicity as offered by the capture form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Ethnicity {
    Asian,
    Black,
    White,
    Hispanic,
    Other,
}

impl Ethnicity {
    pub const ALL: [Ethnicity; 5] = [
        Self::Asian,
        Self::Black,
        Self::White,
        Self::Hispanic,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asian => "Asian",
            Self::Black => "Black",
            Self::White => "White",
            Self::Hispanic => "Hispanic",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }
}

impl std::fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Person of interest attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Suspect {
    pub id: Uuid,
    pub report_id: Uuid,
    pub created_by: OfficerId,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Suspect row to insert.
#[derive(Debug, Clone)]
pub struct NewSuspect {
    pub report_id: Uuid,
    pub created_by: OfficerId,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub description: String,
}
