use crate::models::PatientRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Urgency assigned by the classifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Queue rank (lower is seen first)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// A categorical value the encoder did not know and replaced with its
/// fallback before prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub feature: String,
    pub submitted: String,
    pub substituted: String,
}

/// A triaged submission as it sits in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCase {
    /// Unique identifier
    pub id: Uuid,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,

    /// Submitted fields
    #[serde(flatten)]
    pub record: PatientRecord,

    /// Priority predicted for this case
    pub priority: Priority,

    /// Fallback substitutions made while encoding
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl PatientCase {
    /// Create a new case stamped with the current time
    pub fn new(record: PatientRecord, priority: Priority, substitutions: Vec<Substitution>) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            record,
            priority,
            substitutions,
        }
    }

    /// True when any field was replaced by an encoder fallback
    pub fn has_substitutions(&self) -> bool {
        !self.substitutions.is_empty()
    }
}
