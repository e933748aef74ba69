//! HealNav: patient priority triage.
//!
//! A submitted symptom record is normalized into the classifier's feature
//! layout, scored by a pre-trained model, decoded to a High/Medium/Low
//! priority and filed in an in-memory queue ordered by urgency.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod processing;
pub mod state;

pub use error::{AppError, Result};
