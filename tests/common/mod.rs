//! Shared fixtures for the integration tests

#![allow(dead_code)]

use healnav::api::{build_router, AppState};
use healnav::ml::{EncodingPolicy, ModelArtifacts};
use healnav::models::{
    ExistingDisease, Gender, PainLevel, PatientRecord, SeverityLevel, YesNo,
};
use healnav::processing::TriageProcessor;
use healnav::state::TriageQueue;
use std::sync::Arc;

pub const MODEL_JSON: &str = include_str!("../../artifacts/priority_model.json");
pub const ENCODERS_JSON: &str = include_str!("../../artifacts/feature_encoders.json");
pub const TARGET_JSON: &str = include_str!("../../artifacts/target_encoder.json");

/// Artifacts shipped with the repository
pub fn shipped_artifacts() -> Arc<ModelArtifacts> {
    Arc::new(ModelArtifacts::from_json(MODEL_JSON, ENCODERS_JSON, TARGET_JSON).unwrap())
}

pub fn processor(policy: EncodingPolicy) -> Arc<TriageProcessor> {
    Arc::new(TriageProcessor::new(
        shipped_artifacts(),
        policy,
        Arc::new(TriageQueue::new()),
    ))
}

pub fn router(processor: Arc<TriageProcessor>) -> axum::Router {
    build_router(AppState::new(processor))
}

/// 45-year-old with chest pain and fever, severe pain, high severity
pub fn chest_pain_record() -> PatientRecord {
    PatientRecord {
        age: 45,
        gender: Gender::Male,
        chest_pain: YesNo::Yes,
        breathlessness: YesNo::No,
        fever: YesNo::Yes,
        pain_level: PainLevel::Severe,
        symptom_duration_days: 3,
        existing_disease: ExistingDisease::None,
        severity_level: SeverityLevel::High,
    }
}

/// Breathless and feverish, moderate pain
pub fn moderate_record() -> PatientRecord {
    PatientRecord {
        age: 50,
        gender: Gender::Male,
        chest_pain: YesNo::No,
        breathlessness: YesNo::Yes,
        fever: YesNo::Yes,
        pain_level: PainLevel::Moderate,
        symptom_duration_days: 5,
        existing_disease: ExistingDisease::None,
        severity_level: SeverityLevel::Medium,
    }
}

/// The intake form's untouched defaults
pub fn mild_record() -> PatientRecord {
    PatientRecord::default()
}
