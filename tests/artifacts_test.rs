// Startup loading of model artifacts from disk

mod common;

use common::*;
use healnav::config::{EncoderSource, ModelConfig};
use healnav::ml::{EncodingPolicy, ModelArtifacts, ModelType};
use healnav::models::Priority;
use healnav::processing::TriageProcessor;
use healnav::state::TriageQueue;
use healnav::AppError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_shipped(dir: &Path) {
    fs::write(dir.join("priority_model.json"), MODEL_JSON).unwrap();
    fs::write(dir.join("feature_encoders.json"), ENCODERS_JSON).unwrap();
    fs::write(dir.join("target_encoder.json"), TARGET_JSON).unwrap();
}

/// The shipped coefficients, declared as trained on the manual tables
fn manual_model_json() -> String {
    MODEL_JSON.replace(r#""encoding": "label_encoder""#, r#""encoding": "manual""#)
}

fn config_for(dir: &Path) -> ModelConfig {
    ModelConfig {
        artifact_dir: dir.to_path_buf(),
        ..ModelConfig::default()
    }
}

#[tokio::test]
async fn test_load_from_directory() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());

    let artifacts = ModelArtifacts::load(&config_for(dir.path())).unwrap();

    assert_eq!(artifacts.classifier().model_type(), ModelType::LogisticRegression);
    assert_eq!(artifacts.feature_order().len(), 9);
    assert_eq!(artifacts.encoders().len(), 7);
}

#[tokio::test]
async fn test_missing_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());
    fs::remove_file(dir.path().join("target_encoder.json")).unwrap();

    let err = ModelArtifacts::load(&config_for(dir.path())).unwrap_err();

    assert!(matches!(err, AppError::Artifact(_)));
    assert!(err.to_string().contains("target_encoder.json"));
}

#[tokio::test]
async fn test_corrupt_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());
    fs::write(dir.path().join("priority_model.json"), "{ not json").unwrap();

    assert!(ModelArtifacts::load(&config_for(dir.path())).is_err());
}

#[tokio::test]
async fn test_target_outside_priorities_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());
    fs::write(
        dir.path().join("target_encoder.json"),
        r#"{"classes": ["High", "Low", "Critical"]}"#,
    )
    .unwrap();

    let err = ModelArtifacts::load(&config_for(dir.path())).unwrap_err();
    assert!(err.to_string().contains("Critical"));
}

#[tokio::test]
async fn test_duplicate_encoder_classes_are_fatal() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());
    fs::write(
        dir.path().join("feature_encoders.json"),
        r#"{"gender": {"kind": "label_encoder", "classes": ["Female", "Female"]}}"#,
    )
    .unwrap();

    assert!(ModelArtifacts::load(&config_for(dir.path())).is_err());
}

#[tokio::test]
async fn test_manual_tables_refuse_fitted_model() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());

    let config = ModelConfig {
        encoders: EncoderSource::Manual,
        ..config_for(dir.path())
    };
    let err = ModelArtifacts::load(&config).unwrap_err();

    assert!(matches!(err, AppError::Contract(_)));
    assert!(err.to_string().contains("label_encoder"));
}

#[tokio::test]
async fn test_fitted_encoders_refuse_manual_model() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());
    fs::write(dir.path().join("priority_model.json"), manual_model_json()).unwrap();

    let err = ModelArtifacts::load(&config_for(dir.path())).unwrap_err();
    assert!(matches!(err, AppError::Contract(_)));
}

#[tokio::test]
async fn test_manual_tables_with_manual_model() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("priority_model.json"), manual_model_json()).unwrap();
    fs::write(dir.path().join("target_encoder.json"), TARGET_JSON).unwrap();

    let config = ModelConfig {
        encoders: EncoderSource::Manual,
        ..config_for(dir.path())
    };
    let processor = TriageProcessor::new(
        Arc::new(ModelArtifacts::load(&config).unwrap()),
        EncodingPolicy::Strict,
        Arc::new(TriageQueue::new()),
    );

    let assessment = processor.assess(&chest_pain_record()).unwrap();
    assert_eq!(
        assessment.features.values(),
        &[45.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 2.0]
    );
    assert_eq!(assessment.priority, Priority::Medium);
}

#[tokio::test]
async fn test_fitted_codes_for_the_same_patient() {
    let dir = TempDir::new().unwrap();
    write_shipped(dir.path());

    let processor = TriageProcessor::new(
        Arc::new(ModelArtifacts::load(&config_for(dir.path())).unwrap()),
        EncodingPolicy::Strict,
        Arc::new(TriageQueue::new()),
    );

    let assessment = processor.assess(&chest_pain_record()).unwrap();
    assert_eq!(
        assessment.features.values(),
        &[45.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 1.0]
    );
    assert_eq!(assessment.priority, Priority::High);
}
