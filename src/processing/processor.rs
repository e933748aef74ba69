use crate::error::{AppError, Result};
use crate::metrics::{INFERENCE_DURATION_SECONDS, PREDICTIONS_TOTAL};
use crate::ml::{EncodingPolicy, FeatureNormalizer, FeatureVector, ModelArtifacts};
use crate::models::{PatientCase, PatientRecord, Priority, Substitution};
use crate::processing::messages::{message_for, PriorityMessage};
use crate::state::TriageQueue;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of running one record through the model
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub priority: Priority,
    pub message: PriorityMessage,
    pub features: FeatureVector,
    pub substitutions: Vec<Substitution>,
}

/// Runs submissions through normalizer, classifier and decoder, and files
/// them in the queue
pub struct TriageProcessor {
    artifacts: Arc<ModelArtifacts>,
    normalizer: FeatureNormalizer,
    queue: Arc<TriageQueue>,
}

impl TriageProcessor {
    pub fn new(
        artifacts: Arc<ModelArtifacts>,
        policy: EncodingPolicy,
        queue: Arc<TriageQueue>,
    ) -> Self {
        let normalizer = FeatureNormalizer::new(
            artifacts.encoders(),
            artifacts.feature_order(),
            policy,
        );

        Self {
            artifacts,
            normalizer,
            queue,
        }
    }

    /// Get a reference to the triage queue
    pub fn queue(&self) -> &Arc<TriageQueue> {
        &self.queue
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.normalizer.policy()
    }

    /// Predict a priority without filing the case
    pub fn assess(&self, record: &PatientRecord) -> Result<Assessment> {
        let timer = INFERENCE_DURATION_SECONDS.start_timer();

        let normalized = self.normalizer.normalize_record(record)?;
        debug!(features = ?normalized.features.values(), "Record normalized");

        let row = normalized.features.to_row()?;
        let raw = self.artifacts.classifier().predict(&row)?;
        let priority = match raw.first() {
            Some(&label) => self.artifacts.target().decode(label)?,
            None => {
                return Err(AppError::Contract(
                    "classifier returned no prediction".to_string(),
                ))
            }
        };

        timer.observe_duration();
        PREDICTIONS_TOTAL
            .with_label_values(&[priority.to_string().as_str()])
            .inc();

        Ok(Assessment {
            priority,
            message: message_for(priority),
            features: normalized.features,
            substitutions: normalized.substitutions,
        })
    }

    /// Predict, then append the case to the queue
    pub fn submit(&self, record: PatientRecord) -> Result<(Assessment, PatientCase)> {
        let assessment = self.assess(&record)?;
        let case = PatientCase::new(record, assessment.priority, assessment.substitutions.clone());

        info!(
            case_id = %case.id,
            priority = %case.priority,
            age = case.record.age,
            severity = %case.record.severity_level,
            substitutions = case.substitutions.len(),
            "Patient case triaged"
        );

        self.queue.enqueue(case.clone());
        Ok((assessment, case))
    }
}
