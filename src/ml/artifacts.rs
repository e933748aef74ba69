use crate::config::{EncoderSource, ModelConfig};
use crate::error::{AppError, Result};
use crate::metrics::CONTRACT_VIOLATIONS_TOTAL;
use crate::ml::classifier::{Classifier, ModelArtifact};
use crate::ml::encoders::{EncoderTable, FeatureEncoding};
use crate::models::{Priority, FEATURE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Maps the classifier's raw class index back to a priority label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDecoder {
    classes: Vec<String>,
}

impl TargetDecoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a decoder from its JSON artifact form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Artifact(format!("invalid target encoder: {}", e)))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Raw class index -> label text
    pub fn inverse_transform(&self, raw: usize) -> Result<&str> {
        self.classes.get(raw).map(String::as_str).ok_or_else(|| {
            CONTRACT_VIOLATIONS_TOTAL
                .with_label_values(&["label_index"])
                .inc();
            AppError::Contract(format!(
                "classifier returned class {} but the target encoder knows {} classes",
                raw,
                self.classes.len()
            ))
        })
    }

    /// Raw class index -> priority. Labels outside Low/Medium/High are a
    /// contract violation, never a default.
    pub fn decode(&self, raw: usize) -> Result<Priority> {
        let label = self.inverse_transform(raw)?;
        label.parse::<Priority>().map_err(|_| {
            CONTRACT_VIOLATIONS_TOTAL
                .with_label_values(&["priority_label"])
                .inc();
            AppError::Contract(format!(
                "classifier label '{}' is not one of Low, Medium, High",
                label
            ))
        })
    }

    /// Priority -> raw class index
    pub fn transform(&self, priority: Priority) -> Result<usize> {
        let label = priority.to_string();
        self.classes
            .iter()
            .position(|class| *class == label)
            .ok_or_else(|| {
                AppError::Contract(format!("target encoder has no class '{}'", label))
            })
    }

    /// Every class must decode to a priority, each at most once
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(AppError::Artifact("target encoder has no classes".to_string()));
        }

        let mut seen = HashSet::new();
        for class in &self.classes {
            let priority = class.parse::<Priority>().map_err(|_| {
                AppError::Artifact(format!(
                    "target class '{}' is not one of Low, Medium, High",
                    class
                ))
            })?;
            if !seen.insert(priority) {
                return Err(AppError::Artifact(format!(
                    "target class '{}' appears twice",
                    class
                )));
            }
        }
        Ok(())
    }
}

/// Everything loaded from disk at startup: classifier, feature encoders and
/// target decoder
pub struct ModelArtifacts {
    classifier: Box<dyn Classifier>,
    encoders: Arc<EncoderTable>,
    target: TargetDecoder,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("model_type", &self.classifier.model_type())
            .field("feature_names", &self.classifier.feature_names())
            .field("encoders", &self.encoders.len())
            .field("target", &self.target.classes())
            .finish()
    }
}

impl ModelArtifacts {
    /// Check the three parts agree with each other and with the form fields.
    /// `encoding` is the categorical coding the classifier was trained on.
    pub fn from_parts(
        classifier: Box<dyn Classifier>,
        encoding: FeatureEncoding,
        encoders: EncoderTable,
        target: TargetDecoder,
    ) -> Result<Self> {
        target.validate()?;
        encoders.validate()?;

        if classifier.n_classes() != target.classes().len() {
            return Err(AppError::Artifact(format!(
                "classifier has {} classes but the target encoder has {}",
                classifier.n_classes(),
                target.classes().len()
            )));
        }

        let declared: HashSet<&str> = classifier.feature_names().iter().map(String::as_str).collect();
        let expected: HashSet<&str> = FEATURE_COLUMNS.iter().copied().collect();
        if declared != expected || classifier.feature_names().len() != FEATURE_COLUMNS.len() {
            return Err(AppError::Artifact(format!(
                "classifier features {:?} do not match the intake fields {:?}",
                classifier.feature_names(),
                FEATURE_COLUMNS
            )));
        }

        if let Some(unknown) = encoders.features().find(|f| !declared.contains(f)) {
            return Err(AppError::Artifact(format!(
                "encoder for '{}' has no matching classifier feature",
                unknown
            )));
        }

        match encoders.encoding() {
            Some(loaded) if loaded == encoding => {}
            loaded => {
                CONTRACT_VIOLATIONS_TOTAL
                    .with_label_values(&["encoding_mismatch"])
                    .inc();
                return Err(AppError::Contract(format!(
                    "classifier was trained on {} encodings but the loaded encoders are {}",
                    encoding,
                    loaded.map_or_else(|| "empty or mixed".to_string(), |e| e.to_string())
                )));
            }
        }

        Ok(Self {
            classifier,
            encoders: Arc::new(encoders),
            target,
        })
    }

    /// Build from the three JSON documents
    pub fn from_json(model: &str, encoders: &str, target: &str) -> Result<Self> {
        Self::from_artifact(
            ModelArtifact::from_json(model)?,
            EncoderTable::from_json(encoders)?,
            TargetDecoder::from_json(target)?,
        )
    }

    fn from_artifact(
        artifact: ModelArtifact,
        encoders: EncoderTable,
        target: TargetDecoder,
    ) -> Result<Self> {
        let encoding = artifact.encoding;
        Self::from_parts(artifact.into_classifier()?, encoding, encoders, target)
    }

    /// Load the artifacts named in the configuration. Any failure is fatal
    /// to startup.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let dir = config.artifact_dir.as_path();
        let model = ModelArtifact::from_json(&read_artifact(dir, &config.model_file)?)?;
        let target = TargetDecoder::from_json(&read_artifact(dir, &config.target_file)?)?;

        let encoders = match &config.encoders {
            EncoderSource::Manual => {
                info!("Using manual encoding tables");
                EncoderTable::manual()
            }
            EncoderSource::File(file) => EncoderTable::from_json(&read_artifact(dir, file)?)?,
        };

        let artifacts = Self::from_artifact(model, encoders, target)?;

        info!(
            model_type = %artifacts.classifier.model_type(),
            n_features = artifacts.classifier.feature_names().len(),
            encoders = artifacts.encoders.len(),
            classes = ?artifacts.target.classes(),
            "Model artifacts loaded from {}",
            dir.display()
        );

        Ok(artifacts)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Shared, read-only encoder table
    pub fn encoders(&self) -> Arc<EncoderTable> {
        self.encoders.clone()
    }

    pub fn target(&self) -> &TargetDecoder {
        &self.target
    }

    /// Training column order
    pub fn feature_order(&self) -> Vec<String> {
        self.classifier.feature_names().to_vec()
    }
}

fn read_artifact(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|e| {
        AppError::Artifact(format!("cannot read {}: {}", path.display(), e))
    })
}
