use crate::error::{AppError, Result};
use crate::models::{ExistingDisease, Gender, PainLevel, SeverityLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum::{Display, EnumString, IntoEnumIterator};

/// What to do with a categorical value the encoder has never seen
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EncodingPolicy {
    /// Unknown values are a contract violation
    Strict,
    /// Unknown values are replaced by the vocabulary's first entry
    #[default]
    Safe,
}

/// Which categorical coding a model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureEncoding {
    /// The hand-maintained dictionaries of `EncoderTable::manual()`
    Manual,
    /// Label encoders fitted alongside the model
    LabelEncoder,
}

/// Outcome of encoding one categorical value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingResult {
    Encoded(i64),
    Substituted {
        submitted: String,
        fallback: String,
        code: i64,
    },
    Rejected {
        submitted: String,
    },
}

impl EncodingResult {
    /// Integer code, if the value could be encoded at all
    pub fn code(&self) -> Option<i64> {
        match self {
            EncodingResult::Encoded(code) => Some(*code),
            EncodingResult::Substituted { code, .. } => Some(*code),
            EncodingResult::Rejected { .. } => None,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, EncodingResult::Substituted { .. })
    }
}

/// How one feature's categories map to integers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodingRule {
    /// Hand-maintained label -> code dictionary
    Static { mapping: BTreeMap<String, i64> },

    /// Fitted label encoder: a value's code is its index in `classes`
    LabelEncoder { classes: Vec<String> },
}

impl EncodingRule {
    /// Build a label encoder the way it is fitted: unique values, sorted
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = values.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        EncodingRule::LabelEncoder { classes }
    }

    /// Code for a known value
    pub fn lookup(&self, value: &str) -> Option<i64> {
        match self {
            EncodingRule::Static { mapping } => mapping.get(value).copied(),
            EncodingRule::LabelEncoder { classes } => classes
                .iter()
                .position(|class| class == value)
                .map(|idx| idx as i64),
        }
    }

    pub fn knows(&self, value: &str) -> bool {
        self.lookup(value).is_some()
    }

    /// Value substituted for unknown input: the first class of a label
    /// encoder, the lowest code of a static dictionary
    pub fn fallback(&self) -> Option<(&str, i64)> {
        match self {
            EncodingRule::Static { mapping } => mapping
                .iter()
                .min_by_key(|(_, code)| **code)
                .map(|(label, code)| (label.as_str(), *code)),
            EncodingRule::LabelEncoder { classes } => {
                classes.first().map(|class| (class.as_str(), 0))
            }
        }
    }

    /// Encode a value under the given policy
    pub fn encode(&self, value: &str, policy: EncodingPolicy) -> EncodingResult {
        if let Some(code) = self.lookup(value) {
            return EncodingResult::Encoded(code);
        }

        match (policy, self.fallback()) {
            (EncodingPolicy::Safe, Some((fallback, code))) => EncodingResult::Substituted {
                submitted: value.to_string(),
                fallback: fallback.to_string(),
                code,
            },
            _ => EncodingResult::Rejected {
                submitted: value.to_string(),
            },
        }
    }

    /// Number of known values
    /// Coding family of this rule
    pub fn encoding(&self) -> FeatureEncoding {
        match self {
            EncodingRule::Static { .. } => FeatureEncoding::Manual,
            EncodingRule::LabelEncoder { .. } => FeatureEncoding::LabelEncoder,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        match self {
            EncodingRule::Static { mapping } => mapping.len(),
            EncodingRule::LabelEncoder { classes } => classes.len(),
        }
    }

    fn validate(&self, feature: &str) -> Result<()> {
        if self.vocabulary_size() == 0 {
            return Err(AppError::Artifact(format!(
                "encoder for '{}' has an empty vocabulary",
                feature
            )));
        }

        if let EncodingRule::LabelEncoder { classes } = self {
            let mut seen = HashSet::new();
            if let Some(dup) = classes.iter().find(|class| !seen.insert(class.as_str())) {
                return Err(AppError::Artifact(format!(
                    "encoder for '{}' lists class '{}' twice",
                    feature, dup
                )));
            }
        }

        Ok(())
    }
}

/// Per-feature encoding rules, immutable once loaded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderTable {
    rules: BTreeMap<String, EncodingRule>,
}

impl EncoderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hand-maintained dictionaries used when no fitted encoders ship
    /// with the model
    pub fn manual() -> Self {
        let indexed = |labels: Vec<String>| EncodingRule::Static {
            mapping: labels
                .into_iter()
                .enumerate()
                .map(|(idx, label)| (label, idx as i64))
                .collect(),
        };

        Self::new()
            .with_rule(
                "gender",
                EncodingRule::Static {
                    mapping: BTreeMap::from([
                        (Gender::Male.to_string(), 1),
                        (Gender::Female.to_string(), 0),
                    ]),
                },
            )
            .with_rule(
                "pain_level",
                indexed(PainLevel::iter().map(|p| p.to_string()).collect()),
            )
            .with_rule(
                "severity_level",
                indexed(SeverityLevel::iter().map(|s| s.to_string()).collect()),
            )
            .with_rule(
                "existing_disease",
                indexed(ExistingDisease::iter().map(|d| d.to_string()).collect()),
            )
    }

    /// Parse a table from its JSON artifact form
    pub fn from_json(json: &str) -> Result<Self> {
        let table: EncoderTable = serde_json::from_str(json)
            .map_err(|e| AppError::Artifact(format!("invalid feature encoders: {}", e)))?;
        table.validate()?;
        Ok(table)
    }

    pub fn with_rule(mut self, feature: impl Into<String>, rule: EncodingRule) -> Self {
        self.rules.insert(feature.into(), rule);
        self
    }

    pub fn rule(&self, feature: &str) -> Option<&EncodingRule> {
        self.rules.get(feature)
    }

    /// Names of the features this table encodes
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Coding shared by every rule; `None` for an empty or mixed table
    pub fn encoding(&self) -> Option<FeatureEncoding> {
        let mut encodings = self.rules.values().map(EncodingRule::encoding);
        let first = encodings.next()?;
        encodings.all(|e| e == first).then_some(first)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every rule is usable
    pub fn validate(&self) -> Result<()> {
        for (feature, rule) in &self.rules {
            rule.validate(feature)?;
        }
        Ok(())
    }
}
