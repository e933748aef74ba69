use crate::error::{AppError, Result};
use crate::metrics::{CONTRACT_VIOLATIONS_TOTAL, ENCODING_SUBSTITUTIONS_TOTAL};
use crate::ml::encoders::{EncoderTable, EncodingPolicy, EncodingResult, EncodingRule};
use crate::models::{PatientRecord, Substitution, YesNo, BOOLEAN_COLUMNS};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A single submitted cell before encoding
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Text form used for vocabulary lookups. Whole numbers print without a
    /// fractional part.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => YesNo::from(*b).to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Read the cell as a yes/no answer, whatever its representation
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Number(n) if *n == 1.0 => Some(true),
            FieldValue::Number(n) if *n == 0.0 => Some(false),
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => YesNo::parse_answer(s).map(|answer| answer.is_yes()),
        }
    }

    /// Numeric value without an encoder; anything unparseable is 0
    fn coerce_numeric(&self) -> f64 {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Flag(b) => f64::from(u8::from(*b)),
            FieldValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Field name -> submitted value, in no particular order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<&PatientRecord> for RawRecord {
    fn from(record: &PatientRecord) -> Self {
        RawRecord::new()
            .with("age", record.age)
            .with("gender", record.gender.to_string())
            .with("chest_pain", record.chest_pain.is_yes())
            .with("breathlessness", record.breathlessness.is_yes())
            .with("fever", record.fever.is_yes())
            .with("pain_level", record.pain_level.to_string())
            .with("symptom_duration_days", record.symptom_duration_days)
            .with("existing_disease", record.existing_disease.to_string())
            .with("severity_level", record.severity_level.to_string())
    }
}

/// Fixed-order numeric encoding of one record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    /// Single-row matrix for the classifier
    pub fn to_row(&self) -> Result<Array2<f64>> {
        Array2::from_shape_vec((1, self.values.len()), self.values.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))
    }
}

/// Normalizer output: the vector plus any fallback substitutions made
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub features: FeatureVector,
    pub substitutions: Vec<Substitution>,
}

/// Turns submitted fields into the classifier's feature vector
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    encoders: Arc<EncoderTable>,
    feature_order: Vec<String>,
    policy: EncodingPolicy,
}

impl FeatureNormalizer {
    /// `feature_order` must be the classifier's training column order
    pub fn new(
        encoders: Arc<EncoderTable>,
        feature_order: Vec<String>,
        policy: EncodingPolicy,
    ) -> Self {
        Self {
            encoders,
            feature_order,
            policy,
        }
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    /// Encode a validated patient record
    pub fn normalize_record(&self, record: &PatientRecord) -> Result<Normalized> {
        self.normalize(&RawRecord::from(record))
    }

    /// Produce the feature vector in training column order
    pub fn normalize(&self, record: &RawRecord) -> Result<Normalized> {
        let mut values = Vec::with_capacity(self.feature_order.len());
        let mut substitutions = Vec::new();

        for column in &self.feature_order {
            let value = match record.get(column) {
                Some(cell) => self.encode_column(column, cell, &mut substitutions)?,
                None => {
                    debug!(feature = %column, "Missing column defaulted to 0");
                    0.0
                }
            };
            values.push(value);
        }

        Ok(Normalized {
            features: FeatureVector {
                columns: self.feature_order.clone(),
                values,
            },
            substitutions,
        })
    }

    fn encode_column(
        &self,
        column: &str,
        cell: &FieldValue,
        substitutions: &mut Vec<Substitution>,
    ) -> Result<f64> {
        let rule = self.encoders.rule(column);

        if BOOLEAN_COLUMNS.contains(&column) {
            if let Some(flag) = cell.as_flag() {
                return match rule {
                    Some(rule) => self.apply(column, rule, &flag_text(rule, flag), substitutions),
                    None => Ok(f64::from(u8::from(flag))),
                };
            }
        }

        match rule {
            Some(rule) => self.apply(column, rule, &cell.as_text(), substitutions),
            None => {
                let value = cell.coerce_numeric();
                if matches!(cell, FieldValue::Text(s) if s.trim().parse::<f64>().is_err()) {
                    debug!(feature = %column, value = %cell.as_text(), "Non-numeric value coerced to 0");
                }
                Ok(value)
            }
        }
    }

    fn apply(
        &self,
        column: &str,
        rule: &EncodingRule,
        text: &str,
        substitutions: &mut Vec<Substitution>,
    ) -> Result<f64> {
        match rule.encode(text, self.policy) {
            EncodingResult::Encoded(code) => Ok(code as f64),
            EncodingResult::Substituted {
                submitted,
                fallback,
                code,
            } => {
                warn!(
                    feature = %column,
                    submitted = %submitted,
                    fallback = %fallback,
                    "Unseen category replaced by encoder fallback"
                );
                ENCODING_SUBSTITUTIONS_TOTAL
                    .with_label_values(&[column])
                    .inc();
                substitutions.push(Substitution {
                    feature: column.to_string(),
                    submitted,
                    substituted: fallback,
                });
                Ok(code as f64)
            }
            EncodingResult::Rejected { submitted } => {
                CONTRACT_VIOLATIONS_TOTAL
                    .with_label_values(&["unknown_category"])
                    .inc();
                Err(AppError::Contract(format!(
                    "value '{}' is not in the vocabulary of feature '{}'",
                    submitted, column
                )))
            }
        }
    }
}

/// Render a yes/no answer in whichever spelling the encoder was fitted on
fn flag_text(rule: &EncodingRule, flag: bool) -> String {
    const SPELLINGS: [(&str, &str); 4] = [("Yes", "No"), ("1", "0"), ("true", "false"), ("yes", "no")];

    SPELLINGS
        .iter()
        .map(|(yes, no)| if flag { *yes } else { *no })
        .find(|text| rule.knows(text))
        .unwrap_or(if flag { "Yes" } else { "No" })
        .to_string()
}
