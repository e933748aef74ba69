use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// Column order of the nine submitted fields
pub const FEATURE_COLUMNS: [&str; 9] = [
    "age",
    "gender",
    "chest_pain",
    "breathlessness",
    "fever",
    "pain_level",
    "symptom_duration_days",
    "existing_disease",
    "severity_level",
];

/// Fields that carry a yes/no answer
pub const BOOLEAN_COLUMNS: [&str; 3] = ["chest_pain", "breathlessness", "fever"];

/// A patient's symptom submission, validated at the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PatientRecord {
    /// Age in years
    #[validate(range(min = 1, max = 100))]
    pub age: u32,

    pub gender: Gender,

    pub chest_pain: YesNo,

    pub breathlessness: YesNo,

    pub fever: YesNo,

    pub pain_level: PainLevel,

    /// How long the symptoms have lasted
    #[validate(range(min = 0, max = 14))]
    pub symptom_duration_days: u32,

    pub existing_disease: ExistingDisease,

    pub severity_level: SeverityLevel,
}

impl Default for PatientRecord {
    /// Defaults offered by the intake form
    fn default() -> Self {
        Self {
            age: 30,
            gender: Gender::Male,
            chest_pain: YesNo::No,
            breathlessness: YesNo::No,
            fever: YesNo::No,
            pain_level: PainLevel::Mild,
            symptom_duration_days: 2,
            existing_disease: ExistingDisease::None,
            severity_level: SeverityLevel::Low,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
    clap::ValueEnum,
)]
pub enum Gender {
    Male,
    Female,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PainLevel {
    Mild,
    Moderate,
    Severe,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
    clap::ValueEnum,
)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
    clap::ValueEnum,
)]
pub enum ExistingDisease {
    None,
    Diabetes,
    #[serde(rename = "Heart Disease")]
    #[strum(to_string = "Heart Disease")]
    HeartDisease,
    Asthma,
    Hypertension,
}

/// Yes/no answer. Accepts `"Yes"`/`"No"`, `1`/`0` and `true`/`false` on the
/// wire and always serializes as `"Yes"`/`"No"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
    clap::ValueEnum,
)]
#[serde(try_from = "FlagRepr", into = "String")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }

    /// Interpret a textual answer, case-insensitively
    pub fn parse_answer(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "1" | "true" => Some(YesNo::Yes),
            "no" | "n" | "0" | "false" => Some(YesNo::No),
            _ => None,
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl From<YesNo> for String {
    fn from(value: YesNo) -> Self {
        value.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<FlagRepr> for YesNo {
    type Error = String;

    fn try_from(repr: FlagRepr) -> Result<Self, Self::Error> {
        match repr {
            FlagRepr::Bool(b) => Ok(b.into()),
            FlagRepr::Int(1) => Ok(YesNo::Yes),
            FlagRepr::Int(0) => Ok(YesNo::No),
            FlagRepr::Int(n) => Err(format!("expected 0 or 1, got {}", n)),
            FlagRepr::Float(f) if f == 1.0 => Ok(YesNo::Yes),
            FlagRepr::Float(f) if f == 0.0 => Ok(YesNo::No),
            FlagRepr::Float(f) => Err(format!("expected 0 or 1, got {}", f)),
            FlagRepr::Text(text) => YesNo::parse_answer(&text)
                .ok_or_else(|| format!("expected \"Yes\" or \"No\", got {:?}", text)),
        }
    }
}
