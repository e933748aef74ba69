use crate::error::Result;
use crate::ml::EncodingPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("HEALNAV_CONFIG").unwrap_or_else(|_| "config/healnav.toml".to_string());

        let config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: HEALNAV_)
            .add_source(
                config::Environment::with_prefix("HEALNAV")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the model artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Trained classifier
    #[serde(default = "default_model_file")]
    pub model_file: String,

    /// `"manual"` for the built-in tables, otherwise a fitted encoders file
    #[serde(default = "default_encoders")]
    pub encoders: EncoderSource,

    /// Target label decoder
    #[serde(default = "default_target_file")]
    pub target_file: String,

    /// Handling of categorical values the encoders never saw
    #[serde(default)]
    pub encoding_policy: EncodingPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            model_file: default_model_file(),
            encoders: default_encoders(),
            target_file: default_target_file(),
            encoding_policy: EncodingPolicy::default(),
        }
    }
}

/// Where the categorical encoders come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EncoderSource {
    /// Built-in dictionaries
    Manual,
    /// Fitted encoders, relative to `artifact_dir`
    File(String),
}

impl TryFrom<String> for EncoderSource {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim() {
            "" => Err("encoders must be \"manual\" or a file name".to_string()),
            "manual" => Ok(EncoderSource::Manual),
            file => Ok(EncoderSource::File(file.to_string())),
        }
    }
}

impl From<EncoderSource> for String {
    fn from(source: EncoderSource) -> Self {
        match source {
            EncoderSource::Manual => "manual".to_string(),
            EncoderSource::File(file) => file,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: default_true(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_model_file() -> String {
    "priority_model.json".to_string()
}

fn default_encoders() -> EncoderSource {
    EncoderSource::File("feature_encoders.json".to_string())
}

fn default_target_file() -> String {
    "target_encoder.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
