//! Model boundary for patient priority prediction
//!
//! This module provides:
//! - Feature normalization into the classifier's training column order
//! - Categorical encoders (static dictionaries and fitted label encoders)
//!   with strict or safe handling of unseen values
//! - Evaluation of pre-trained classifier artifacts (logistic regression,
//!   decision tree, random forest)
//! - Target label decoding and artifact loading

pub mod artifacts;
pub mod classifier;
pub mod encoders;
pub mod features;

pub use artifacts::{ModelArtifacts, TargetDecoder};
pub use classifier::{Classifier, ModelArtifact, ModelParams, ModelType, TreeParams};
pub use encoders::{EncoderTable, EncodingPolicy, EncodingResult, EncodingRule, FeatureEncoding};
pub use features::{FeatureNormalizer, FeatureVector, FieldValue, Normalized, RawRecord};
