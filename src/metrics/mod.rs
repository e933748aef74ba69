//! Prometheus metrics for the triage service.
//!
//! - Predictions by priority
//! - Encoder fallback substitutions by feature
//! - Classifier contract violations
//! - Queue depth and inference latency
//!
//! # Example
//! ```no_run
//! use healnav::metrics::PREDICTIONS_TOTAL;
//!
//! PREDICTIONS_TOTAL.with_label_values(&["High"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Predictions made, by resulting priority
    ///
    /// Labels: priority
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of priority predictions")
            .namespace("healnav"),
        &["priority"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Unseen categorical values replaced by an encoder fallback
    ///
    /// Labels: feature
    pub static ref ENCODING_SUBSTITUTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "encoding_substitutions_total",
            "Categorical values replaced by the encoder fallback"
        )
        .namespace("healnav"),
        &["feature"]
    ).expect("Failed to create ENCODING_SUBSTITUTIONS_TOTAL metric");

    /// Requests failed because the classifier boundary contract broke
    ///
    /// Labels: kind (unknown_category, label_index, priority_label)
    pub static ref CONTRACT_VIOLATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("contract_violations_total", "Classifier contract violations")
            .namespace("healnav"),
        &["kind"]
    ).expect("Failed to create CONTRACT_VIOLATIONS_TOTAL metric");

    /// Cases currently held in the triage queue
    pub static ref QUEUE_DEPTH: Gauge = Gauge::with_opts(
        Opts::new("queue_depth", "Number of cases in the triage queue")
            .namespace("healnav")
    ).expect("Failed to create QUEUE_DEPTH metric");

    /// Time spent normalizing and predicting one submission
    pub static ref INFERENCE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "inference_duration_seconds",
            "Normalize and predict duration in seconds"
        )
        .namespace("healnav")
        .buckets(vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])
    ).expect("Failed to create INFERENCE_DURATION_SECONDS metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENCODING_SUBSTITUTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CONTRACT_VIOLATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(QUEUE_DEPTH.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INFERENCE_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Gather all metrics in Prometheus text exposition format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // The registry is global, so a second registration in the same
        // process reports AlreadyReg
        let result = init_metrics();
        assert!(result.is_ok() || matches!(result, Err(prometheus::Error::AlreadyReg)));
    }

    #[test]
    fn test_gather_contains_namespace() {
        let _ = init_metrics();
        PREDICTIONS_TOTAL.with_label_values(&["Low"]).inc();

        let output = gather_metrics();
        assert!(output.contains("healnav_predictions_total"));
    }
}
