use crate::metrics::QUEUE_DEPTH;
use crate::models::PatientCase;
use parking_lot::RwLock;
use prometheus::Gauge;

/// In-memory triage queue: append-only for the lifetime of the process,
/// read back ordered by priority rank.
#[derive(Debug)]
pub struct TriageQueue {
    cases: RwLock<Vec<PatientCase>>,
    depth: Gauge,
}

impl Default for TriageQueue {
    fn default() -> Self {
        Self::with_gauge(QUEUE_DEPTH.clone())
    }
}

impl TriageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue reporting its depth to `depth` instead of the global gauge
    pub fn with_gauge(depth: Gauge) -> Self {
        Self {
            cases: RwLock::new(Vec::new()),
            depth,
        }
    }

    /// Append a case. No deduplication, no capacity bound.
    pub fn enqueue(&self, case: PatientCase) {
        let mut cases = self.cases.write();
        cases.push(case);
        // set under the write lock: the gauge never lags the store
        self.depth.set(cases.len() as f64);
        tracing::debug!(depth = cases.len(), "Case enqueued");
    }

    /// Cases ordered High, Medium, Low; equal priorities keep submission
    /// order. The store itself is left untouched.
    pub fn view_sorted(&self) -> Vec<PatientCase> {
        let mut view = self.cases.read().clone();
        view.sort_by_key(|case| case.priority.rank());
        view
    }

    /// Cases in submission order
    pub fn snapshot(&self) -> Vec<PatientCase> {
        self.cases.read().clone()
    }

    pub fn len(&self) -> usize {
        self.cases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.read().is_empty()
    }
}
