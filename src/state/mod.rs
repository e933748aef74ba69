pub mod queue;

pub use queue::TriageQueue;
