pub mod messages;
pub mod processor;

pub use messages::{message_for, message_for_label, PriorityMessage};
pub use processor::{Assessment, TriageProcessor};
