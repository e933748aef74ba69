use crate::error::{AppError, Result};
use crate::models::Priority;
use serde::Serialize;

/// What the patient is told for a given priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityMessage {
    pub icon: &'static str,
    pub headline: &'static str,
    pub instruction: &'static str,
}

impl std::fmt::Display for PriorityMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}\n   {}", self.icon, self.headline, self.instruction)
    }
}

pub fn message_for(priority: Priority) -> PriorityMessage {
    match priority {
        Priority::High => PriorityMessage {
            icon: "🔴",
            headline: "HIGH PRIORITY: immediate medical attention required",
            instruction: "Proceed to the Emergency Department immediately",
        },
        Priority::Medium => PriorityMessage {
            icon: "🟡",
            headline: "MEDIUM PRIORITY: doctor consultation recommended today",
            instruction: "Visit the OPD as early as possible today",
        },
        Priority::Low => PriorityMessage {
            icon: "🟢",
            headline: "LOW PRIORITY: non-urgent case",
            instruction: "An OPD visit can be scheduled later",
        },
    }
}

/// Message for a raw label. Anything but Low/Medium/High is an error; an
/// unknown label never falls through to the Low message.
pub fn message_for_label(label: &str) -> Result<PriorityMessage> {
    label
        .parse::<Priority>()
        .map(message_for)
        .map_err(|_| AppError::Contract(format!("no message for priority label '{}'", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_priority_has_distinct_message() {
        let high = message_for(Priority::High);
        let medium = message_for(Priority::Medium);
        let low = message_for(Priority::Low);

        assert!(high.instruction.contains("Emergency"));
        assert!(medium.headline.contains("today"));
        assert!(low.instruction.contains("later"));
        assert_ne!(high, low);
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(message_for_label("Medium").unwrap(), message_for(Priority::Medium));
    }

    #[test]
    fn test_unknown_label_fails_loudly() {
        let err = message_for_label("Critical").unwrap_err();
        assert!(matches!(err, AppError::Contract(_)));
        assert!(message_for_label("").is_err());
    }
}
