pub mod case;
pub mod patient;

pub use case::*;
pub use patient::*;
