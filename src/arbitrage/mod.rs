//! Opportunity detection, strategy sequencing and bundle preview

pub mod calculator;
pub mod orchestrator;
pub mod preview;

pub use calculator::*;
pub use orchestrator::*;
pub use preview::*;
