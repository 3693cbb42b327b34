//! Transaction execution, balance deltas and approvals

pub mod approvals;
pub mod engine;

pub use approvals::*;
pub use engine::*;
