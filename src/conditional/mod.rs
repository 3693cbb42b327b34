//! Conditional-token positions and asset wrapping

pub mod split_merge;
pub mod wrapper;

pub use split_merge::*;
pub use wrapper::*;
