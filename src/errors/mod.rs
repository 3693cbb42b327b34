//! Error taxonomy for infrastructure faults and trading outcomes

pub mod bot_error;
pub mod swap_error;
pub mod circuit_breaker;

pub use bot_error::*;
pub use swap_error::*;
pub use circuit_breaker::*;
