//! Core data types and structures

pub mod tokens;
pub mod transaction;
pub mod swap;
pub mod simulation;
pub mod run;
pub mod market;

pub use tokens::*;
pub use transaction::*;
pub use swap::*;
pub use simulation::*;
pub use run::*;
pub use market::*;
