//! Price limits and live pool prices

pub mod limits;
pub mod pool_price;

pub use limits::*;
pub use pool_price::*;
