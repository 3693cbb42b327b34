//! Contract ABIs and raw return-data helpers

pub mod bindings;

pub use bindings::*;

use alloy::primitives::U256;
use anyhow::{Result, anyhow};

/// Reads the first 32-byte word of return data. Pool state getters differ in
/// trailing fields across AMM versions but always lead with the sqrt price.
pub fn first_word(data: &[u8]) -> Result<U256> {
    if data.len() < 32 {
        return Err(anyhow!("return data too short: {} bytes", data.len()));
    }
    Ok(U256::from_be_slice(&data[..32]))
}
