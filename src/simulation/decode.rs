//! Per-operation output decoding for simulated calls

use alloy::{
    primitives::{Bytes, I256, U256},
    sol_types::{SolCall, decode_revert_reason},
};
use serde_json::Value;
use std::str::FromStr;
use crate::{
    contracts::IBatchRouter,
    types::{DecodedOutput, OutputKind},
};

/// Decodes return data according to the declared shape. Anything that does not
/// fit the shape exactly is `Unknown`, never zero.
pub fn decode_output(kind: OutputKind, data: &[u8]) -> DecodedOutput {
    if kind == OutputKind::None {
        return DecodedOutput::Empty;
    }
    if data.is_empty() {
        return DecodedOutput::Unknown;
    }

    match kind {
        OutputKind::SingleUint if data.len() == 32 => {
            DecodedOutput::Amount(U256::from_be_slice(data))
        }
        OutputKind::PoolSwapDeltas if data.len() == 64 => DecodedOutput::PoolDeltas {
            amount0: I256::from_raw(U256::from_be_slice(&data[..32])),
            amount1: I256::from_raw(U256::from_be_slice(&data[32..])),
        },
        OutputKind::BalancerExactIn => {
            match IBatchRouter::swapExactInCall::abi_decode_returns(data, true) {
                Ok(ret) => DecodedOutput::BalancerAmounts {
                    path_amounts_out: ret.pathAmountsOut,
                    tokens_out: ret.tokensOut,
                    amounts_out: ret.amountsOut,
                },
                Err(_) => DecodedOutput::Unknown,
            }
        }
        _ => DecodedOutput::Unknown,
    }
}

/// Parses a `0x`-prefixed hex string from a JSON field.
pub fn hex_field(value: Option<&Value>) -> Option<Bytes> {
    let raw = value?.as_str()?;
    if raw.is_empty() || raw == "0x" {
        return None;
    }
    Bytes::from_str(raw).ok()
}

/// Best available revert reason: the simulator's own message first, then a
/// nested error object, then an ABI `Error(string)` in the trace output.
pub fn revert_reason(entry: &Value, output: Option<&Bytes>) -> Option<String> {
    let text = |ptr: &str| {
        entry
            .pointer(ptr)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    text("/transaction/error_message")
        .or_else(|| text("/error/message"))
        .or_else(|| output.and_then(|data| decode_revert_reason(data)))
}
