//! Live pool price reads
//!
//! Prices are read from chain on every call and never cached.

use alloy::{primitives::U256, sol_types::SolCall};
use rust_decimal::Decimal;
use crate::{
    contracts::{IAlgebraPool, IUniswapV3Pool, first_word},
    errors::{BotError, BotResult},
    network::ChainAccess,
    types::{Pool, Token, VenueKind},
    utils::{pow10, to_units},
};

const PRICE_PRECISION: u8 = 18;

/// Current sqrtPriceX96 of a concentrated-liquidity pool.
pub async fn read_sqrt_price(chain: &dyn ChainAccess, pool: &Pool) -> BotResult<U256> {
    let input = match pool.venue {
        VenueKind::Algebra => IAlgebraPool::globalStateCall {}.abi_encode(),
        VenueKind::PassthroughV3 => IUniswapV3Pool::slot0Call {}.abi_encode(),
        VenueKind::BalancerBatch => {
            return Err(BotError::config(format!(
                "pool {} is a weighted pool without a sqrt price",
                pool.symbol
            )));
        }
    };

    let data = chain.read_view(pool.address, input.into()).await?;
    first_word(&data).map_err(|e| BotError::Contract {
        contract: pool.address,
        message: format!("decoding price state of {}", pool.symbol),
        source: e,
    })
}

/// Raw token1-per-token0 ratio, `sqrtP^2 / 2^192`, ignoring decimals.
pub fn sqrt_price_to_ratio(sqrt_price_x96: U256) -> Decimal {
    // sqrtP * 1e18 / 2^96 stays under 2^124; squaring stays under 2^248.
    let scaled = (sqrt_price_x96 * U256::from(10u64).pow(U256::from(PRICE_PRECISION))) >> 96usize;
    let squared = scaled * scaled;
    to_units(squared, PRICE_PRECISION * 2)
}

/// Price of `token` denominated in the pool's other token.
pub fn oriented_price(pool: &Pool, sqrt_price_x96: U256, token: &Token, quote: &Token) -> BotResult<Decimal> {
    if !pool.contains(token.address) || !pool.contains(quote.address) {
        return Err(BotError::config(format!(
            "pool {} does not trade {}/{}",
            pool.symbol, token.symbol, quote.symbol
        )));
    }

    let ratio = sqrt_price_to_ratio(sqrt_price_x96);
    let (token0, token1) = if token.address == pool.token0 { (token, quote) } else { (quote, token) };
    // Adjust raw units to whole-token units: price1per0 * 10^(dec0 - dec1).
    let out_of_range = || BotError::config(format!("pool {} price is out of range", pool.symbol));
    let adjusted = pow10(i32::from(token0.decimals) - i32::from(token1.decimals))
        .and_then(|scale| ratio.checked_mul(scale))
        .ok_or_else(out_of_range)?;

    if token.address == pool.token0 {
        Ok(adjusted)
    } else if adjusted.is_zero() {
        Err(BotError::config(format!("pool {} reports a zero price", pool.symbol)))
    } else {
        Decimal::ONE.checked_div(adjusted).ok_or_else(out_of_range)
    }
}

/// Reads the pool and returns the price of `token` in `quote`.
pub async fn token_price(chain: &dyn ChainAccess, pool: &Pool, token: &Token, quote: &Token) -> BotResult<Decimal> {
    let sqrt_price = read_sqrt_price(chain, pool).await?;
    oriented_price(pool, sqrt_price, token, quote)
}
