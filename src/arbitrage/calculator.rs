//! Synthetic vs spot price calculation

use alloy::primitives::U256;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use crate::{
    config::MarketConfig,
    conditional::AssetWrapper,
    errors::SwapError,
    network::ChainAccess,
    pricing::token_price,
    types::{MarketPrices, PriceSignal, Strategy, SwapIntent},
    utils::to_units,
    venues::SwapVenue,
};

/// Probability implied by the YES currency token, capped to `[0, 1]`.
pub fn clamp_probability(raw: Decimal) -> Decimal {
    raw.max(Decimal::ZERO).min(Decimal::ONE)
}

/// `yes * p + no * (1 - p)`, saturating at `Decimal::MAX`.
pub fn synthetic_price(yes_price: Decimal, no_price: Decimal, probability: Decimal) -> Decimal {
    yes_price
        .checked_mul(probability)
        .zip(no_price.checked_mul(Decimal::ONE - probability))
        .and_then(|(yes, no)| yes.checked_add(no))
        .unwrap_or(Decimal::MAX)
}

pub fn assemble_prices(
    yes_price: Decimal,
    no_price: Decimal,
    raw_probability: Decimal,
    wrapped_spot_price: Decimal,
    wrapped_ratio: Decimal,
) -> MarketPrices {
    let probability = clamp_probability(raw_probability);
    // A zero or degenerate vault ratio leaves spot at zero, which emits no signal.
    let spot_price = wrapped_spot_price.checked_div(wrapped_ratio).unwrap_or(Decimal::ZERO);

    MarketPrices {
        yes_price,
        no_price,
        probability,
        raw_probability,
        synthetic_price: synthetic_price(yes_price, no_price, probability),
        wrapped_spot_price,
        wrapped_ratio,
        spot_price,
        observed_at: Utc::now(),
    }
}

/// Picks the strategy that closes the gap, if the gap is at least
/// `min_spread_pct` percent of spot.
pub fn evaluate_signal(prices: &MarketPrices, min_spread_pct: Decimal) -> Option<PriceSignal> {
    if prices.spot_price.is_zero() {
        return None;
    }

    let spread_pct = prices
        .synthetic_price
        .checked_div(prices.spot_price)?
        .checked_sub(Decimal::ONE)?
        .checked_mul(dec!(100))?;
    if spread_pct.abs() < min_spread_pct {
        return None;
    }

    // Synthetic above spot: buy spot, sell it synthetically.
    let strategy = if spread_pct > Decimal::ZERO {
        Strategy::SellSynthetic
    } else {
        Strategy::BuySynthetic
    };

    Some(PriceSignal {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: prices.observed_at,
        strategy,
        spot_price: prices.spot_price,
        synthetic_price: prices.synthetic_price,
        spread_pct,
        probability: prices.probability,
    })
}

/// Reads every price the strategies depend on. Reads run concurrently and
/// nothing is cached.
pub async fn read_market_prices(
    chain: &dyn ChainAccess,
    venues: &dyn SwapVenue,
    wrapper: &dyn AssetWrapper,
    market: &MarketConfig,
) -> Result<MarketPrices, SwapError> {
    let currency = market.currency_pair()?;
    let company = market.company_pair()?;
    let wrapped = market.wrapped_company()?;
    let one_wrapped = U256::from(10u64).pow(U256::from(wrapped.decimals));

    let yes = async {
        Ok::<_, SwapError>(token_price(chain, market.yes_pool()?, &company.yes, &currency.yes).await?)
    };
    let no = async {
        Ok::<_, SwapError>(token_price(chain, market.no_pool()?, &company.no, &currency.no).await?)
    };
    let probability = async {
        Ok::<_, SwapError>(token_price(chain, market.currency_yes_pool()?, &currency.yes, &currency.base).await?)
    };
    let spot = async {
        let intent = SwapIntent::exact_in(wrapped, &currency.base, one_wrapped, market.spot_pool()?);
        let quote = venues.quote_exact_in(&intent).await?;
        Ok::<_, SwapError>(to_units(quote.amount_out, currency.base.decimals))
    };
    let ratio = async {
        let assets = wrapper.convert_to_assets(one_wrapped).await?;
        Ok::<_, SwapError>(to_units(assets, company.base.decimals))
    };

    let (yes_price, no_price, raw_probability, wrapped_spot_price, wrapped_ratio) =
        tokio::try_join!(yes, no, probability, spot, ratio)?;

    Ok(assemble_prices(yes_price, no_price, raw_probability, wrapped_spot_price, wrapped_ratio))
}
