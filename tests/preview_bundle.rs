mod common;

use alloy::{
    primitives::{I256, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use common::*;
use futarchy_arb_bot::{
    arbitrage::BundlePreviewer,
    simulation::{BundleSimulator, SimulationError},
    types::{DecodedOutput, SimulationCall, SimulationResult},
};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

/// Records the bundle and answers with canned per-position outputs.
struct RecordingSimulator {
    seen: Mutex<Vec<String>>,
    revert_at: Option<usize>,
}

#[async_trait]
impl BundleSimulator for RecordingSimulator {
    async fn simulate(&self, calls: &[SimulationCall]) -> Result<Vec<SimulationResult>, SimulationError> {
        *self.seen.lock().unwrap() = calls.iter().map(|c| c.tx.label.clone()).collect();

        let one = I256::try_from(units(dec!(1))).unwrap();
        let mut after_revert = false;
        Ok(calls
            .iter()
            .enumerate()
            .map(|(i, call)| {
                let reverted = self.revert_at == Some(i);
                let decoded_output = match i {
                    // GNO-YES is token0 of its pool: pays amount0, receives amount1.
                    3 => DecodedOutput::PoolDeltas {
                        amount0: one,
                        amount1: -I256::try_from(units(dec!(110))).unwrap(),
                    },
                    // GNO-NO is token1 of its pool.
                    5 => DecodedOutput::PoolDeltas {
                        amount0: -I256::try_from(units(dec!(95))).unwrap(),
                        amount1: one,
                    },
                    _ => DecodedOutput::Empty,
                };
                let result = SimulationResult {
                    label: call.tx.label.clone(),
                    reverted,
                    revert_reason: reverted.then(|| "execution reverted: SPL".to_string()),
                    decoded_output: if reverted { DecodedOutput::Unknown } else { decoded_output },
                    raw_output: None,
                    raw_trace: serde_json::Value::Null,
                    unreliable: after_revert,
                };
                after_revert |= reverted;
                result
            })
            .collect())
    }
}

struct Fixture {
    previewer: BundlePreviewer,
    simulator: Arc<RecordingSimulator>,
    venue: Arc<MockVenue>,
}

fn previewer(revert_at: Option<usize>) -> Fixture {
    let market = market();
    let ledger = ledger();
    let chain = Arc::new(MockChain::new(ledger.clone(), &market));
    let simulator = Arc::new(RecordingSimulator {
        seen: Mutex::new(Vec::new()),
        revert_at,
    });
    // 100 sDAI buys 1 waGNO, which redeems for 1 GNO.
    let venue = Arc::new(MockVenue::new(ledger.clone()).with_rate(
        &market.currency_pair().unwrap().base,
        market.wrapped_company().unwrap(),
        dec!(0.01),
    ));
    let wrapper = Arc::new(MockWrapper::new(ledger, &market, dec!(1)));
    let previewer = BundlePreviewer::new(chain, simulator.clone(), venue.clone(), wrapper, &market, settings()).unwrap();
    Fixture { previewer, simulator, venue }
}

#[tokio::test]
async fn legs_follow_the_split_in_one_bundle() {
    let fx = previewer(None);

    let preview = fx.previewer.preview(dec!(100)).await.unwrap();

    let labels = fx.simulator.seen.lock().unwrap().clone();
    assert_eq!(labels.len(), 6);
    assert!(labels[0].starts_with("approve GNO"));
    assert_eq!(labels[1], "split GNO");
    assert!(labels[2].starts_with("approve GNO-YES"));
    assert!(labels[3].starts_with("swap GNO-YES"));
    assert!(labels[4].starts_with("approve GNO-NO"));
    assert!(labels[5].starts_with("swap GNO-NO"));

    assert!(preview.succeeded());
    assert_eq!(preview.yes_out, Some(dec!(110)));
    assert_eq!(preview.no_out, Some(dec!(95)));
}

#[tokio::test]
async fn reverted_split_poisons_the_legs() {
    let fx = previewer(Some(1));

    let preview = fx.previewer.preview(dec!(100)).await.unwrap();

    assert!(!preview.succeeded());
    assert!(preview.steps[1].reverted);
    assert!(preview.steps[3].unreliable && preview.steps[5].unreliable);
    assert_eq!(preview.yes_out, None);
    assert_eq!(preview.no_out, None);
}

#[tokio::test]
async fn bundle_amounts_match_the_split() {
    let fx = previewer(None);

    let calls = fx.previewer.build_bundle(units(dec!(2))).await.unwrap();
    let split = futarchy_arb_bot::contracts::IFutarchyRouter::splitPositionCall::abi_decode(&calls[1].tx.input, true).unwrap();
    assert_eq!(split.amount, U256::from(units(dec!(2))));
}

#[tokio::test]
async fn split_is_sized_from_the_currency_amount() {
    let fx = previewer(None);
    let market = market();

    let preview = fx.previewer.preview(dec!(250)).await.unwrap();

    assert_eq!(preview.amount, dec!(250));
    assert_eq!(preview.company_amount, dec!(2.5));

    let quoted = fx.venue.quoted.lock().unwrap().clone();
    assert_eq!(quoted.len(), 1);
    assert_eq!(quoted[0].token_in, market.currency_pair().unwrap().base);
    assert_eq!(quoted[0].pool.address, market.spot_pool().unwrap().address);
    assert!(fx.venue.executed().is_empty());
}

#[tokio::test]
async fn dust_currency_amount_is_rejected() {
    let fx = previewer(None);

    let err = fx.previewer.preview(dec!(0.00000000000000001)).await.unwrap_err();
    assert!(matches!(err, futarchy_arb_bot::SwapError::InvalidAmount { .. }), "got {err:?}");
    assert!(fx.simulator.seen.lock().unwrap().is_empty());
}
