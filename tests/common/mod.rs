//! In-memory chain and service doubles sharing one balance ledger.

#![allow(dead_code)]

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    sol_types::SolCall,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use futarchy_arb_bot::{
    BotError, BotResult, MarketConfig, SwapError,
    conditional::{AssetWrapper, ConditionalTokens, MergeOutcome, SplitOutcome, WrapOutcome},
    config::ExecutionSettings,
    contracts::{IAlgebraPool, IAlgebraRouter, IERC20, IFutarchyRouter, IPassthroughRouter, IUniswapV3Pool},
    network::ChainAccess,
    types::{
        Confirmation, ConditionalPair, ExecutionResult, Pool, PreparedTx, ReceiptStatus, SwapAmount,
        SwapIntent, SwapQuote, Token,
    },
    utils::{from_units, mul_decimal},
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn units(amount: Decimal) -> U256 {
    from_units(amount, 18).unwrap()
}

pub fn q96() -> U256 {
    U256::from(1) << 96usize
}

pub fn market() -> MarketConfig {
    MarketConfig::gnosis_default().unwrap()
}

pub fn settings() -> ExecutionSettings {
    ExecutionSettings {
        receipt_timeout: Duration::from_millis(50),
        ..ExecutionSettings::default()
    }
}

#[derive(Default)]
pub struct Ledger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    tx_count: u64,
}

impl Ledger {
    pub fn balance(&self, token: Address) -> U256 {
        self.balances.get(&token).copied().unwrap_or_default()
    }

    pub fn set(&mut self, token: Address, amount: U256) {
        self.balances.insert(token, amount);
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.allowances.get(&(token, spender)).copied().unwrap_or_default()
    }

    pub fn set_allowance(&mut self, token: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, spender), amount);
    }

    pub fn credit(&mut self, token: Address, amount: U256) {
        let held = self.balance(token);
        self.balances.insert(token, held + amount);
    }

    pub fn debit(&mut self, token: &Token, amount: U256) -> Result<(), SwapError> {
        let held = self.balance(token.address);
        if held < amount {
            return Err(SwapError::InsufficientBalance {
                symbol: token.symbol.clone(),
                token: token.address,
                required: amount,
                available: held,
            });
        }
        self.balances.insert(token.address, held - amount);
        Ok(())
    }

    fn next_hash(&mut self) -> TxHash {
        self.tx_count += 1;
        TxHash::left_padding_from(&self.tx_count.to_be_bytes())
    }
}

pub type SharedLedger = Arc<Mutex<Ledger>>;

pub fn ledger() -> SharedLedger {
    Arc::new(Mutex::new(Ledger::default()))
}

/// A swap the chain double applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSwap {
    pub router: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub price_limit: U256,
    /// Only routers that take one carry it.
    pub minimum_out: Option<U256>,
}

/// Chain double: serves balance, allowance and pool-price reads from the
/// ledger and applies approve, split, merge and swap transactions to it.
pub struct MockChain {
    pub ledger: SharedLedger,
    pub account: Address,
    pub pairs: Vec<ConditionalPair>,
    pub pools: Vec<Pool>,
    sqrt_prices: Mutex<HashMap<Address, U256>>,
    /// Output per unit of input, per `(token_in, token_out)`.
    pub swap_rates: HashMap<(Address, Address), Decimal>,
    /// Every receipt wait reports `Pending`.
    pub receipts_pending: bool,
    /// Number of upcoming `read_view` calls that fail.
    pub failing_reads: AtomicUsize,
    pub price_reads: AtomicUsize,
    receipts: Mutex<HashMap<TxHash, ReceiptStatus>>,
    pub sent: Mutex<Vec<String>>,
    pub swaps: Mutex<Vec<AppliedSwap>>,
}

impl MockChain {
    pub fn new(ledger: SharedLedger, market: &MarketConfig) -> Self {
        let pairs = [market.currency_pair(), market.company_pair()]
            .into_iter()
            .filter_map(|p| p.ok().cloned())
            .collect();
        let pools = [market.yes_pool(), market.no_pool(), market.currency_yes_pool(), market.spot_pool()]
            .into_iter()
            .filter_map(|p| p.ok().cloned())
            .collect();
        Self {
            ledger,
            account: Address::repeat_byte(0x42),
            pairs,
            pools,
            sqrt_prices: Mutex::new(HashMap::new()),
            swap_rates: HashMap::new(),
            receipts_pending: false,
            failing_reads: AtomicUsize::new(0),
            price_reads: AtomicUsize::new(0),
            receipts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            swaps: Mutex::new(Vec::new()),
        }
    }

    pub fn with_swap_rate(mut self, token_in: &Token, token_out: &Token, rate: Decimal) -> Self {
        self.swap_rates.insert((token_in.address, token_out.address), rate);
        self
    }

    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pools.retain(|p| p.address != pool.address);
        self.pools.push(pool);
        self
    }

    pub fn set_sqrt_price(&self, pool: Address, price: U256) {
        self.sqrt_prices.lock().unwrap().insert(pool, price);
    }

    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn sent_labels(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn applied_swaps(&self) -> Vec<AppliedSwap> {
        self.swaps.lock().unwrap().clone()
    }

    fn pair_for(&self, collateral: Address) -> Option<ConditionalPair> {
        self.pairs.iter().find(|p| p.base.address == collateral).cloned()
    }

    /// Moves `amount_in` of `token_in` out of the wallet and pays out at the
    /// configured rate. `None` means the swap reverts.
    fn settle_swap(&self, ledger: &mut Ledger, router: Address, token_in: Address, token_out: Address, amount_in: U256) -> Option<U256> {
        let rate = self.swap_rates.get(&(token_in, token_out)).copied()?;
        if ledger.allowance(token_in, router) < amount_in || ledger.balance(token_in) < amount_in {
            return None;
        }
        let amount_out = mul_decimal(amount_in, rate);
        ledger.balances.insert(token_in, ledger.balance(token_in) - amount_in);
        ledger.credit(token_out, amount_out);
        Some(amount_out)
    }

    fn apply(&self, tx: &PreparedTx) -> ReceiptStatus {
        let mut ledger = self.ledger.lock().unwrap();
        let input = tx.input.as_ref();

        if let Ok(call) = IERC20::approveCall::abi_decode(input, true) {
            ledger.allowances.insert((tx.to, call.spender), call.amount);
            return ReceiptStatus::Success;
        }
        if let Ok(call) = IFutarchyRouter::splitPositionCall::abi_decode(input, true) {
            let Some(pair) = self.pair_for(call.collateralToken) else {
                return ReceiptStatus::Reverted;
            };
            if ledger.debit(&pair.base, call.amount).is_err() {
                return ReceiptStatus::Reverted;
            }
            ledger.credit(pair.yes.address, call.amount);
            ledger.credit(pair.no.address, call.amount);
            return ReceiptStatus::Success;
        }
        if let Ok(call) = IFutarchyRouter::mergePositionsCall::abi_decode(input, true) {
            let Some(pair) = self.pair_for(call.collateralToken) else {
                return ReceiptStatus::Reverted;
            };
            if ledger.balance(pair.yes.address) < call.amount || ledger.balance(pair.no.address) < call.amount {
                return ReceiptStatus::Reverted;
            }
            let _ = ledger.debit(&pair.yes, call.amount);
            let _ = ledger.debit(&pair.no, call.amount);
            ledger.credit(pair.base.address, call.amount);
            return ReceiptStatus::Success;
        }
        if let Ok(call) = IPassthroughRouter::swapCall::abi_decode(input, true) {
            let Some(pool) = self.pools.iter().find(|p| p.address == call.pool) else {
                return ReceiptStatus::Reverted;
            };
            if call.amountSpecified.is_negative() {
                return ReceiptStatus::Reverted;
            }
            let (token_in, token_out) = if call.zeroForOne { (pool.token0, pool.token1) } else { (pool.token1, pool.token0) };
            let amount_in = call.amountSpecified.unsigned_abs();
            let Some(amount_out) = self.settle_swap(&mut ledger, tx.to, token_in, token_out, amount_in) else {
                return ReceiptStatus::Reverted;
            };
            self.swaps.lock().unwrap().push(AppliedSwap {
                router: tx.to,
                token_in,
                token_out,
                amount_in,
                amount_out,
                price_limit: U256::from(call.sqrtPriceLimitX96),
                minimum_out: None,
            });
            return ReceiptStatus::Success;
        }
        if let Ok(call) = IAlgebraRouter::exactInputSingleCall::abi_decode(input, true) {
            let p = call.params;
            let quoted = self
                .swap_rates
                .get(&(p.tokenIn, p.tokenOut))
                .map(|rate| mul_decimal(p.amountIn, *rate))
                .unwrap_or_default();
            if quoted < p.amountOutMinimum {
                return ReceiptStatus::Reverted;
            }
            let Some(amount_out) = self.settle_swap(&mut ledger, tx.to, p.tokenIn, p.tokenOut, p.amountIn) else {
                return ReceiptStatus::Reverted;
            };
            self.swaps.lock().unwrap().push(AppliedSwap {
                router: tx.to,
                token_in: p.tokenIn,
                token_out: p.tokenOut,
                amount_in: p.amountIn,
                amount_out,
                price_limit: U256::from(p.limitSqrtPrice),
                minimum_out: Some(p.amountOutMinimum),
            });
            return ReceiptStatus::Success;
        }
        ReceiptStatus::Reverted
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[async_trait]
impl ChainAccess for MockChain {
    fn account(&self) -> Address {
        self.account
    }

    async fn read_view(&self, to: Address, input: Bytes) -> BotResult<Bytes> {
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BotError::Network {
                message: "connection reset".to_string(),
                source: None,
                retry_count: 0,
            });
        }

        let ledger = self.ledger.lock().unwrap();
        let selector: [u8; 4] = input[..4].try_into().unwrap();

        if selector == IERC20::balanceOfCall::SELECTOR {
            return Ok(word(ledger.balance(to)));
        }
        if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(&input, true).unwrap();
            return Ok(word(ledger.allowance(to, call.spender)));
        }
        if selector == IUniswapV3Pool::slot0Call::SELECTOR || selector == IAlgebraPool::globalStateCall::SELECTOR {
            // Pool state getters lead with the sqrt price and return more words after it.
            self.price_reads.fetch_add(1, Ordering::SeqCst);
            let price = self.sqrt_prices.lock().unwrap().get(&to).copied().unwrap_or_else(q96);
            let mut data = word(price).to_vec();
            data.extend_from_slice(&[0u8; 64]);
            return Ok(data.into());
        }
        panic!("unexpected read_view selector {:?} on {}", selector, to);
    }

    async fn sign_and_send(&self, tx: &PreparedTx) -> BotResult<TxHash> {
        self.sent.lock().unwrap().push(tx.label.clone());
        let status = self.apply(tx);
        let hash = self.ledger.lock().unwrap().next_hash();
        self.receipts.lock().unwrap().insert(hash, status);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash, _timeout: Duration) -> BotResult<ReceiptStatus> {
        let status = self
            .receipts
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .unwrap_or(ReceiptStatus::Pending);
        if self.receipts_pending && status == ReceiptStatus::Success {
            return Ok(ReceiptStatus::Pending);
        }
        Ok(status)
    }
}

/// Fixed-rate venue: `out = in * rate` per `(token_in, token_out)`.
pub struct MockVenue {
    pub ledger: SharedLedger,
    pub rates: HashMap<(Address, Address), Decimal>,
    pub failing_pools: HashSet<Address>,
    pub executed: Mutex<Vec<SwapIntent>>,
    pub quoted: Mutex<Vec<SwapIntent>>,
}

impl MockVenue {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            rates: HashMap::new(),
            failing_pools: HashSet::new(),
            executed: Mutex::new(Vec::new()),
            quoted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rate(mut self, token_in: &Token, token_out: &Token, rate: Decimal) -> Self {
        self.rates.insert((token_in.address, token_out.address), rate);
        self
    }

    pub fn failing(mut self, pool: Address) -> Self {
        self.failing_pools.insert(pool);
        self
    }

    pub fn executed(&self) -> Vec<SwapIntent> {
        self.executed.lock().unwrap().clone()
    }

    fn rate(&self, intent: &SwapIntent) -> Result<Decimal, SwapError> {
        self.rates
            .get(&(intent.token_in.address, intent.token_out.address))
            .copied()
            .ok_or_else(|| SwapError::QuoteRevert {
                reason: Some(format!("no route {}", intent.describe())),
            })
    }
}

#[async_trait]
impl futarchy_arb_bot::venues::SwapVenue for MockVenue {
    async fn quote_exact_in(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        self.quoted.lock().unwrap().push(intent.clone());
        let amount_in = intent.amount.value();
        let amount_out = mul_decimal(amount_in, self.rate(intent)?);
        Ok(SwapQuote {
            amount_in,
            amount_out,
            price_limit: None,
            minimum_out: amount_out,
        })
    }

    async fn quote_exact_out(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        self.quoted.lock().unwrap().push(intent.clone());
        let amount_out = intent.amount.value();
        let amount_in = mul_decimal(amount_out, Decimal::ONE / self.rate(intent)?);
        Ok(SwapQuote {
            amount_in,
            amount_out,
            price_limit: None,
            minimum_out: amount_out,
        })
    }

    async fn execute_exact_in(&self, intent: &SwapIntent) -> Result<ExecutionResult, SwapError> {
        self.executed.lock().unwrap().push(intent.clone());
        let SwapAmount::ExactIn(amount_in) = intent.amount else {
            return Err(SwapError::InvalidAmount {
                reason: "execute needs an exact input".to_string(),
            });
        };

        let mut ledger = self.ledger.lock().unwrap();
        let tx_hash = ledger.next_hash();
        if self.failing_pools.contains(&intent.pool.address) {
            return Err(SwapError::ExecutionRevert { tx_hash });
        }

        let amount_out = mul_decimal(amount_in, self.rate(intent)?);
        ledger.debit(&intent.token_in, amount_in)?;
        ledger.credit(intent.token_out.address, amount_out);

        Ok(ExecutionResult {
            tx_hash,
            success: true,
            realized_delta_in: amount_in,
            realized_delta_out: amount_out,
            confirmation: Confirmation::Receipt,
        })
    }
}

/// Split/merge straight on the ledger.
pub struct MockConditional {
    pub ledger: SharedLedger,
    pub splits: Mutex<Vec<(String, U256)>>,
    pub merges: Mutex<Vec<(String, U256)>>,
}

impl MockConditional {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            splits: Mutex::new(Vec::new()),
            merges: Mutex::new(Vec::new()),
        }
    }

    pub fn merge_count(&self) -> usize {
        self.merges.lock().unwrap().len()
    }
}

#[async_trait]
impl ConditionalTokens for MockConditional {
    async fn split(&self, pair: &ConditionalPair, amount: U256) -> Result<SplitOutcome, SwapError> {
        self.splits.lock().unwrap().push((pair.base.symbol.clone(), amount));
        let mut ledger = self.ledger.lock().unwrap();
        ledger.debit(&pair.base, amount)?;
        ledger.credit(pair.yes.address, amount);
        ledger.credit(pair.no.address, amount);
        Ok(SplitOutcome {
            yes_amount: amount,
            no_amount: amount,
            tx_hash: ledger.next_hash(),
            confirmation: Confirmation::Receipt,
        })
    }

    async fn merge(&self, pair: &ConditionalPair, amount: U256) -> Result<MergeOutcome, SwapError> {
        self.merges.lock().unwrap().push((pair.base.symbol.clone(), amount));
        let mut ledger = self.ledger.lock().unwrap();
        ledger.debit(&pair.yes, amount)?;
        ledger.debit(&pair.no, amount)?;
        ledger.credit(pair.base.address, amount);
        Ok(MergeOutcome {
            base_received: amount,
            tx_hash: ledger.next_hash(),
            confirmation: Confirmation::Receipt,
        })
    }
}

/// Vault with a fixed assets-per-share ratio.
pub struct MockWrapper {
    pub ledger: SharedLedger,
    pub underlying: Token,
    pub vault: Token,
    pub ratio: Decimal,
}

impl MockWrapper {
    pub fn new(ledger: SharedLedger, market: &MarketConfig, ratio: Decimal) -> Self {
        Self {
            ledger,
            underlying: market.company_pair().unwrap().base.clone(),
            vault: market.wrapped_company().unwrap().clone(),
            ratio,
        }
    }
}

#[async_trait]
impl AssetWrapper for MockWrapper {
    async fn wrap(&self, assets: U256) -> Result<WrapOutcome, SwapError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.debit(&self.underlying, assets)?;
        let shares = mul_decimal(assets, Decimal::ONE / self.ratio);
        ledger.credit(self.vault.address, shares);
        Ok(WrapOutcome {
            received: shares,
            tx_hash: ledger.next_hash(),
            confirmation: Confirmation::Receipt,
        })
    }

    async fn unwrap(&self, shares: U256) -> Result<WrapOutcome, SwapError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.debit(&self.vault, shares)?;
        let assets = mul_decimal(shares, self.ratio);
        ledger.credit(self.underlying.address, assets);
        Ok(WrapOutcome {
            received: assets,
            tx_hash: ledger.next_hash(),
            confirmation: Confirmation::Receipt,
        })
    }

    async fn convert_to_assets(&self, shares: U256) -> BotResult<U256> {
        Ok(mul_decimal(shares, self.ratio))
    }
}
