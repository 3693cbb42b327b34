//! Static market layout: tokens, conditional pairs, pools and venue addresses

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use crate::errors::{BotError, BotResult};
use crate::types::{ConditionalPair, Pool, Token, VenueKind};
use super::addresses::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub yes_address: Option<Address>,
    #[serde(default)]
    pub no_address: Option<Address>,
}

fn default_decimals() -> u8 {
    18
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub address: Address,
    pub venue: VenueKind,
    /// Token symbols, already resolvable through `tokens`.
    pub token0: String,
    pub token1: String,
    #[serde(default)]
    pub fee: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueAddresses {
    pub passthrough_router: Address,
    pub algebra_router: Address,
    pub balancer_batch_router: Address,
    pub permit2: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutarchyAddresses {
    pub router: Address,
    pub proposal: Address,
}

/// Which configured symbols play which part in the strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRoles {
    /// Accounting asset, split into currency YES/NO.
    pub currency: String,
    /// Asset whose spot and synthetic prices are compared.
    pub company: String,
    /// ERC-4626 wrapper of `company` traded on the spot venue.
    pub wrapped_company: String,
    pub yes_pool: String,
    pub no_pool: String,
    /// Currency YES against plain currency, used to reconcile and to read probability.
    pub currency_yes_pool: String,
    pub spot_pool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketFile {
    pub tokens: BTreeMap<String, TokenEntry>,
    pub pools: BTreeMap<String, PoolEntry>,
    pub venues: VenueAddresses,
    pub futarchy: FutarchyAddresses,
    pub roles: MarketRoles,
}

#[derive(Debug, Clone)]
pub struct MarketConfig {
    tokens: BTreeMap<String, Token>,
    pairs: BTreeMap<String, ConditionalPair>,
    pools: BTreeMap<String, Pool>,
    pub venues: VenueAddresses,
    pub futarchy: FutarchyAddresses,
    pub roles: MarketRoles,
}

impl MarketConfig {
    /// The GNO/sDAI futarchy market on Gnosis Chain.
    pub fn gnosis_default() -> BotResult<Self> {
        let token = |address: Address, yes: Option<Address>, no: Option<Address>| TokenEntry {
            address,
            decimals: 18,
            yes_address: yes,
            no_address: no,
        };
        let pool = |address: Address, venue: VenueKind, token0: &str, token1: &str, fee: u32| PoolEntry {
            address,
            venue,
            token0: token0.to_string(),
            token1: token1.to_string(),
            fee,
        };

        let file = MarketFile {
            tokens: BTreeMap::from([
                ("sDAI".to_string(), token(SDAI, Some(SDAI_YES), Some(SDAI_NO))),
                ("GNO".to_string(), token(GNO, Some(GNO_YES), Some(GNO_NO))),
                ("waGNO".to_string(), token(WAGNO, None, None)),
            ]),
            pools: BTreeMap::from([
                (
                    "GNO-YES/sDAI-YES".to_string(),
                    pool(POOL_GNO_YES_SDAI_YES, VenueKind::PassthroughV3, "GNO-YES", "sDAI-YES", 3000),
                ),
                (
                    "sDAI-NO/GNO-NO".to_string(),
                    pool(POOL_SDAI_NO_GNO_NO, VenueKind::PassthroughV3, "sDAI-NO", "GNO-NO", 3000),
                ),
                (
                    "sDAI-YES/sDAI".to_string(),
                    pool(POOL_SDAI_YES_SDAI, VenueKind::PassthroughV3, "sDAI-YES", "sDAI", 3000),
                ),
                (
                    "waGNO/sDAI".to_string(),
                    pool(POOL_BALANCER_WAGNO_SDAI, VenueKind::BalancerBatch, "waGNO", "sDAI", 0),
                ),
            ]),
            venues: VenueAddresses {
                passthrough_router: PASSTHROUGH_ROUTER,
                algebra_router: SWAPR_ROUTER,
                balancer_batch_router: BALANCER_BATCH_ROUTER,
                permit2: PERMIT2,
            },
            futarchy: FutarchyAddresses {
                router: FUTARCHY_ROUTER,
                proposal: FUTARCHY_PROPOSAL,
            },
            roles: MarketRoles {
                currency: "sDAI".to_string(),
                company: "GNO".to_string(),
                wrapped_company: "waGNO".to_string(),
                yes_pool: "GNO-YES/sDAI-YES".to_string(),
                no_pool: "sDAI-NO/GNO-NO".to_string(),
                currency_yes_pool: "sDAI-YES/sDAI".to_string(),
                spot_pool: "waGNO/sDAI".to_string(),
            },
        };

        Self::resolve(file)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BotError::parsing(format!("reading market config {}", path.display()), e))?;
        let market = Self::from_json_str(&raw)?;
        info!("📄 Loaded market config from {}", path.display());
        Ok(market)
    }

    pub fn from_json_str(raw: &str) -> BotResult<Self> {
        let file: MarketFile = serde_json::from_str(raw)
            .map_err(|e| BotError::parsing("parsing market config JSON", e))?;
        Self::resolve(file)
    }

    pub fn resolve(file: MarketFile) -> BotResult<Self> {
        let mut tokens = BTreeMap::new();
        let mut pairs = BTreeMap::new();

        for (symbol, entry) in &file.tokens {
            let base = Token::new(symbol.clone(), entry.address, entry.decimals);
            tokens.insert(symbol.clone(), base.clone());

            match (entry.yes_address, entry.no_address) {
                (Some(yes), Some(no)) => {
                    let yes = Token::new(format!("{}-YES", symbol), yes, entry.decimals);
                    let no = Token::new(format!("{}-NO", symbol), no, entry.decimals);
                    tokens.insert(yes.symbol.clone(), yes.clone());
                    tokens.insert(no.symbol.clone(), no.clone());
                    pairs.insert(symbol.clone(), ConditionalPair { base, yes, no });
                }
                (None, None) => {}
                _ => {
                    return Err(BotError::config(format!(
                        "token {} must define both yes_address and no_address or neither",
                        symbol
                    )));
                }
            }
        }

        let mut pools = BTreeMap::new();
        for (symbol, entry) in &file.pools {
            let lookup = |sym: &str| {
                tokens.get(sym).map(|t| t.address).ok_or_else(|| {
                    BotError::config(format!("pool {} references unknown token {}", symbol, sym))
                })
            };
            let pool = Pool {
                symbol: symbol.clone(),
                address: entry.address,
                venue: entry.venue,
                token0: lookup(&entry.token0)?,
                token1: lookup(&entry.token1)?,
                fee: entry.fee,
            };
            pools.insert(symbol.clone(), pool);
        }

        let market = Self {
            tokens,
            pairs,
            pools,
            venues: file.venues,
            futarchy: file.futarchy,
            roles: file.roles,
        };
        market.check_roles()?;
        Ok(market)
    }

    fn check_roles(&self) -> BotResult<()> {
        self.currency_pair()?;
        self.company_pair()?;
        self.wrapped_company()?;
        for pool in [
            &self.roles.yes_pool,
            &self.roles.no_pool,
            &self.roles.currency_yes_pool,
            &self.roles.spot_pool,
        ] {
            self.pool(pool)?;
        }
        Ok(())
    }

    pub fn token(&self, symbol: &str) -> BotResult<&Token> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| BotError::config(format!("unknown token {}", symbol)))
    }

    pub fn pair(&self, symbol: &str) -> BotResult<&ConditionalPair> {
        self.pairs
            .get(symbol)
            .ok_or_else(|| BotError::config(format!("{} has no conditional pair", symbol)))
    }

    pub fn pool(&self, symbol: &str) -> BotResult<&Pool> {
        self.pools
            .get(symbol)
            .ok_or_else(|| BotError::config(format!("unknown pool {}", symbol)))
    }

    pub fn currency_pair(&self) -> BotResult<&ConditionalPair> {
        self.pair(&self.roles.currency)
    }

    pub fn company_pair(&self) -> BotResult<&ConditionalPair> {
        self.pair(&self.roles.company)
    }

    pub fn wrapped_company(&self) -> BotResult<&Token> {
        self.token(&self.roles.wrapped_company)
    }

    pub fn yes_pool(&self) -> BotResult<&Pool> {
        self.pool(&self.roles.yes_pool)
    }

    pub fn no_pool(&self) -> BotResult<&Pool> {
        self.pool(&self.roles.no_pool)
    }

    pub fn currency_yes_pool(&self) -> BotResult<&Pool> {
        self.pool(&self.roles.currency_yes_pool)
    }

    pub fn spot_pool(&self) -> BotResult<&Pool> {
        self.pool(&self.roles.spot_pool)
    }

    /// Every configured token, in symbol order.
    pub fn tracked_tokens(&self) -> Vec<Token> {
        self.tokens.values().cloned().collect()
    }

    pub fn router_for(&self, venue: VenueKind) -> Address {
        match venue {
            VenueKind::PassthroughV3 => self.venues.passthrough_router,
            VenueKind::Algebra => self.venues.algebra_router,
            VenueKind::BalancerBatch => self.venues.balancer_batch_router,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_market_resolves_pairs_and_pools() {
        let market = MarketConfig::gnosis_default().unwrap();
        let currency = market.currency_pair().unwrap();
        assert_eq!(currency.base.address, SDAI);
        assert_eq!(currency.yes.symbol, "sDAI-YES");
        assert_eq!(currency.no.address, SDAI_NO);

        let yes_pool = market.yes_pool().unwrap();
        assert_eq!(yes_pool.token0, GNO_YES);
        assert!(yes_pool.zero_for_one(GNO_YES));

        let no_pool = market.no_pool().unwrap();
        assert_eq!(no_pool.token1, GNO_NO);
        assert!(!no_pool.zero_for_one(GNO_NO));

        assert_eq!(market.spot_pool().unwrap().venue, VenueKind::BalancerBatch);
        assert_eq!(market.tracked_tokens().len(), 7);
    }

    #[test]
    fn json_round_trip_and_bad_references() {
        let market = MarketConfig::gnosis_default().unwrap();
        let file = MarketFile {
            tokens: BTreeMap::from([(
                "sDAI".to_string(),
                TokenEntry { address: SDAI, decimals: 18, yes_address: Some(SDAI_YES), no_address: None },
            )]),
            pools: BTreeMap::new(),
            venues: market.venues.clone(),
            futarchy: market.futarchy.clone(),
            roles: market.roles.clone(),
        };
        let err = MarketConfig::resolve(file).unwrap_err();
        assert!(err.to_string().contains("yes_address"));

        let raw = r#"{
            "tokens": {
                "sDAI": {"address": "0xaf204776c7245bF4147c2612BF6e5972Ee483701",
                         "yes_address": "0x493A0D1c776f8797297Aa8B34594fBd0A7F8968a",
                         "no_address": "0xE1133Ef862f3441880adADC2096AB67c63f6E102"}
            },
            "pools": {
                "broken": {"address": "0x9a14d28909f42823ee29847f87a15fb3b6e8aed3",
                           "venue": "passthrough_v3", "token0": "GNO-YES", "token1": "sDAI-YES"}
            },
            "venues": {"passthrough_router": "0x77DBE0441C950cE9C97a5F9A79CF316947aAa578",
                       "algebra_router": "0xfFB643E73f280B97809A8b41f7232AB401a04ee1",
                       "balancer_batch_router": "0xe2fa4e1d17725e72dcdAfe943Ecf45dF4B9E285b",
                       "permit2": "0x000000000022D473030F116dDEE9F6B43aC78BA3"},
            "futarchy": {"router": "0x7495a583ba85875d59407781b4958ED6e0E1228f",
                         "proposal": "0x6242AbA055957A63d682e9D3de3364ACB53D053A"},
            "roles": {"currency": "sDAI", "company": "GNO", "wrapped_company": "waGNO",
                      "yes_pool": "broken", "no_pool": "broken",
                      "currency_yes_pool": "broken", "spot_pool": "broken"}
        }"#;
        let err = MarketConfig::from_json_str(raw).unwrap_err();
        assert!(err.to_string().contains("unknown token GNO-YES"));
    }
}
