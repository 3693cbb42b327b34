//! Gnosis Chain deployment addresses for the default futarchy market

use alloy::primitives::{Address, address};

// Collateral tokens
pub const SDAI: Address = address!("af204776c7245bF4147c2612BF6e5972Ee483701");
pub const SDAI_YES: Address = address!("493A0D1c776f8797297Aa8B34594fBd0A7F8968a");
pub const SDAI_NO: Address = address!("E1133Ef862f3441880adADC2096AB67c63f6E102");
pub const GNO: Address = address!("9C58BAcC331c9aa871AFD802DB6379a98e80CEdb");
pub const GNO_YES: Address = address!("177304d505eCA60E1aE0dAF1bba4A4c4181dB8Ad");
pub const GNO_NO: Address = address!("f1B3E5Ffc0219A4F8C0ac69EC98C97709EdfB6c9");
pub const WAGNO: Address = address!("7c16f0185a26db0ae7a9377f23bc18ea7ce5d644");

// Futarchy
pub const FUTARCHY_ROUTER: Address = address!("7495a583ba85875d59407781b4958ED6e0E1228f");
pub const FUTARCHY_PROPOSAL: Address = address!("6242AbA055957A63d682e9D3de3364ACB53D053A");

// Venues
pub const PASSTHROUGH_ROUTER: Address = address!("77DBE0441C950cE9C97a5F9A79CF316947aAa578");
pub const SWAPR_ROUTER: Address = address!("fFB643E73f280B97809A8b41f7232AB401a04ee1");
pub const BALANCER_BATCH_ROUTER: Address = address!("e2fa4e1d17725e72dcdAfe943Ecf45dF4B9E285b");
pub const PERMIT2: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");

// Pools
pub const POOL_GNO_YES_SDAI_YES: Address = address!("9a14d28909f42823ee29847f87a15fb3b6e8aed3");
pub const POOL_SDAI_NO_GNO_NO: Address = address!("6E33153115Ab58dab0e0F1E3a2ccda6e67FA5cD7");
pub const POOL_SDAI_YES_SDAI: Address = address!("C7405C82cFc9A652a469fAf21B7FE88D6E7d675c");
pub const POOL_BALANCER_WAGNO_SDAI: Address = address!("d1d7fa8871d84d0e77020fc28b7cd5718c446522");
