use alloy::primitives::{address, Address};

pub mod erc20;
pub mod v2;

pub use erc20::{Transfer, IERC20};
pub use v2::{Burn, IPair, Mint, Swap, Sync};

/// Event section of a Uniswap-V2 style pair ABI (PancakeSwap, SushiSwap, ...).
///
/// Used when the explorer ABI endpoint is not queried.
pub const PAIR_ABI_JSON: &str = include_str!("pair.json");

/// PancakeSwap V2 router on BNB Chain.
///
/// It is the `sender` of every router-initiated Swap and of every Mint on its pairs.
pub const PANCAKE_ROUTER_V2: Address = address!("10ed43c718714eb63d5aa57b78b54704e256024e");
