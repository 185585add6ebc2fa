//! Swap aggregator protocol.
//!
//! The aggregator owns all routing and pricing; this side of the wire only
//! asks for a quote, hands the quote back untouched to get a serialized
//! transaction, and leaves signing/submission to the orchestrator.

pub mod jupiter;

pub use jupiter::{JupiterClient, SwapQuote};

use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Fetch a quote for swapping `amount` base units of `input_mint` into
    /// `output_mint`. Never retried here: a stale re-quote is worse than a
    /// failed leg, so retry policy belongs to the caller.
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<SwapQuote>;

    /// Exchange a quote for the aggregator-built serialized versioned
    /// transaction. Returns the raw transaction bytes; the caller
    /// deserializes, signs, and submits them.
    async fn build_swap_transaction(
        &self,
        quote: &SwapQuote,
        user: &Pubkey,
        wrap_and_unwrap_sol: bool,
    ) -> Result<Vec<u8>>;
}
