//! Result and inventory types accumulated over one sweep run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// One non-zero token balance of the treasury wallet, as reported by the
/// inventory scan. Never mutated; consumed to decide swap legs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHolding {
    pub account: Pubkey,
    pub mint: Pubkey,
    pub raw_amount: u64,
    pub decimals: u8,
    /// Which token program owns the account (standard SPL Token or Token-2022).
    pub token_program: Pubkey,
}

/// Terminal state of one swap leg or the burn step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LegStatus {
    Confirmed { signature: String },
    /// Broadcast went out but confirmation could not be verified within
    /// bounds. Never retried automatically: a retry could double-submit.
    Unconfirmed { signature: String },
    Skipped { reason: String },
    Failed { reason: String },
}

impl LegStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, LegStatus::Confirmed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LegStatus::Failed { .. })
    }
}

/// One executed or attempted swap, recorded independently of its siblings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapLeg {
    pub input_mint: String,
    pub output_mint: String,
    pub input_amount: u64,
    #[serde(flatten)]
    pub status: LegStatus,
}

/// Outcome of the burn step. At most one per run; only the target mint is
/// ever burned.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BurnRecord {
    pub mint: String,
    pub amount_burned: u64,
    #[serde(flatten)]
    pub status: LegStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// SOL balance never crossed the configured threshold; the run stopped
    /// after the initial balance read with no further side effects.
    BelowThreshold,
    Swept,
}

/// Aggregate result of one orchestrator run. Created fresh per invocation
/// and handed back to the trigger caller; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub wallet: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sol_balance_before: u64,
    pub outcome: RunOutcome,
    pub swaps: Vec<SwapLeg>,
    pub burn: Option<BurnRecord>,
    /// "No fatal error reached the top level". Inspect the individual legs
    /// for the financial outcome.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_status_serializes_tagged() {
        let leg = SwapLeg {
            input_mint: "in".into(),
            output_mint: "out".into(),
            input_amount: 5,
            status: LegStatus::Failed {
                reason: "quote unavailable".into(),
            },
        };
        let value = serde_json::to_value(&leg).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["reason"], "quote unavailable");
        assert_eq!(value["input_amount"], 5);
    }
}
