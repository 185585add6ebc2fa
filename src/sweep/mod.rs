//! Sweep orchestrator: threshold check → native-coin swap → per-token
//! swaps → burn, with every leg independently fallible and independently
//! reported.

pub mod burn;
pub mod inventory;
pub mod spendable;
pub mod types;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use chrono::Utc;
use log::{info, warn};
use solana_sdk::{
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Settings;
use crate::rpc::{ConfirmOutcome, Ledger};
use crate::swap::SwapApi;
use spendable::{compute_spendable, SpendOutcome};
use types::{BurnRecord, LegStatus, RunOutcome, RunResult, SwapLeg, TokenHolding};

/// Pseudo-mint the aggregator uses for the native coin.
pub const WSOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

pub struct SweepRunner {
    settings: Arc<Settings>,
    ledger: Arc<dyn Ledger>,
    swap: Arc<dyn SwapApi>,
    /// Two concurrent runs against the same wallet would race on the same
    /// balance and could double-spend the safety margin, so runs serialize
    /// here for the lifetime of the process.
    run_lock: Mutex<()>,
}

impl SweepRunner {
    pub fn new(settings: Arc<Settings>, ledger: Arc<dyn Ledger>, swap: Arc<dyn SwapApi>) -> Self {
        Self {
            settings,
            ledger,
            swap,
            run_lock: Mutex::new(()),
        }
    }

    /// Execute one full sweep. Fatal errors (the initial balance read) abort
    /// before any network mutation; everything after that is recorded per
    /// leg and never escapes as a process-level fault.
    pub async fn run(&self) -> Result<RunResult> {
        let _guard = self.run_lock.lock().await;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let wallet = self.settings.wallet_address;

        let sol_balance = self
            .ledger
            .get_balance(&wallet)
            .await
            .context("reading treasury SOL balance")?;
        info!(
            "[SWEEP] run {run_id}: treasury {wallet} holds {sol_balance} lamports (threshold {})",
            self.settings.sol_threshold_lamports
        );

        if sol_balance < self.settings.sol_threshold_lamports {
            info!("[SWEEP] run {run_id}: below threshold, nothing to do");
            return Ok(RunResult {
                run_id,
                wallet: wallet.to_string(),
                started_at,
                finished_at: Utc::now(),
                sol_balance_before: sol_balance,
                outcome: RunOutcome::BelowThreshold,
                swaps: Vec::new(),
                burn: None,
                success: true,
            });
        }

        let mut swaps = Vec::new();
        swaps.push(self.native_swap_leg(sol_balance).await);
        swaps.extend(self.token_swap_legs().await);

        let burn = self.burn_target().await;

        info!(
            "[SWEEP] run {run_id}: {} legs ({} confirmed), burn: {:?}",
            swaps.len(),
            swaps.iter().filter(|l| l.status.is_confirmed()).count(),
            burn.status
        );

        Ok(RunResult {
            run_id,
            wallet: wallet.to_string(),
            started_at,
            finished_at: Utc::now(),
            sol_balance_before: sol_balance,
            outcome: RunOutcome::Swept,
            swaps,
            burn: Some(burn),
            success: true,
        })
    }

    /// Stage 2: convert surplus SOL into the target token.
    async fn native_swap_leg(&self, sol_balance: u64) -> SwapLeg {
        let target = self.settings.target_mint;
        let status = match compute_spendable(
            sol_balance,
            self.settings.fee_reserve_lamports,
            self.settings.safety_bps,
        ) {
            SpendOutcome::InsufficientAfterReserve => LegStatus::Skipped {
                reason: "balance does not exceed the fee reserve".into(),
            },
            SpendOutcome::InsufficientAfterSafetyMargin => LegStatus::Skipped {
                reason: "safety margin floors the spend amount to zero".into(),
            },
            SpendOutcome::Spend(amount) => {
                return SwapLeg {
                    input_mint: WSOL_MINT.to_string(),
                    output_mint: target.to_string(),
                    input_amount: amount,
                    status: self.execute_swap(&WSOL_MINT, &target, amount, true).await,
                }
            }
        };

        SwapLeg {
            input_mint: WSOL_MINT.to_string(),
            output_mint: target.to_string(),
            input_amount: 0,
            status,
        }
    }

    /// Stage 3: one swap leg per non-target token holding. Each leg's
    /// failure is isolated; one bad holding never blocks the others.
    async fn token_swap_legs(&self) -> Vec<SwapLeg> {
        let wallet = self.settings.wallet_address;
        let target = self.settings.target_mint;
        let holdings = inventory::list_holdings(self.ledger.as_ref(), &wallet).await;
        info!("[SWEEP] inventory: {} non-zero holdings", holdings.len());

        let mut legs = Vec::new();
        for holding in holdings {
            if holding.mint == WSOL_MINT || holding.mint == target {
                continue;
            }
            let status = self
                .execute_swap(&holding.mint, &target, holding.raw_amount, false)
                .await;
            legs.push(SwapLeg {
                input_mint: holding.mint.to_string(),
                output_mint: target.to_string(),
                input_amount: holding.raw_amount,
                status,
            });
        }
        legs
    }

    /// Quote → build → sign → broadcast → confirm, with every error caught
    /// at this boundary and folded into the leg's status.
    async fn execute_swap(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        wrap_and_unwrap_sol: bool,
    ) -> LegStatus {
        match self
            .try_swap(input_mint, output_mint, amount, wrap_and_unwrap_sol)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                warn!("[SWEEP] swap leg {input_mint} -> {output_mint} failed: {e:#}");
                LegStatus::Failed {
                    reason: format!("{e:#}"),
                }
            }
        }
    }

    async fn try_swap(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        wrap_and_unwrap_sol: bool,
    ) -> Result<LegStatus> {
        let wallet = self.settings.wallet_address;

        let quote = self
            .swap
            .get_quote(input_mint, output_mint, amount, self.settings.slippage_bps)
            .await?;
        let payload = self
            .swap
            .build_swap_transaction(&quote, &wallet, wrap_and_unwrap_sol)
            .await?;

        let unsigned: VersionedTransaction =
            bincode::deserialize(&payload).context("deserializing aggregator transaction")?;
        let signed =
            VersionedTransaction::try_new(unsigned.message, &[self.settings.keypair.as_ref()])
                .context("signing swap transaction")?;
        let payload_b64 = base64::engine::general_purpose::STANDARD
            .encode(bincode::serialize(&signed).context("serializing signed transaction")?);

        let signature = self
            .ledger
            .send_transaction(payload_b64)
            .await
            .context("broadcasting swap transaction")?;
        self.confirm(&signature).await
    }

    /// Stages 4 and 5: re-read the target-token balance (swaps just changed
    /// it) and burn whatever is there.
    async fn burn_target(&self) -> BurnRecord {
        let target = self.settings.target_mint;
        match self.try_burn().await {
            Ok(record) => record,
            Err(e) => {
                warn!("[SWEEP] burn step failed: {e:#}");
                BurnRecord {
                    mint: target.to_string(),
                    amount_burned: 0,
                    status: LegStatus::Failed {
                        reason: format!("{e:#}"),
                    },
                }
            }
        }
    }

    async fn try_burn(&self) -> Result<BurnRecord> {
        let wallet = self.settings.wallet_address;
        let target = self.settings.target_mint;

        let accounts = self
            .ledger
            .token_accounts_by_mint(&wallet, &target)
            .await
            .context("locating target token account")?;
        let parsed: Vec<TokenHolding> = accounts
            .iter()
            .filter_map(inventory::parse_keyed_account)
            .collect();

        // Prefer the associated token account; fall back to the largest
        // holder if the treasury ended up with an auxiliary account.
        let atas = inventory::supported_token_programs()
            .map(|program| get_associated_token_address_with_program_id(&wallet, &target, &program));
        let holding = parsed
            .iter()
            .find(|h| atas.contains(&h.account))
            .cloned()
            .or_else(|| parsed.into_iter().max_by_key(|h| h.raw_amount));

        let Some(holding) = holding else {
            return Ok(nothing_to_burn(&target));
        };

        let amount = self
            .ledger
            .token_account_balance(&holding.account)
            .await
            .context("reading target token balance")?;
        if amount == 0 {
            return Ok(nothing_to_burn(&target));
        }

        info!("[SWEEP] 🔥 burning {amount} base units of {target}");
        let ix = burn::build_burn_instruction(
            &holding.token_program,
            &holding.account,
            &target,
            &wallet,
            amount,
        );
        let (blockhash, _last_valid_height) = self
            .ledger
            .latest_blockhash()
            .await
            .context("fetching blockhash for burn")?;
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&wallet),
            &[self.settings.keypair.as_ref()],
            blockhash,
        );
        let payload_b64 = base64::engine::general_purpose::STANDARD.encode(
            bincode::serialize(&VersionedTransaction::from(tx))
                .context("serializing burn transaction")?,
        );

        let signature = self
            .ledger
            .send_transaction(payload_b64)
            .await
            .context("broadcasting burn transaction")?;
        let status = self.confirm(&signature).await?;

        Ok(BurnRecord {
            mint: target.to_string(),
            amount_burned: amount,
            status,
        })
    }

    async fn confirm(&self, signature: &str) -> Result<LegStatus> {
        let parsed = Signature::from_str(signature)
            .with_context(|| format!("ledger returned malformed signature {signature}"))?;
        Ok(match self.ledger.confirm_signature(&parsed).await {
            ConfirmOutcome::Confirmed => LegStatus::Confirmed {
                signature: signature.to_string(),
            },
            ConfirmOutcome::Unknown => LegStatus::Unconfirmed {
                signature: signature.to_string(),
            },
            ConfirmOutcome::Failed(err) => LegStatus::Failed {
                reason: format!("{signature} failed on chain: {err}"),
            },
        })
    }
}

fn nothing_to_burn(target: &Pubkey) -> BurnRecord {
    BurnRecord {
        mint: target.to_string(),
        amount_burned: 0,
        status: LegStatus::Skipped {
            reason: "nothing to burn".into(),
        },
    }
}
