//! Ledger RPC wrapper: balance reads, token-account enumeration, blockhash
//! fetch, broadcast, and confirmation polling behind one trait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::warn;
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_request::TokenAccountsFilter,
    rpc_response::RpcKeyedAccount,
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::TransactionConfirmationStatus;

use crate::config::Settings;
use crate::submit::iface::Submitter;

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What confirmation polling concluded about a broadcast signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    /// The ledger executed the transaction and it failed.
    Failed(String),
    /// Not verifiable within bounds. Callers record this as uncertain and
    /// never re-broadcast: a retry could double-submit.
    Unknown,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    async fn token_accounts_by_program(
        &self,
        owner: &Pubkey,
        program: &Pubkey,
    ) -> Result<Vec<RpcKeyedAccount>>;

    async fn token_accounts_by_mint(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<RpcKeyedAccount>>;

    async fn token_account_balance(&self, account: &Pubkey) -> Result<u64>;

    /// Blockhash plus the last block height it stays valid for.
    async fn latest_blockhash(&self) -> Result<(Hash, u64)>;

    async fn send_transaction(&self, payload_b64: String) -> Result<String>;

    async fn confirm_signature(&self, signature: &Signature) -> ConfirmOutcome;
}

pub struct LedgerClient {
    rpc: Arc<RpcClient>,
    submitter: Arc<dyn Submitter>,
    confirm_timeout: Duration,
}

impl LedgerClient {
    pub fn new(settings: &Settings, submitter: Arc<dyn Submitter>) -> Self {
        let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
            settings.rpc_url.clone(),
            Duration::from_secs(settings.rpc_timeout_secs),
            CommitmentConfig::confirmed(),
        ));
        Self {
            rpc,
            submitter,
            confirm_timeout: Duration::from_secs(settings.confirm_timeout_secs),
        }
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance(address)
            .await
            .context("get_balance failed")
    }

    async fn token_accounts_by_program(
        &self,
        owner: &Pubkey,
        program: &Pubkey,
    ) -> Result<Vec<RpcKeyedAccount>> {
        self.rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(*program))
            .await
            .context("get_token_accounts_by_owner (program filter) failed")
    }

    async fn token_accounts_by_mint(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<RpcKeyedAccount>> {
        self.rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await
            .context("get_token_accounts_by_owner (mint filter) failed")
    }

    async fn token_account_balance(&self, account: &Pubkey) -> Result<u64> {
        let amount = self
            .rpc
            .get_token_account_balance(account)
            .await
            .context("get_token_account_balance failed")?;
        amount
            .amount
            .parse::<u64>()
            .context("token balance is not a u64")
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64)> {
        self.rpc
            .get_latest_blockhash_with_commitment(self.rpc.commitment())
            .await
            .context("get_latest_blockhash failed")
    }

    async fn send_transaction(&self, payload_b64: String) -> Result<String> {
        self.submitter.submit(payload_b64, true).await
    }

    async fn confirm_signature(&self, signature: &Signature) -> ConfirmOutcome {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            match self.rpc.get_signature_statuses(&[*signature]).await {
                Ok(response) => {
                    if let Some(Some(status)) = response.value.into_iter().next() {
                        if let Some(err) = status.err {
                            return ConfirmOutcome::Failed(err.to_string());
                        }
                        if matches!(
                            status.confirmation_status,
                            Some(
                                TransactionConfirmationStatus::Confirmed
                                    | TransactionConfirmationStatus::Finalized
                            )
                        ) {
                            return ConfirmOutcome::Confirmed;
                        }
                    }
                }
                Err(e) => warn!("[RPC] signature status poll failed for {signature}: {e}"),
            }

            if Instant::now() + CONFIRM_POLL_INTERVAL > deadline {
                return ConfirmOutcome::Unknown;
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
