//! Jupiter-style aggregator HTTP client (`GET /quote`, `POST /swap`).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;

use crate::swap::SwapApi;

/// Opaque aggregator quote. The body is stored and forwarded verbatim into
/// the swap-build request; nothing here reinterprets its fields beyond the
/// route-presence check, so the aggregator is free to evolve its schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapQuote(Value);

impl SwapQuote {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Shape check only: a usable quote names a non-zero `outAmount` and a
    /// non-empty route plan.
    pub fn has_route(&self) -> bool {
        let out_amount_ok = self.0["outAmount"]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|v| v > 0)
            .unwrap_or(false);
        let route_ok = self.0["routePlan"]
            .as_array()
            .map(|plan| !plan.is_empty())
            .unwrap_or(false);
        out_amount_ok && route_ok
    }
}

pub struct JupiterClient {
    base_url: String,
    client: Client,
}

impl JupiterClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building aggregator HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SwapApi for JupiterClient {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<SwapQuote> {
        let url = format!("{}/quote", self.base_url);
        debug!("[JUP] quote {} -> {} amount={}", input_mint, output_mint, amount);

        let res = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", slippage_bps.to_string()),
            ])
            .send()
            .await
            .context("quote request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("quote unavailable: HTTP {status}: {body}"));
        }

        let quote = SwapQuote::from_value(res.json().await.context("parsing quote response")?);
        if !quote.has_route() {
            return Err(anyhow!(
                "quote unavailable: no usable route for {input_mint} -> {output_mint}"
            ));
        }
        Ok(quote)
    }

    async fn build_swap_transaction(
        &self,
        quote: &SwapQuote,
        user: &Pubkey,
        wrap_and_unwrap_sol: bool,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/swap", self.base_url);
        let body = json!({
            "quoteResponse": quote.as_value(),
            "userPublicKey": user.to_string(),
            "wrapAndUnwrapSol": wrap_and_unwrap_sol,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("swap build request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("transaction build failed: HTTP {status}: {body}"));
        }

        let response: Value = res.json().await.context("parsing swap build response")?;
        let tx_b64 = response["swapTransaction"]
            .as_str()
            .ok_or_else(|| anyhow!("transaction build failed: response missing `swapTransaction`"))?;

        base64::engine::general_purpose::STANDARD
            .decode(tx_b64)
            .context("decoding `swapTransaction` payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_route_is_recognized() {
        let quote = SwapQuote::from_value(json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "outAmount": "123456",
            "routePlan": [{"swapInfo": {"label": "Orca"}}],
        }));
        assert!(quote.has_route());
    }

    #[test]
    fn zero_or_missing_route_is_rejected() {
        assert!(!SwapQuote::from_value(json!({"outAmount": "0", "routePlan": [{}]})).has_route());
        assert!(!SwapQuote::from_value(json!({"outAmount": "10", "routePlan": []})).has_route());
        assert!(!SwapQuote::from_value(json!({"error": "no route"})).has_route());
    }

    #[test]
    fn quote_round_trips_untouched() {
        let raw = json!({"outAmount": "10", "routePlan": [{}], "weirdNewField": {"x": 1}});
        let quote = SwapQuote::from_value(raw.clone());
        assert_eq!(quote.as_value(), &raw);
        // Serialization is transparent: embedding the quote in a swap-build
        // body must reproduce the aggregator's own structure.
        assert_eq!(serde_json::to_value(&quote).unwrap(), raw);
    }
}
