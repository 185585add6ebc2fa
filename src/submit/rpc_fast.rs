//! Raw JSON-RPC `sendTransaction` submitter.
//!
//! Posts the signed payload straight to the RPC endpoint with a bounded
//! retry count on the node side; the orchestrator handles confirmation
//! separately and never re-broadcasts on its own.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde_json::json;

use crate::submit::iface::Submitter;

/// How many times the RPC node may re-broadcast before giving up.
const MAX_NODE_RETRIES: u8 = 3;

#[derive(Clone)]
pub struct RpcFast {
    url: String,
    client: Client,
}

impl RpcFast {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building submit HTTP client")?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Submitter for RpcFast {
    async fn submit(&self, payload_b64: String, skip_preflight: bool) -> Result<String> {
        let start_time = Instant::now();

        let body = json!({
            "jsonrpc": "2.0",
            "id": "sweeper",
            "method": "sendTransaction",
            "params": [
                payload_b64,
                {
                    "encoding": "base64",
                    "skipPreflight": skip_preflight,
                    "maxRetries": MAX_NODE_RETRIES
                }
            ]
        });

        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("sendTransaction request failed")?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(anyhow!("sendTransaction HTTP {status}: {err_text}"));
        }

        let resp: serde_json::Value = res.json().await.context("parsing sendTransaction response")?;
        if let Some(err) = resp.get("error") {
            return Err(anyhow!("sendTransaction rejected: {err}"));
        }
        let sig = resp["result"]
            .as_str()
            .ok_or_else(|| anyhow!("missing 'result' in response: {resp:?}"))?;

        info!(
            "[SUBMIT] broadcast in {}ms: {}",
            start_time.elapsed().as_millis(),
            sig
        );

        Ok(sig.to_string())
    }
}
