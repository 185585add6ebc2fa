pub mod iface;
pub mod rpc_fast;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use iface::Submitter;

/// Returns the default broadcast path: raw JSON-RPC `sendTransaction`
/// against the configured RPC endpoint.
pub fn default(rpc_url: &str, timeout: Duration) -> Result<Arc<dyn Submitter>> {
    Ok(Arc::new(rpc_fast::RpcFast::new(rpc_url.to_string(), timeout)?))
}
