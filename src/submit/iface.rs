use async_trait::async_trait;

#[async_trait]
pub trait Submitter: Send + Sync + 'static {
    /// Broadcast a base64-encoded signed transaction and return its
    /// signature id.
    async fn submit(&self, payload_b64: String, skip_preflight: bool) -> anyhow::Result<String>;
}
