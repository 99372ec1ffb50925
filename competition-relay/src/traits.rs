use crate::types::Result;
use async_trait::async_trait;

/// HTTP capability used by every stage of the relay.
///
/// Implementations return the response body as text and turn any non-2xx
/// status into an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` (already serialized JSON) to `url` with the given query
    /// parameters.
    async fn post(&self, url: &str, body: String, params: &[(&str, String)]) -> Result<String>;

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String>;
}
