use crate::config::ActiveConfig;
use crate::traits::Transport;
use crate::types::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Calls against the scoring endpoint for one configuration.
#[derive(Clone)]
pub struct CompetitionClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    team: String,
    tool: u32,
}

impl CompetitionClient {
    pub fn new(transport: Arc<dyn Transport>, config: &ActiveConfig) -> Self {
        Self {
            transport,
            endpoint: config.endpoint.clone(),
            team: config.team.clone(),
            tool: config.tool,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn tool(&self) -> u32 {
        self.tool
    }

    fn identity(&self) -> Vec<(&'static str, String)> {
        vec![("team", self.team.clone()), ("member", self.tool.to_string())]
    }

    /// POST a log payload to `{endpoint}/log`.
    pub async fn send_log<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String> {
        let body = serde_json::to_string(payload)?;
        let url = format!("{}/log", self.endpoint);
        debug!("Sending log payload of {} bytes to {}", body.len(), url);

        self.transport.post(&url, body, &self.identity()).await
    }

    /// GET `{endpoint}/submit` for one frame of one video.
    pub async fn submit(&self, video: &str, frame: u64) -> Result<String> {
        let url = format!("{}/submit", self.endpoint);
        let mut params = self.identity();
        params.push(("video", video.to_string()));
        params.push(("frame", frame.to_string()));

        self.transport.get(&url, &params).await
    }
}
