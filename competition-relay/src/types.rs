use serde::{Deserialize, Serialize};

pub use interfaces::defs::{
    ConfigValues, InteractionCategory, InteractionEvent, MediaSegment, NotificationCategory,
    QueryState, ScoredSegment, SelectionTag,
};

/// Interaction events collected during one logging window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionLogBatch {
    pub team: String,
    pub member: u32,
    /// Milliseconds since the unix epoch at which the window closed.
    pub timestamp: i64,
    pub events: Vec<InteractionEvent>,
}

/// One entry of a logged result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub item: String,
    pub segment: String,
    pub score: f64,
    /// 1-based position in the ranking.
    pub rank: usize,
}

impl RankedResult {
    pub fn from_ranking(ranking: &[ScoredSegment]) -> Vec<RankedResult> {
        ranking
            .iter()
            .enumerate()
            .map(|(index, scored)| RankedResult {
                item: scored.segment.object_id.clone(),
                segment: scored.segment.segment_id.clone(),
                score: scored.score,
                rank: index + 1,
            })
            .collect()
    }
}

/// The settled ranking of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultLogBatch {
    pub team: String,
    pub member: u32,
    pub timestamp: i64,
    pub results: Vec<RankedResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub segment: MediaSegment,
    /// Seconds into the media object.
    pub timestamp: f64,
}

/// What the user gets to see after a manual submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub message: String,
    pub category: NotificationCategory,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: f64 },

    #[error("Invalid timestamp: {timestamp}")]
    InvalidTimestamp { timestamp: f64 },

    #[error("Cannot derive video id from object id {object_id}")]
    InvalidVideoId { object_id: String },
}

pub type Result<T> = std::result::Result<T, RelayError>;
