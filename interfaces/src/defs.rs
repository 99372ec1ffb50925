use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Live key-value configuration as handed out by a [`ConfigSource`].
pub type ConfigValues = HashMap<String, serde_json::Value>;

/// Metadata key holding the frame rate a segment's media was encoded with.
pub const TECHNICAL_FPS_KEY: &str = "technical.fps";

/// Coarse grouping of user interactions, as expected by the scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionCategory {
    Text,
    Image,
    Sketch,
    Filter,
    Browsing,
    Cooperation,
    Other,
}

/// One user action observed on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub category: InteractionCategory,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Option<String>,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
}

impl InteractionEvent {
    pub fn new(category: InteractionCategory, kind: impl Into<String>, value: Option<String>, timestamp: i64) -> Self {
        Self {
            category,
            kind: kind.into(),
            value,
            timestamp,
        }
    }
}

/// A time range of a media object. `start` and `end` are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSegment {
    pub segment_id: String,
    pub object_id: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl MediaSegment {
    pub fn new(segment_id: impl Into<String>, object_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            segment_id: segment_id.into(),
            object_id: object_id.into(),
            start,
            end,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: MediaSegment,
    pub score: f64,
}

/// Lifecycle of a query as reported by the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Started,
    Updated,
    Ended,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationCategory {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionTag {
    pub name: String,
    pub color: String,
}

impl SelectionTag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

// Collaborator contracts.
//
// Every implementation is owned by the host application and handed to the
// relay by reference; nothing here is a process-wide singleton.

/// Publish/subscribe channel carrying interaction events.
pub trait EventBus: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<InteractionEvent>;
}

/// Query lifecycle notifications plus the ranking they produced.
pub trait QuerySource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<QueryState>;

    fn current_ranking(&self) -> Vec<ScoredSegment>;
}

/// A configuration store that may change at any time.
pub trait ConfigSource: Send + Sync {
    fn observe(&self) -> watch::Receiver<ConfigValues>;
}

pub trait FrameRateResolver: Send + Sync {
    /// Best guess of the frames per second of the segment's media. May be
    /// non-finite when nothing is known.
    fn best_effort_fps(&self, segment: &MediaSegment) -> f64;
}

/// Surfaces human-readable outcomes to the user.
pub trait Notifier: Send + Sync {
    fn display(&self, message: &str, category: NotificationCategory, duration: Duration);
}

/// Keeps track of segments the user has picked.
pub trait SelectionStore: Send + Sync {
    fn available_tags(&self) -> Vec<SelectionTag>;

    fn add(&self, tag: &SelectionTag, segment: &MediaSegment);
}
