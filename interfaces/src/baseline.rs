use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};

use crate::defs::ConfigSource;
use crate::defs::ConfigValues;
use crate::defs::EventBus;
use crate::defs::FrameRateResolver;
use crate::defs::InteractionEvent;
use crate::defs::MediaSegment;
use crate::defs::QuerySource;
use crate::defs::QueryState;
use crate::defs::ScoredSegment;

const DEFAULT_BUS_CAPACITY: usize = 1024;

/// In-process event bus backed by a broadcast channel. Subscribers that
/// detach simply drop their receiver.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<InteractionEvent>,
}

impl BroadcastEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, event: InteractionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastEventBus {
    fn subscribe(&self) -> broadcast::Receiver<InteractionEvent> {
        self.sender.subscribe()
    }
}

/// Query source whose ranking is pushed in by whoever runs the queries.
pub struct BroadcastQuerySource {
    sender: broadcast::Sender<QueryState>,
    ranking: RwLock<Vec<ScoredSegment>>,
}

impl BroadcastQuerySource {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_BUS_CAPACITY);
        Self {
            sender,
            ranking: RwLock::new(Vec::new()),
        }
    }

    pub fn set_ranking(&self, ranking: Vec<ScoredSegment>) {
        *self.ranking.write() = ranking;
    }

    pub fn publish(&self, state: QueryState) -> usize {
        self.sender.send(state).unwrap_or(0)
    }

    /// Replace the ranking and announce the query as finished.
    pub fn finish_query(&self, ranking: Vec<ScoredSegment>) -> usize {
        self.set_ranking(ranking);
        self.publish(QueryState::Ended)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastQuerySource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySource for BroadcastQuerySource {
    fn subscribe(&self) -> broadcast::Receiver<QueryState> {
        self.sender.subscribe()
    }

    fn current_ranking(&self) -> Vec<ScoredSegment> {
        self.ranking.read().clone()
    }
}

/// Configuration held in a watch channel; every `update` re-emits to all
/// observers.
pub struct WatchConfigSource {
    sender: watch::Sender<ConfigValues>,
}

impl WatchConfigSource {
    pub fn new(initial: ConfigValues) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn replace(&self, values: ConfigValues) {
        self.sender.send_replace(values);
    }

    pub fn update(&self, key: &str, value: serde_json::Value) {
        self.sender.send_modify(|values| {
            values.insert(key.to_owned(), value);
        });
    }

    pub fn remove(&self, key: &str) {
        self.sender.send_modify(|values| {
            values.remove(key);
        });
    }
}

impl ConfigSource for WatchConfigSource {
    fn observe(&self) -> watch::Receiver<ConfigValues> {
        self.sender.subscribe()
    }
}

/// Resolver that knows a single frame rate for every segment.
pub struct FixedFrameRateResolver {
    pub fps: f64,
}

impl FixedFrameRateResolver {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl FrameRateResolver for FixedFrameRateResolver {
    fn best_effort_fps(&self, _segment: &MediaSegment) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::InteractionCategory;

    #[tokio::test]
    async fn bus_delivers_to_every_subscriber() {
        let bus = BroadcastEventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = InteractionEvent::new(InteractionCategory::Text, "search", Some("dog".to_owned()), 1);
        assert_eq!(bus.publish(event.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = BroadcastEventBus::new();
        let event = InteractionEvent::new(InteractionCategory::Browsing, "scroll", None, 1);
        assert_eq!(bus.publish(event), 0);
    }

    #[tokio::test]
    async fn finished_query_exposes_ranking() {
        let source = BroadcastQuerySource::new();
        let mut states = source.subscribe();
        let ranking = vec![ScoredSegment {
            segment: MediaSegment::new("v_00002_4", "v_00002", 10.0, 12.0),
            score: 0.9,
        }];

        source.finish_query(ranking.clone());

        assert_eq!(states.recv().await.unwrap(), QueryState::Ended);
        assert_eq!(source.current_ranking(), ranking);
    }

    #[tokio::test]
    async fn config_updates_reach_observers() {
        let source = WatchConfigSource::new(ConfigValues::new());
        let mut observer = source.observe();

        source.update("team", serde_json::json!("vitrivr"));

        observer.changed().await.unwrap();
        assert_eq!(observer.borrow().get("team"), Some(&serde_json::json!("vitrivr")));
    }
}
