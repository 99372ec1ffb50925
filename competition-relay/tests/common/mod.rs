#![allow(dead_code)]

use async_trait::async_trait;
use competition_relay::{
    Collaborators, ConfigSnapshot, InteractionLogBatch, LifecycleController, RelayError,
    ResultLogBatch, Result, Transport,
};
use interfaces::defs::{InteractionCategory, InteractionEvent, MediaSegment, NotificationCategory, Notifier, ScoredSegment};
use interfaces::{BroadcastEventBus, BroadcastQuerySource, FixedFrameRateResolver, InMemorySelection};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const ENDPOINT: &str = "http://dres.test/api";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport that records every call and answers from a script.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    submit_responses: Mutex<VecDeque<Result<String>>>,
    fail_logs: AtomicBool,
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn log_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.method == "POST").collect()
    }

    pub fn submit_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.method == "GET").collect()
    }

    pub fn interaction_batches(&self) -> Vec<InteractionLogBatch> {
        self.log_calls()
            .iter()
            .filter_map(|call| serde_json::from_str(call.body.as_deref()?).ok())
            .collect()
    }

    pub fn result_batches(&self) -> Vec<ResultLogBatch> {
        self.log_calls()
            .iter()
            .filter_map(|call| serde_json::from_str(call.body.as_deref()?).ok())
            .collect()
    }

    pub fn respond_to_submit(&self, response: Result<String>) {
        self.submit_responses.lock().push_back(response);
    }

    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    /// Make `/submit` calls hang until the returned gate is notified.
    pub fn hold_submits(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.submit_gate.lock() = Some(gate.clone());
        gate
    }

    fn record(&self, method: &'static str, url: &str, body: Option<String>, params: &[(&str, String)]) {
        self.calls.lock().push(RecordedCall {
            method,
            url: url.to_string(),
            body,
            params: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        });
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, url: &str, body: String, params: &[(&str, String)]) -> Result<String> {
        self.record("POST", url, Some(body), params);

        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(RelayError::HttpStatus {
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }
        Ok("Log received".to_string())
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        self.record("GET", url, None, params);

        let gate = self.submit_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.submit_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("Submission Correct".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, NotificationCategory, Duration)>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<(String, NotificationCategory, Duration)> {
        self.shown.lock().clone()
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        self.shown().into_iter().map(|(_, category, _)| category).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn display(&self, message: &str, category: NotificationCategory, duration: Duration) {
        self.shown.lock().push((message.to_string(), category, duration));
    }
}

/// A controller wired to in-memory collaborators.
pub struct Harness {
    pub bus: Arc<BroadcastEventBus>,
    pub queries: Arc<BroadcastQuerySource>,
    pub selection: Arc<InMemorySelection>,
    pub notifier: Arc<RecordingNotifier>,
    pub transport: Arc<RecordingTransport>,
    pub controller: Arc<LifecycleController>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fps(25.0)
    }

    pub fn with_fps(fps: f64) -> Self {
        Self::build(fps, BroadcastEventBus::new())
    }

    /// A harness whose event bus only buffers `capacity` events per subscriber.
    pub fn with_bus_capacity(capacity: usize) -> Self {
        Self::build(25.0, BroadcastEventBus::with_capacity(capacity))
    }

    fn build(fps: f64, bus: BroadcastEventBus) -> Self {
        let bus = Arc::new(bus);
        let queries = Arc::new(BroadcastQuerySource::new());
        let selection = Arc::new(InMemorySelection::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let transport = Arc::new(RecordingTransport::default());

        let controller = Arc::new(LifecycleController::new(Collaborators {
            event_bus: bus.clone(),
            query_source: queries.clone(),
            frame_rate: Arc::new(FixedFrameRateResolver::new(fps)),
            notifier: notifier.clone(),
            selection: selection.clone(),
            transport: transport.clone(),
        }));

        Self {
            bus,
            queries,
            selection,
            notifier,
            transport,
            controller,
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn active_snapshot(team: &str, logging_enabled: bool, log_interval_ms: u64) -> ConfigSnapshot {
    ConfigSnapshot {
        endpoint: Some(ENDPOINT.to_string()),
        team: Some(team.to_string()),
        tool: 2,
        logging_enabled,
        log_interval: Duration::from_millis(log_interval_ms),
    }
}

pub fn stopped_snapshot() -> ConfigSnapshot {
    ConfigSnapshot::default()
}

pub fn event(value: &str) -> InteractionEvent {
    InteractionEvent::new(InteractionCategory::Text, "search", Some(value.to_string()), 0)
}

pub fn ranking(object_ids: &[&str]) -> Vec<ScoredSegment> {
    object_ids
        .iter()
        .enumerate()
        .map(|(index, object_id)| ScoredSegment {
            segment: MediaSegment::new(format!("{}_1", object_id), *object_id, 0.0, 4.0),
            score: 1.0 / (index as f64 + 1.0),
        })
        .collect()
}

pub async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
