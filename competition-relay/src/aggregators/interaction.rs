use super::dispatch_log;
use crate::client::CompetitionClient;
use crate::types::{InteractionEvent, InteractionLogBatch};
use chrono::Utc;
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Events buffered for the currently open window, in arrival order.
#[derive(Debug, Default)]
pub struct InteractionWindow {
    events: Vec<InteractionEvent>,
}

impl InteractionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InteractionEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Close the window and start a new one. Empty windows yield nothing.
    pub fn close(&mut self, team: &str, member: u32, timestamp: i64) -> Option<InteractionLogBatch> {
        if self.events.is_empty() {
            return None;
        }

        Some(InteractionLogBatch {
            team: team.to_string(),
            member,
            timestamp,
            events: std::mem::take(&mut self.events),
        })
    }
}

/// Batch bus events into windows of `period` and ship every non-empty one.
///
/// Runs until `token` is cancelled or the bus goes away. Whatever sits in the
/// open window at that point is dropped.
pub async fn run_interaction_stage(
    client: CompetitionClient,
    events: broadcast::Receiver<InteractionEvent>,
    period: Duration,
    token: CancellationToken,
) {
    info!("Interaction logging started (window: {}ms)", period.as_millis());

    let event_stream = BroadcastStream::new(events);
    tokio::pin!(event_stream);

    let mut window = InteractionWindow::new();
    let mut window_timer = interval_at(Instant::now() + period, period);
    window_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = window_timer.tick() => {
                if let Some(batch) = window.close(client.team(), client.tool(), Utc::now().timestamp_millis()) {
                    debug!("Closing interaction window with {} events", batch.events.len());
                    tokio::spawn(dispatch_log(client.clone(), batch, token.clone()));
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(event)) => window.push(event),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!("Interaction logging fell behind, {} events skipped", skipped);
                    }
                    None => {
                        warn!("Event bus closed, stopping interaction logging");
                        break;
                    }
                }
            }
        }
    }

    if !window.is_empty() {
        debug!("Dropping {} buffered interaction events", window.len());
    }
    info!("Interaction logging stopped");
}
