use super::dispatch_log;
use crate::client::CompetitionClient;
use crate::types::{QueryState, RankedResult, ResultLogBatch, ScoredSegment};
use chrono::Utc;
use futures::stream::StreamExt;
use interfaces::defs::QuerySource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep_until, Instant};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Quiet period after the last finished query before its ranking is logged.
pub const RESULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Keeps the most recent value of a burst and releases it once no new value
/// arrived for the quiet period.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn signal(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn take_settled(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, deadline)) if deadline <= now => Some(value),
            still_pending => {
                self.pending = still_pending;
                None
            }
        }
    }
}

pub fn build_result_batch(team: &str, member: u32, timestamp: i64, ranking: &[ScoredSegment]) -> Option<ResultLogBatch> {
    if ranking.is_empty() {
        return None;
    }

    Some(ResultLogBatch {
        team: team.to_string(),
        member,
        timestamp,
        results: RankedResult::from_ranking(ranking),
    })
}

/// Log the settled ranking of every burst of finished queries.
pub async fn run_result_stage(
    client: CompetitionClient,
    query_source: Arc<dyn QuerySource>,
    states: broadcast::Receiver<QueryState>,
    token: CancellationToken,
) {
    info!("Result logging started (debounce: {}ms)", RESULT_DEBOUNCE.as_millis());

    let state_stream = BroadcastStream::new(states);
    tokio::pin!(state_stream);

    let mut debouncer = Debouncer::new(RESULT_DEBOUNCE);

    loop {
        let deadline = debouncer.deadline();

        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            state = state_stream.next() => {
                match state {
                    Some(Ok(QueryState::Ended)) => {
                        debouncer.signal(query_source.current_ranking(), Instant::now());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!("Result logging fell behind, {} query states skipped", skipped);
                    }
                    None => {
                        warn!("Query source closed, stopping result logging");
                        break;
                    }
                }
            }

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(ranking) = debouncer.take_settled(Instant::now()) {
                    match build_result_batch(client.team(), client.tool(), Utc::now().timestamp_millis(), &ranking) {
                        Some(batch) => {
                            debug!("Logging settled ranking of {} results", batch.results.len());
                            tokio::spawn(dispatch_log(client.clone(), batch, token.clone()));
                        }
                        None => debug!("Settled ranking is empty, nothing to log"),
                    }
                }
            }
        }
    }

    info!("Result logging stopped");
}
