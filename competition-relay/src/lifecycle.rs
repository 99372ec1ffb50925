use crate::aggregators::{run_interaction_stage, run_result_stage};
use crate::client::CompetitionClient;
use crate::config::{ActiveConfig, ConfigSnapshot};
use crate::submission::{run_submission_stage, SubmissionQueue};
use crate::traits::Transport;
use crate::types::{ConfigValues, MediaSegment, SubmissionRequest};
use crate::utils::segment_midpoint;
use interfaces::defs::{EventBus, FrameRateResolver, Notifier, QuerySource, SelectionStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Everything the relay talks to. Owned by the host application.
#[derive(Clone)]
pub struct Collaborators {
    pub event_bus: Arc<dyn EventBus>,
    pub query_source: Arc<dyn QuerySource>,
    pub frame_rate: Arc<dyn FrameRateResolver>,
    pub notifier: Arc<dyn Notifier>,
    pub selection: Arc<dyn SelectionStore>,
    pub transport: Arc<dyn Transport>,
}

/// The stages started for one active configuration.
struct Generation {
    number: u64,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Generation {
    /// Cancel every stage and wait until all of them have exited.
    async fn shutdown(self) {
        debug!("Stopping generation {}", self.number);
        self.token.cancel();

        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Stage of generation {} ended abnormally: {}", self.number, e);
            }
        }
    }
}

/// Owns the live stages and rebuilds them on every configuration change.
///
/// At most one generation is live at a time. A new configuration always
/// stops the running generation completely before anything new is started.
///
/// The submission queue outlives generations: requests a stopped generation
/// did not get to are served by the next one. Only a transition into the
/// stopped state drops them.
pub struct LifecycleController {
    collaborators: Collaborators,
    transition: tokio::sync::Mutex<()>,
    current: Mutex<Option<Generation>>,
    generation_counter: AtomicU64,
    accepting: Mutex<bool>,
    submissions: mpsc::UnboundedSender<SubmissionRequest>,
    requests: SubmissionQueue,
}

impl LifecycleController {
    pub fn new(collaborators: Collaborators) -> Self {
        let (submissions, requests) = mpsc::unbounded_channel();

        Self {
            collaborators,
            transition: tokio::sync::Mutex::new(()),
            current: Mutex::new(None),
            generation_counter: AtomicU64::new(0),
            accepting: Mutex::new(false),
            submissions,
            requests: Arc::new(tokio::sync::Mutex::new(requests)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Number of the live generation, if any.
    pub fn generation(&self) -> Option<u64> {
        self.current.lock().as_ref().map(|generation| generation.number)
    }

    /// Stop whatever runs, then start the stages `snapshot` asks for.
    pub async fn on_configuration(&self, snapshot: ConfigSnapshot) {
        let _transition = self.transition.lock().await;

        let active = snapshot.active();
        *self.accepting.lock() = active.is_some();
        self.dispose().await;

        let Some(config) = active else {
            self.discard_pending().await;
            info!("Configuration incomplete, relay stopped");
            return;
        };

        let generation = self.start_generation(&config);
        *self.current.lock() = Some(generation);
    }

    /// Follow a configuration source until it closes, then stop.
    pub async fn watch_configuration(&self, mut values: watch::Receiver<ConfigValues>) {
        loop {
            let snapshot = ConfigSnapshot::from_values(&values.borrow_and_update());
            self.on_configuration(snapshot).await;

            if values.changed().await.is_err() {
                info!("Configuration source closed");
                break;
            }
        }

        self.shutdown().await;
    }

    pub async fn shutdown(&self) {
        let _transition = self.transition.lock().await;
        *self.accepting.lock() = false;
        self.dispose().await;
        self.discard_pending().await;
    }

    /// Record `segment` as selected and queue it for submission at
    /// `timestamp` seconds.
    pub fn submit(&self, segment: MediaSegment, timestamp: f64) {
        self.record_selection(&segment);

        let segment_id = segment.segment_id.clone();
        let accepting = self.accepting.lock();
        if !*accepting {
            warn!("Relay is not configured, dropping submission of {}", segment_id);
            return;
        }
        if self.submissions.send(SubmissionRequest { segment, timestamp }).is_err() {
            warn!("Submission queue closed, dropping submission of {}", segment_id);
        }
    }

    /// Submit the middle of `segment`.
    pub fn submit_segment(&self, segment: MediaSegment) {
        let timestamp = segment_midpoint(&segment);
        self.submit(segment, timestamp);
    }

    fn record_selection(&self, segment: &MediaSegment) {
        let selection = &self.collaborators.selection;
        match selection.available_tags().first() {
            Some(tag) => selection.add(tag, segment),
            None => warn!("No selection tag available for {}", segment.segment_id),
        }
    }

    async fn dispose(&self) {
        let previous = self.current.lock().take();
        if let Some(generation) = previous {
            let number = generation.number;
            generation.shutdown().await;
            info!("Generation {} stopped", number);
        }
    }

    /// Drop requests no generation will serve.
    async fn discard_pending(&self) {
        let mut requests = self.requests.lock().await;
        while let Ok(request) = requests.try_recv() {
            warn!("Relay stopped, dropping submission of {}", request.segment.segment_id);
        }
    }

    fn start_generation(&self, config: &ActiveConfig) -> Generation {
        let number = self.generation_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let span = info_span!("relay", generation = number, team = %config.team, tool = config.tool);
        let token = CancellationToken::new();
        let client = CompetitionClient::new(self.collaborators.transport.clone(), config);
        let mut tasks = Vec::with_capacity(3);

        if config.logging_enabled {
            // Subscribe before spawning so nothing published from here on is missed.
            let events = self.collaborators.event_bus.subscribe();
            tasks.push(tokio::spawn(
                run_interaction_stage(client.clone(), events, config.log_interval, token.clone())
                    .instrument(span.clone()),
            ));

            let states = self.collaborators.query_source.subscribe();
            tasks.push(tokio::spawn(
                run_result_stage(
                    client.clone(),
                    self.collaborators.query_source.clone(),
                    states,
                    token.clone(),
                )
                .instrument(span.clone()),
            ));
        }

        tasks.push(tokio::spawn(
            run_submission_stage(
                client,
                self.collaborators.frame_rate.clone(),
                self.collaborators.notifier.clone(),
                self.requests.clone(),
                token.clone(),
            )
            .instrument(span),
        ));

        info!(
            "Generation {} started for {} (team {}, tool {}, logging {})",
            number,
            config.endpoint,
            config.team,
            config.tool,
            if config.logging_enabled { "on" } else { "off" }
        );

        Generation {
            number,
            token,
            tasks,
        }
    }
}
