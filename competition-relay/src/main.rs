use competition_relay::{Collaborators, ConfigSnapshot, HttpTransport, LifecycleController, TransportConfig};
use interfaces::defs::{ConfigSource, NotificationCategory, Notifier};
use interfaces::{BroadcastEventBus, BroadcastQuerySource, FixedFrameRateResolver, InMemorySelection, WatchConfigSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const FALLBACK_FPS: f64 = 25.0;

/// Without a UI, submission outcomes end up in the log.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn display(&self, message: &str, category: NotificationCategory, _duration: Duration) {
        match category {
            NotificationCategory::Success => info!("{}", message),
            NotificationCategory::Warning => warn!("{}", message),
            NotificationCategory::Error => error!("{}", message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting competition relay");

    let config_source = WatchConfigSource::new(ConfigSnapshot::values_from_env());
    let transport = HttpTransport::new(TransportConfig::default())?;

    // Interaction events and query results are published on these by the
    // embedding search client.
    let event_bus = Arc::new(BroadcastEventBus::new());
    let query_source = Arc::new(BroadcastQuerySource::new());

    let controller = Arc::new(LifecycleController::new(Collaborators {
        event_bus,
        query_source,
        frame_rate: Arc::new(FixedFrameRateResolver::new(FALLBACK_FPS)),
        notifier: Arc::new(LogNotifier),
        selection: Arc::new(InMemorySelection::default()),
        transport: Arc::new(transport),
    }));

    let listener = {
        let controller = controller.clone();
        let values = config_source.observe();
        tokio::spawn(async move { controller.watch_configuration(values).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    listener.abort();
    controller.shutdown().await;

    info!("Competition relay finished");
    Ok(())
}
