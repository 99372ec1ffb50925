pub mod interaction;
pub mod result;

pub use interaction::{run_interaction_stage, InteractionWindow};
pub use result::{run_result_stage, Debouncer, RESULT_DEBOUNCE};

use crate::client::CompetitionClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fire-and-forget delivery of one log payload. Failures are logged and the
/// payload is dropped; answers arriving after `token` was cancelled are
/// ignored.
pub(crate) async fn dispatch_log<T: Serialize + Send + Sync>(
    client: CompetitionClient,
    payload: T,
    token: CancellationToken,
) {
    let result = client.send_log(&payload).await;

    if token.is_cancelled() {
        debug!("Discarding log response from a stopped pipeline");
        return;
    }

    match result {
        Ok(response) => debug!("Log accepted: {}", response),
        Err(e) => warn!("Failed to send log to team {}: {}", client.team(), e),
    }
}
