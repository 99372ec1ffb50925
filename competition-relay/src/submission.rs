use crate::client::CompetitionClient;
use crate::types::{NotificationCategory, Result, SubmissionOutcome, SubmissionRequest};
use crate::utils::{classify_response, resolve_fps, time_to_frame, video_id};
use interfaces::defs::{FrameRateResolver, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How long a submission outcome stays on screen.
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(2000);

/// Receiving end of the submission queue, handed from one generation to the next.
pub type SubmissionQueue = Arc<Mutex<mpsc::UnboundedReceiver<SubmissionRequest>>>;

/// Where a submission points to on the scoring side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTarget {
    pub video: String,
    pub frame: u64,
}

pub fn prepare_submission(request: &SubmissionRequest, resolver: &dyn FrameRateResolver) -> Result<SubmissionTarget> {
    let fps = resolve_fps(&request.segment, resolver);
    let frame = time_to_frame(request.timestamp, fps)?;
    let video = video_id(&request.segment.object_id)?;

    Ok(SubmissionTarget { video, frame })
}

pub fn outcome_from_response(segment_id: &str, response: Result<String>) -> SubmissionOutcome {
    match response {
        Ok(text) => SubmissionOutcome {
            category: classify_response(&text),
            message: text,
        },
        Err(e) => SubmissionOutcome {
            message: format!("Failed to submit segment {}: {}", segment_id, e),
            category: NotificationCategory::Warning,
        },
    }
}

/// Turn queued manual submissions into `/submit` calls.
///
/// Frame and video id are worked out in arrival order; the calls themselves
/// run concurrently and report through `notifier` as they complete.
/// Requests still queued on cancellation are left for the next generation.
pub async fn run_submission_stage(
    client: CompetitionClient,
    resolver: Arc<dyn FrameRateResolver>,
    notifier: Arc<dyn Notifier>,
    requests: SubmissionQueue,
    token: CancellationToken,
) {
    let mut requests = requests.lock().await;
    info!("Submission handling started");

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            request = requests.recv() => {
                let Some(request) = request else { break };

                match prepare_submission(&request, resolver.as_ref()) {
                    Ok(target) => {
                        debug!(
                            "Submitting segment {} as video {} frame {}",
                            request.segment.segment_id, target.video, target.frame
                        );
                        tokio::spawn(deliver(
                            client.clone(),
                            notifier.clone(),
                            request.segment.segment_id.clone(),
                            target,
                            token.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("Cannot submit segment {}: {}", request.segment.segment_id, e);
                    }
                }
            }
        }
    }

    info!("Submission handling stopped");
}

async fn deliver(
    client: CompetitionClient,
    notifier: Arc<dyn Notifier>,
    segment_id: String,
    target: SubmissionTarget,
    token: CancellationToken,
) {
    let response = client.submit(&target.video, target.frame).await;

    if token.is_cancelled() {
        debug!("Discarding submission response for {} from a stopped pipeline", segment_id);
        return;
    }

    let outcome = outcome_from_response(&segment_id, response);
    info!("Submission of {}: {:?} ({})", segment_id, outcome.category, outcome.message);
    notifier.display(&outcome.message, outcome.category, NOTIFICATION_DURATION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaSegment, RelayError};
    use interfaces::defs::TECHNICAL_FPS_KEY;
    use interfaces::FixedFrameRateResolver;

    fn request(object_id: &str, timestamp: f64) -> SubmissionRequest {
        SubmissionRequest {
            segment: MediaSegment::new(format!("{}_1", object_id), object_id, 0.0, 10.0),
            timestamp,
        }
    }

    #[test]
    fn prepares_video_and_frame() {
        let resolver = FixedFrameRateResolver::new(30.0);

        let target = prepare_submission(&request("v_00042", 2.5), &resolver).unwrap();

        assert_eq!(target, SubmissionTarget { video: "42".to_owned(), frame: 75 });
    }

    #[test]
    fn metadata_frame_rate_takes_precedence() {
        let resolver = FixedFrameRateResolver::new(30.0);
        let mut req = request("v_00042", 2.0);
        req.segment = req.segment.with_metadata(TECHNICAL_FPS_KEY, "25");

        assert_eq!(prepare_submission(&req, &resolver).unwrap().frame, 50);
    }

    #[test]
    fn unresolvable_frame_rate_aborts() {
        let resolver = FixedFrameRateResolver::new(f64::NAN);
        let mut req = request("v_00042", 2.0);
        req.segment = req.segment.with_metadata(TECHNICAL_FPS_KEY, "NaN");

        assert!(matches!(
            prepare_submission(&req, &resolver),
            Err(RelayError::InvalidFrameRate { .. })
        ));
    }

    #[test]
    fn unparsable_object_id_aborts() {
        let resolver = FixedFrameRateResolver::new(25.0);

        assert!(matches!(
            prepare_submission(&request("shot_x", 1.0), &resolver),
            Err(RelayError::InvalidVideoId { .. })
        ));
    }

    #[test]
    fn transport_failures_become_warnings() {
        let outcome = outcome_from_response(
            "v_00042_1",
            Err(RelayError::HttpStatus { status: 502, reason: "Bad Gateway".to_owned() }),
        );

        assert_eq!(outcome.category, NotificationCategory::Warning);
        assert!(outcome.message.contains("502"));
        assert!(outcome.message.contains("v_00042_1"));
    }

    #[test]
    fn responses_keep_their_text() {
        let outcome = outcome_from_response("v_00042_1", Ok("Submission Correct".to_owned()));

        assert_eq!(outcome.category, NotificationCategory::Success);
        assert_eq!(outcome.message, "Submission Correct");
    }
}
