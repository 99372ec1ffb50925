use crate::types::{MediaSegment, NotificationCategory, RelayError, Result};
use interfaces::defs::{FrameRateResolver, TECHNICAL_FPS_KEY};

/// Prefix of object ids that encode a numeric video id.
pub const VIDEO_ID_PREFIX: &str = "v_";

/// Frame rate of a segment's media.
///
/// The technical metadata wins when it holds a finite number, otherwise the
/// resolver's estimate is used as is.
pub fn resolve_fps(segment: &MediaSegment, resolver: &dyn FrameRateResolver) -> f64 {
    segment
        .metadata
        .get(TECHNICAL_FPS_KEY)
        .and_then(|fps| fps.trim().parse::<f64>().ok())
        .filter(|fps| fps.is_finite())
        .unwrap_or_else(|| resolver.best_effort_fps(segment))
}

/// Frame index shown at `timestamp` seconds: `floor(timestamp * fps)`.
pub fn time_to_frame(timestamp: f64, fps: f64) -> Result<u64> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(RelayError::InvalidFrameRate { fps });
    }
    if !timestamp.is_finite() || timestamp < 0.0 {
        return Err(RelayError::InvalidTimestamp { timestamp });
    }

    Ok((timestamp * fps).floor() as u64)
}

/// Numeric video id of an object, e.g. `v_00042` becomes `42`.
pub fn video_id(object_id: &str) -> Result<String> {
    let digits = object_id.strip_prefix(VIDEO_ID_PREFIX).unwrap_or(object_id);

    digits
        .parse::<u64>()
        .map(|id| id.to_string())
        .map_err(|_| RelayError::InvalidVideoId {
            object_id: object_id.to_string(),
        })
}

/// Sort a submission response into a notification category.
pub fn classify_response(text: &str) -> NotificationCategory {
    if text.contains("Correct") {
        NotificationCategory::Success
    } else if text.contains("Wrong") {
        NotificationCategory::Error
    } else {
        NotificationCategory::Warning
    }
}

/// Middle of a segment in seconds.
pub fn segment_midpoint(segment: &MediaSegment) -> f64 {
    (segment.start + segment.end) / 2.0
}
