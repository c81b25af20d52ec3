//! Seek-to-live policy.

use tracing::{trace, warn};

use crate::backend::{MediaReadyState, PlaybackElement};

/// Seconds behind live after which playback jumps ahead regardless of how
/// much is buffered.
pub const MAX_LAG_SECONDS: f64 = 3.0;

/// What [`seek_to_live`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// Nothing seekable yet.
    NoSeekableRange,
    /// Not enough buffered and close enough to live.
    Hold,
    /// Jumped to the given position.
    Seeked(f64),
    /// The seek target was not a finite number.
    Skipped,
}

/// Readiness required before jumping to live.
pub fn seek_threshold(aggressive: bool) -> MediaReadyState {
    if aggressive {
        MediaReadyState::HaveFutureData
    } else {
        MediaReadyState::HaveEnoughData
    }
}

/// Move playback to the live edge when enough is buffered or it lags too far.
pub fn seek_to_live(playback: &mut dyn PlaybackElement, aggressive: bool) -> SeekOutcome {
    let Some(seek_time) = playback.seekable_end() else {
        return SeekOutcome::NoSeekableRange;
    };

    let ready = playback.ready_state() >= seek_threshold(aggressive);
    let lag = seek_time - playback.current_time();
    let behind = lag > MAX_LAG_SECONDS;
    if !(ready || behind) {
        return SeekOutcome::Hold;
    }

    if !seek_time.is_finite() {
        warn!(seek_time, "failed to seek to end of video");
        return SeekOutcome::Skipped;
    }

    trace!(seek_time, lag, ready, "seeking to live");
    playback.set_current_time(seek_time);
    SeekOutcome::Seeked(seek_time)
}
