//! Decoder backend seams.
//!
//! The feeder drives a media pipeline it does not implement: a factory that
//! opens decoder sessions, the append buffer a session hands out once it is
//! open, and the playback element that presents decoded video. Completion of
//! asynchronous operations is reported back through a [`DecoderNotifier`],
//! tagged with the [`SessionToken`] of the session that produced it.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::StreamError;

/// Preferred buffer type: H.264 Main profile, level 6.1, in fragmented MP4.
pub const PREFERRED_MIME_TYPE: &str = r#"video/mp4; codecs="avc1.4D403D""#;
/// Used when the backend rejects [`PREFERRED_MIME_TYPE`].
pub const FALLBACK_MIME_TYPE: &str = "video/mp4";

/// Identifies one decoder session. Completions carrying an older token are
/// stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Asynchronous completions from a decoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderEvent {
    /// The session is ready for a buffer to be attached.
    Opened(SessionToken),
    /// A pending append or remove finished.
    UpdateEnd(SessionToken),
    /// The buffer failed asynchronously.
    Error(SessionToken),
}

impl DecoderEvent {
    pub fn token(self) -> SessionToken {
        match self {
            Self::Opened(t) | Self::UpdateEnd(t) | Self::Error(t) => t,
        }
    }
}

/// Channel decoder completions are posted to.
pub type DecoderNotifier = mpsc::UnboundedSender<DecoderEvent>;

/// Overall state of a decoder session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionReadyState {
    Closed,
    Open,
    Ended,
}

/// How much media the playback element holds around the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// A contiguous span of buffered media, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Opens decoder sessions.
pub trait DecoderFactory: Send {
    /// Whether buffers of this MIME type can be attached.
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Start a new session. The backend posts
    /// [`DecoderEvent::Opened`] with `token` once it is ready.
    fn create_session(
        &mut self,
        token: SessionToken,
        notifier: DecoderNotifier,
    ) -> Result<Box<dyn DecoderSession>, StreamError>;
}

/// One decode session, alive from `"NewVideo"` until the next one.
pub trait DecoderSession: Send {
    fn ready_state(&self) -> SessionReadyState;

    /// Attach the append buffer. Only valid once the session is open.
    fn add_buffer(&mut self, mime_type: &str) -> Result<Box<dyn AppendBuffer>, StreamError>;
}

/// Buffer elementary stream chunks are appended to.
///
/// `append` and `remove` may complete synchronously or later. Backends that
/// complete later report `is_updating() == true` until they post
/// [`DecoderEvent::UpdateEnd`].
pub trait AppendBuffer: Send {
    fn is_updating(&self) -> bool;

    /// The first buffered range, if anything is buffered.
    fn buffered(&self) -> Option<TimeRange>;

    fn append(&mut self, chunk: Bytes) -> Result<(), StreamError>;

    fn remove(&mut self, start: f64, end: f64) -> Result<(), StreamError>;

    /// Cancel an in-flight append.
    fn abort(&mut self) -> Result<(), StreamError>;
}

/// The element decoded video is presented on.
pub trait PlaybackElement: Send {
    /// End of the last seekable range, if there is one.
    fn seekable_end(&self) -> Option<f64>;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    fn ready_state(&self) -> MediaReadyState;
}

/// A playback element with nothing to seek in. Used by headless backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl PlaybackElement for NullPlayback {
    fn seekable_end(&self) -> Option<f64> {
        None
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn set_current_time(&mut self, _seconds: f64) {}

    fn ready_state(&self) -> MediaReadyState {
        MediaReadyState::HaveNothing
    }
}
