//! Video chunk buffering for glasspane.
//!
//! [`StreamBufferFeeder`] queues elementary stream chunks from the host and
//! feeds them to a decoder backend in arrival order, trimming the retained
//! window under backpressure and resetting on append failure.
//! [`FramePacer`] decides when to ask the host for the next frame.

pub mod backend;
pub mod error;
pub mod feeder;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pacer;
pub mod seek;

pub use backend::{
    AppendBuffer, DecoderEvent, DecoderFactory, DecoderNotifier, DecoderSession,
    MediaReadyState, NullPlayback, PlaybackElement, SessionReadyState, SessionToken, TimeRange,
    FALLBACK_MIME_TYPE, PREFERRED_MIME_TYPE,
};
pub use error::StreamError;
pub use feeder::{FeedOutcome, StreamBufferFeeder, StreamState, MAX_BUFFER_SECONDS};
pub use pacer::{frame_update_scale, frame_update_scale_inv, FpsCounter, FramePacer, PacerTick};
pub use seek::{seek_to_live, SeekOutcome};
