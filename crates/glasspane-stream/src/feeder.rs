//! Append queue and decoder session state machine.

use std::collections::VecDeque;

use bytes::Bytes;
use glasspane_types::SettingsProvider;
use tracing::{debug, info, trace, warn};

use crate::backend::{
    AppendBuffer, DecoderEvent, DecoderFactory, DecoderNotifier, DecoderSession,
    PlaybackElement, SessionReadyState, SessionToken, FALLBACK_MIME_TYPE, PREFERRED_MIME_TYPE,
};
use crate::error::StreamError;
use crate::seek::seek_to_live;

/// Retained media above this many seconds is trimmed before appending more.
pub const MAX_BUFFER_SECONDS: f64 = 20.0;

/// Where the feeder is in the life of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No decoder session yet.
    Uninitialized,
    /// Session created, waiting for it to open so a buffer can be attached.
    AwaitingFirstChunk,
    /// Buffer attached, chunks are appended as they arrive.
    Streaming,
    /// An append failed. Chunks are dropped until the host starts a new video.
    Restarting,
    /// The connection is gone.
    Closed,
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::AwaitingFirstChunk => write!(f, "AwaitingFirstChunk"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Restarting => write!(f, "Restarting"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// What the caller has to do after feeding an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Continue,
    /// The event was stale or arrived in a state that discards it.
    Ignored,
    /// The stream broke; ask the host for a fresh one by re-sending the
    /// current configuration.
    ResyncRequested,
}

/// Feeds elementary stream chunks into a decoder, oldest first.
pub struct StreamBufferFeeder {
    factory: Box<dyn DecoderFactory>,
    playback: Box<dyn PlaybackElement>,
    settings: Box<dyn SettingsProvider>,
    notifier: DecoderNotifier,
    state: StreamState,
    token: SessionToken,
    session: Option<Box<dyn DecoderSession>>,
    buffer: Option<Box<dyn AppendBuffer>>,
    pending: VecDeque<Bytes>,
}

impl StreamBufferFeeder {
    pub fn new(
        factory: Box<dyn DecoderFactory>,
        playback: Box<dyn PlaybackElement>,
        settings: Box<dyn SettingsProvider>,
        notifier: DecoderNotifier,
    ) -> Self {
        Self {
            factory,
            playback,
            settings,
            notifier,
            state: StreamState::Uninitialized,
            token: SessionToken(0),
            session: None,
            buffer: None,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Token of the current session.
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Chunks waiting to be appended.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// A new connection was opened. Resets a closed feeder.
    pub fn on_connection_open(&mut self) {
        self.drop_session();
        self.pending.clear();
        self.state = StreamState::Uninitialized;
    }

    /// The host starts a new elementary stream: replace the decoder session.
    pub fn on_new_video(&mut self) -> Result<(), StreamError> {
        if self.state == StreamState::Closed {
            debug!("NewVideo after close, ignoring");
            return Ok(());
        }

        self.drop_session();
        self.pending.clear();
        self.token = SessionToken(self.token.0 + 1);

        match self.factory.create_session(self.token, self.notifier.clone()) {
            Ok(session) => {
                self.session = Some(session);
                self.state = StreamState::AwaitingFirstChunk;
                debug!(token = %self.token, "decoder session created");
                Ok(())
            }
            Err(e) => {
                self.state = StreamState::Uninitialized;
                Err(e)
            }
        }
    }

    /// The session finished opening: attach a buffer and drain the queue.
    pub fn on_session_open(&mut self, token: SessionToken) -> Result<FeedOutcome, StreamError> {
        if token != self.token || self.state != StreamState::AwaitingFirstChunk {
            trace!(%token, current = %self.token, state = %self.state, "stale session open");
            return Ok(FeedOutcome::Ignored);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(FeedOutcome::Ignored);
        };

        let mime_type = if self.factory.is_type_supported(PREFERRED_MIME_TYPE) {
            PREFERRED_MIME_TYPE
        } else {
            FALLBACK_MIME_TYPE
        };
        match session.add_buffer(mime_type) {
            Ok(buffer) => self.buffer = Some(buffer),
            Err(e) => {
                warn!(%token, mime_type, error = %e, "failed to attach decoder buffer");
                self.drop_session();
                self.pending.clear();
                self.state = StreamState::Restarting;
                return Ok(FeedOutcome::ResyncRequested);
            }
        }
        self.state = StreamState::Streaming;
        info!(%token, mime_type, queued = self.pending.len(), "decoder buffer attached");

        Ok(self.pump())
    }

    /// A binary chunk arrived.
    ///
    /// Playback is pulled back to the live edge on every chunk until the
    /// feeder is closed, including chunks dropped while restarting.
    pub fn on_chunk(&mut self, chunk: Bytes) -> FeedOutcome {
        let outcome = match self.state {
            StreamState::Closed => {
                trace!(len = chunk.len(), "dropping chunk after close");
                return FeedOutcome::Ignored;
            }
            StreamState::Restarting => {
                trace!(len = chunk.len(), "dropping chunk while restarting");
                FeedOutcome::Ignored
            }
            StreamState::Uninitialized | StreamState::AwaitingFirstChunk | StreamState::Streaming => {
                self.pending.push_back(chunk);
                self.pump()
            }
        };

        seek_to_live(self.playback.as_mut(), self.settings.aggressive_seek());
        outcome
    }

    /// A pending append or remove completed.
    pub fn on_update_end(&mut self, token: SessionToken) -> FeedOutcome {
        if token != self.token || self.state != StreamState::Streaming {
            trace!(%token, current = %self.token, state = %self.state, "stale update end");
            return FeedOutcome::Ignored;
        }
        self.pump()
    }

    /// The buffer reported an asynchronous error.
    pub fn on_buffer_error(&mut self, token: SessionToken) -> FeedOutcome {
        if token != self.token
            || !matches!(
                self.state,
                StreamState::AwaitingFirstChunk | StreamState::Streaming
            )
        {
            return FeedOutcome::Ignored;
        }
        debug!(%token, "decoder buffer error, requesting a new stream");
        self.pending.clear();
        self.state = StreamState::Restarting;
        FeedOutcome::ResyncRequested
    }

    /// Route a backend completion to the matching handler.
    pub fn handle_decoder_event(&mut self, event: DecoderEvent) -> Result<FeedOutcome, StreamError> {
        match event {
            DecoderEvent::Opened(token) => self.on_session_open(token),
            DecoderEvent::UpdateEnd(token) => Ok(self.on_update_end(token)),
            DecoderEvent::Error(token) => Ok(self.on_buffer_error(token)),
        }
    }

    /// The connection closed. Decoder resources are released without
    /// flushing anything still queued.
    pub fn close(&mut self) {
        self.drop_session();
        self.pending.clear();
        self.state = StreamState::Closed;
    }

    fn drop_session(&mut self) {
        self.buffer = None;
        self.session = None;
    }

    /// Append queued chunks until the buffer is busy or the queue is empty.
    ///
    /// Synchronous backends never report busy, so they are drained in one
    /// go. A trim always ends the pump; its completion (or the next chunk)
    /// resumes it.
    fn pump(&mut self) -> FeedOutcome {
        loop {
            let Some(buffer) = self.buffer.as_mut() else {
                return FeedOutcome::Continue;
            };
            if buffer.is_updating() || self.pending.is_empty() {
                return FeedOutcome::Continue;
            }
            let open = self
                .session
                .as_ref()
                .is_some_and(|s| s.ready_state() == SessionReadyState::Open);
            if !open {
                return FeedOutcome::Continue;
            }

            // Only the first range is considered; decoders are expected to
            // keep a single contiguous range for a live stream.
            if let Some(range) = buffer.buffered() {
                if range.duration() > MAX_BUFFER_SECONDS {
                    let end = range.end - MAX_BUFFER_SECONDS / 2.0;
                    debug!(start = range.start, end = range.end, trim_to = end, "trimming buffer");
                    if let Err(e) = buffer.remove(0.0, end) {
                        warn!(error = %e, "failed to trim buffer");
                    }
                    return FeedOutcome::Continue;
                }
            }

            let Some(chunk) = self.pending.pop_front() else {
                return FeedOutcome::Continue;
            };
            let len = chunk.len();
            if let Err(e) = buffer.append(chunk) {
                debug!(error = %e, len, "error appending to buffer");
                return self.reset_buffer();
            }
            trace!(len, queued = self.pending.len(), "appended chunk");
        }
    }

    /// Drop everything buffered and queued, then wait for a fresh stream.
    fn reset_buffer(&mut self) -> FeedOutcome {
        if let Some(buffer) = self.buffer.as_mut() {
            if buffer.is_updating() {
                if let Err(e) = buffer.abort() {
                    debug!(error = %e, "abort failed");
                }
            }
            if let Err(e) = buffer.remove(0.0, f64::INFINITY) {
                debug!(error = %e, "clearing buffer failed");
            }
        }
        self.pending.clear();
        self.state = StreamState::Restarting;
        FeedOutcome::ResyncRequested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MediaReadyState, TimeRange};
    use crate::mock::{MockDecoderFactory, MockDecoderHandle, MockPlayback, MockPlaybackHandle};
    use glasspane_types::{Settings, SharedSettings};
    use tokio::sync::mpsc;

    struct Fixture {
        feeder: StreamBufferFeeder,
        decoder: MockDecoderHandle,
        playback: MockPlaybackHandle,
        settings: SharedSettings,
        events: mpsc::UnboundedReceiver<DecoderEvent>,
    }

    fn fixture(factory: MockDecoderFactory) -> Fixture {
        let decoder = factory.handle();
        let playback = MockPlayback::new();
        let playback_handle = playback.handle();
        let settings = SharedSettings::new(Settings::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let feeder = StreamBufferFeeder::new(
            Box::new(factory),
            Box::new(playback),
            Box::new(settings.clone()),
            tx,
        );
        Fixture {
            feeder,
            decoder,
            playback: playback_handle,
            settings,
            events: rx,
        }
    }

    impl Fixture {
        /// Deliver every queued backend completion to the feeder.
        fn drain_events(&mut self) -> Vec<FeedOutcome> {
            let mut outcomes = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                outcomes.push(self.feeder.handle_decoder_event(event).unwrap());
            }
            outcomes
        }

        fn open_stream(&mut self) {
            self.feeder.on_new_video().unwrap();
            self.drain_events();
            assert_eq!(self.feeder.state(), StreamState::Streaming);
        }
    }

    fn chunk(tag: u8) -> Bytes {
        Bytes::from(vec![tag; 4])
    }

    #[test]
    fn chunks_before_open_are_queued_then_drained() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.feeder.on_new_video().unwrap();
        assert_eq!(f.feeder.state(), StreamState::AwaitingFirstChunk);

        for tag in 1..=3 {
            assert_eq!(f.feeder.on_chunk(chunk(tag)), FeedOutcome::Continue);
        }
        assert_eq!(f.feeder.pending_len(), 3);
        assert!(f.decoder.appended().is_empty());

        f.drain_events();
        assert_eq!(f.feeder.state(), StreamState::Streaming);
        assert_eq!(f.feeder.pending_len(), 0);
        assert_eq!(f.decoder.appended(), vec![chunk(1), chunk(2), chunk(3)]);
    }

    #[test]
    fn busy_buffer_drains_fifo() {
        let mut f = fixture(MockDecoderFactory::asynchronous());
        f.open_stream();

        for tag in [b'A', b'B', b'C'] {
            f.feeder.on_chunk(chunk(tag));
        }
        // A went straight in, B and C wait behind it.
        assert_eq!(f.decoder.appended(), vec![chunk(b'A')]);
        assert_eq!(f.feeder.pending_len(), 2);

        f.decoder.complete_update();
        f.drain_events();
        f.decoder.complete_update();
        f.drain_events();

        assert_eq!(
            f.decoder.appended(),
            vec![chunk(b'A'), chunk(b'B'), chunk(b'C')]
        );
        assert_eq!(f.feeder.pending_len(), 0);
    }

    #[test]
    fn mime_type_falls_back_when_unsupported() {
        let mut f = fixture(MockDecoderFactory::synchronous().with_supported_types(&[]));
        f.open_stream();
        assert_eq!(f.decoder.buffer_mime_type().as_deref(), Some(FALLBACK_MIME_TYPE));

        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        assert_eq!(
            f.decoder.buffer_mime_type().as_deref(),
            Some(PREFERRED_MIME_TYPE)
        );
    }

    #[test]
    fn trims_only_above_twenty_seconds() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();

        f.decoder.set_buffered(Some(TimeRange {
            start: 0.0,
            end: 20.0,
        }));
        f.feeder.on_chunk(chunk(1));
        assert!(f.decoder.removed().is_empty());
        assert_eq!(f.decoder.appended().len(), 1);

        f.decoder.set_buffered(Some(TimeRange {
            start: 0.0,
            end: 21.0,
        }));
        f.feeder.on_chunk(chunk(2));
        assert_eq!(f.decoder.removed(), vec![(0.0, 11.0)]);
        // Trim took this tick; the chunk waits.
        assert_eq!(f.decoder.appended().len(), 1);
        assert_eq!(f.feeder.pending_len(), 1);

        f.decoder.set_buffered(Some(TimeRange {
            start: 11.0,
            end: 21.0,
        }));
        f.feeder.on_chunk(chunk(3));
        assert_eq!(f.decoder.appended(), vec![chunk(1), chunk(2), chunk(3)]);
    }

    #[test]
    fn trim_completion_resumes_appending() {
        let mut f = fixture(MockDecoderFactory::asynchronous());
        f.open_stream();
        f.decoder.set_buffered(Some(TimeRange {
            start: 0.0,
            end: 30.0,
        }));

        f.feeder.on_chunk(chunk(1));
        assert_eq!(f.decoder.removed(), vec![(0.0, 20.0)]);
        assert!(f.decoder.appended().is_empty());

        f.decoder.set_buffered(Some(TimeRange {
            start: 20.0,
            end: 30.0,
        }));
        f.decoder.complete_update();
        f.drain_events();
        assert_eq!(f.decoder.appended(), vec![chunk(1)]);
    }

    #[test]
    fn append_failure_resets_and_requests_resync() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();

        f.decoder.fail_next_append();
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::ResyncRequested);
        assert_eq!(f.feeder.state(), StreamState::Restarting);
        assert_eq!(f.decoder.removed(), vec![(0.0, f64::INFINITY)]);

        // Nothing is appended again until the host starts a new stream.
        assert_eq!(f.feeder.on_chunk(chunk(2)), FeedOutcome::Ignored);
        assert_eq!(f.feeder.pending_len(), 0);
        assert!(f.decoder.appended().is_empty());

        f.open_stream();
        f.feeder.on_chunk(chunk(3));
        assert_eq!(f.decoder.appended(), vec![chunk(3)]);
        assert_eq!(f.decoder.sessions_created(), 2);
    }

    #[test]
    fn append_failure_while_updating_aborts() {
        let mut f = fixture(MockDecoderFactory::asynchronous());
        f.open_stream();
        f.decoder.fail_next_append();
        f.decoder.set_updating_on_failure(true);
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::ResyncRequested);
        assert_eq!(f.decoder.aborts(), 1);
    }

    #[test]
    fn failed_chunk_is_not_retried() {
        let mut f = fixture(MockDecoderFactory::asynchronous());
        f.open_stream();

        f.feeder.on_chunk(chunk(1));
        f.feeder.on_chunk(chunk(2));
        f.decoder.fail_next_append();
        f.decoder.complete_update();
        let outcomes = f.drain_events();
        assert_eq!(outcomes, vec![FeedOutcome::ResyncRequested]);

        f.open_stream();
        f.feeder.on_chunk(chunk(3));
        assert_eq!(f.decoder.appended(), vec![chunk(1), chunk(3)]);
    }

    #[test]
    fn stale_session_events_are_ignored() {
        let mut f = fixture(MockDecoderFactory::asynchronous());
        f.feeder.on_new_video().unwrap();
        let first = f.feeder.token();
        f.feeder.on_new_video().unwrap();
        let second = f.feeder.token();
        assert_ne!(first, second);

        assert_eq!(
            f.feeder.on_session_open(first).unwrap(),
            FeedOutcome::Ignored
        );
        assert_eq!(f.feeder.state(), StreamState::AwaitingFirstChunk);
        assert_eq!(f.feeder.on_update_end(first), FeedOutcome::Ignored);
        assert_eq!(f.feeder.on_buffer_error(first), FeedOutcome::Ignored);

        f.drain_events();
        assert_eq!(f.feeder.state(), StreamState::Streaming);
    }

    #[test]
    fn new_video_discards_queue() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.feeder.on_new_video().unwrap();
        f.feeder.on_chunk(chunk(1));
        f.feeder.on_new_video().unwrap();
        assert_eq!(f.feeder.pending_len(), 0);
        f.drain_events();
        assert!(f.decoder.appended().is_empty());
    }

    #[test]
    fn closed_session_state_blocks_appends() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.decoder.set_session_state(SessionReadyState::Ended);
        f.feeder.on_chunk(chunk(1));
        assert_eq!(f.feeder.pending_len(), 1);
        f.decoder.set_session_state(SessionReadyState::Open);
        f.feeder.on_chunk(chunk(2));
        assert_eq!(f.decoder.appended(), vec![chunk(1), chunk(2)]);
    }

    #[test]
    fn buffer_error_requests_resync() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        let token = f.feeder.token();
        assert_eq!(f.feeder.on_buffer_error(token), FeedOutcome::ResyncRequested);
        assert_eq!(f.feeder.state(), StreamState::Restarting);
    }

    #[test]
    fn chunk_triggers_seek_to_live() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.playback
            .set(Some(12.0), 11.5, MediaReadyState::HaveFutureData);

        f.feeder.on_chunk(chunk(1));
        assert_eq!(f.playback.current_time(), 11.5);

        f.settings.update(|s| s.aggressive_seeking = true);
        f.feeder.on_chunk(chunk(2));
        assert_eq!(f.playback.current_time(), 12.0);
    }

    #[test]
    fn lagging_playback_seeks_while_restarting() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.playback
            .set(Some(10.0), 2.0, MediaReadyState::HaveFutureData);

        f.decoder.fail_next_append();
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::ResyncRequested);
        assert_eq!(f.playback.seeks().len(), 1);

        f.playback
            .set(Some(14.0), 9.0, MediaReadyState::HaveFutureData);
        assert_eq!(f.feeder.on_chunk(chunk(2)), FeedOutcome::Ignored);
        assert_eq!(f.feeder.state(), StreamState::Restarting);
        assert_eq!(f.playback.seeks().len(), 2);
        assert!(f.playback.current_time() > 9.0);
    }

    #[test]
    fn closed_feeder_never_seeks() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.feeder.close();
        f.playback
            .set(Some(10.0), 2.0, MediaReadyState::HaveFutureData);
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::Ignored);
        assert!(f.playback.seeks().is_empty());
    }

    #[test]
    fn attach_failure_requests_resync() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.decoder.fail_next_attach();
        f.feeder.on_new_video().unwrap();
        f.feeder.on_chunk(chunk(1));
        f.feeder.on_chunk(chunk(2));
        assert_eq!(f.feeder.pending_len(), 2);

        assert_eq!(f.drain_events(), vec![FeedOutcome::ResyncRequested]);
        assert_eq!(f.feeder.state(), StreamState::Restarting);
        assert_eq!(f.feeder.pending_len(), 0);
        assert_eq!(f.decoder.live_sessions(), 0);

        assert_eq!(f.feeder.on_chunk(chunk(3)), FeedOutcome::Ignored);
        assert_eq!(f.feeder.pending_len(), 0);

        f.open_stream();
        f.feeder.on_chunk(chunk(4));
        assert_eq!(f.decoder.appended(), vec![chunk(4)]);
    }

    #[test]
    fn failed_trim_keeps_chunk_queued() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.decoder.set_buffered(Some(TimeRange {
            start: 0.0,
            end: 30.0,
        }));

        f.decoder.fail_next_remove();
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::Continue);
        assert_eq!(f.feeder.state(), StreamState::Streaming);
        assert!(f.decoder.removed().is_empty());
        assert_eq!(f.feeder.pending_len(), 1);

        f.feeder.on_chunk(chunk(2));
        assert_eq!(f.decoder.removed(), vec![(0.0, 20.0)]);
        assert_eq!(f.feeder.pending_len(), 2);
    }

    #[test]
    fn close_releases_session() {
        let mut f = fixture(MockDecoderFactory::synchronous());
        f.open_stream();
        f.feeder.close();
        assert_eq!(f.feeder.state(), StreamState::Closed);
        assert_eq!(f.feeder.on_chunk(chunk(1)), FeedOutcome::Ignored);
        f.feeder.on_new_video().unwrap();
        assert_eq!(f.feeder.state(), StreamState::Closed);
        assert_eq!(f.decoder.live_sessions(), 0);

        f.feeder.on_connection_open();
        assert_eq!(f.feeder.state(), StreamState::Uninitialized);
    }
}
