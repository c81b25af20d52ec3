//! Mock decoder backend and playback element for testing.

use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::backend::{
    AppendBuffer, DecoderEvent, DecoderFactory, DecoderNotifier, DecoderSession,
    MediaReadyState, PlaybackElement, SessionReadyState, SessionToken, TimeRange,
    PREFERRED_MIME_TYPE,
};
use crate::error::StreamError;

// ---------------------------------------------------------------------------
// MockDecoderFactory
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MockDecoderState {
    asynchronous: bool,
    supported_types: Vec<String>,
    notifier: Option<DecoderNotifier>,
    token: Option<SessionToken>,
    session_state: SessionReadyState,
    sessions_created: usize,
    live_sessions: usize,
    buffer_mime_type: Option<String>,
    updating: bool,
    buffered: Option<TimeRange>,
    appended: Vec<Bytes>,
    removed: Vec<(f64, f64)>,
    aborts: usize,
    fail_next_append: bool,
    fail_next_remove: bool,
    fail_next_attach: bool,
    updating_on_failure: bool,
}

/// Mock decoder backend.
///
/// Sessions open as soon as they are created. In asynchronous mode every
/// append and remove leaves the buffer busy until the test calls
/// [`MockDecoderHandle::complete_update`].
pub struct MockDecoderFactory {
    state: Arc<Mutex<MockDecoderState>>,
}

impl MockDecoderFactory {
    fn with_mode(asynchronous: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDecoderState {
                asynchronous,
                supported_types: vec![PREFERRED_MIME_TYPE.to_string()],
                notifier: None,
                token: None,
                session_state: SessionReadyState::Closed,
                sessions_created: 0,
                live_sessions: 0,
                buffer_mime_type: None,
                updating: false,
                buffered: None,
                appended: Vec::new(),
                removed: Vec::new(),
                aborts: 0,
                fail_next_append: false,
                fail_next_remove: false,
                fail_next_attach: false,
                updating_on_failure: false,
            })),
        }
    }

    /// Appends and removes complete immediately.
    pub fn synchronous() -> Self {
        Self::with_mode(false)
    }

    /// Appends and removes complete when the test says so.
    pub fn asynchronous() -> Self {
        Self::with_mode(true)
    }

    /// Replace the set of supported MIME types.
    #[must_use]
    pub fn with_supported_types(self, types: &[&str]) -> Self {
        self.state.lock().unwrap().supported_types =
            types.iter().map(ToString::to_string).collect();
        self
    }

    /// Get a clonable handle for observing and steering the backend.
    pub fn handle(&self) -> MockDecoderHandle {
        MockDecoderHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl DecoderFactory for MockDecoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .supported_types
            .iter()
            .any(|t| t == mime_type)
    }

    fn create_session(
        &mut self,
        token: SessionToken,
        notifier: DecoderNotifier,
    ) -> Result<Box<dyn DecoderSession>, StreamError> {
        let mut state = self.state.lock().unwrap();
        state.sessions_created += 1;
        state.live_sessions += 1;
        state.token = Some(token);
        state.session_state = SessionReadyState::Open;
        state.buffer_mime_type = None;
        let _ = notifier.send(DecoderEvent::Opened(token));
        state.notifier = Some(notifier);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockDecoderState>>,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_sessions -= 1;
        }
    }
}

impl DecoderSession for MockSession {
    fn ready_state(&self) -> SessionReadyState {
        self.state.lock().unwrap().session_state
    }

    fn add_buffer(&mut self, mime_type: &str) -> Result<Box<dyn AppendBuffer>, StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_attach {
            state.fail_next_attach = false;
            return Err(StreamError::Attach(format!("{mime_type} rejected")));
        }
        state.buffer_mime_type = Some(mime_type.to_string());
        state.updating = false;
        Ok(Box::new(MockBuffer {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockBuffer {
    state: Arc<Mutex<MockDecoderState>>,
}

impl AppendBuffer for MockBuffer {
    fn is_updating(&self) -> bool {
        self.state.lock().unwrap().updating
    }

    fn buffered(&self) -> Option<TimeRange> {
        self.state.lock().unwrap().buffered
    }

    fn append(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.updating {
            return Err(StreamError::Busy);
        }
        if state.fail_next_append {
            state.fail_next_append = false;
            state.updating = state.updating_on_failure;
            return Err(StreamError::Append("decode error".to_string()));
        }
        state.appended.push(chunk);
        state.updating = state.asynchronous;
        Ok(())
    }

    fn remove(&mut self, start: f64, end: f64) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.updating {
            return Err(StreamError::Busy);
        }
        if state.fail_next_remove {
            state.fail_next_remove = false;
            return Err(StreamError::Remove("range not removable".to_string()));
        }
        state.removed.push((start, end));
        state.updating = state.asynchronous;
        Ok(())
    }

    fn abort(&mut self) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        state.aborts += 1;
        state.updating = false;
        Ok(())
    }
}

/// Clonable observer handle for `MockDecoderFactory`.
#[derive(Clone)]
pub struct MockDecoderHandle {
    state: Arc<Mutex<MockDecoderState>>,
}

impl MockDecoderHandle {
    /// Finish the in-flight append or remove and post `UpdateEnd`.
    pub fn complete_update(&self) {
        let mut state = self.state.lock().unwrap();
        state.updating = false;
        if let (Some(notifier), Some(token)) = (&state.notifier, state.token) {
            let _ = notifier.send(DecoderEvent::UpdateEnd(token));
        }
    }

    /// Post an asynchronous buffer error for the current session.
    pub fn raise_error(&self) {
        let state = self.state.lock().unwrap();
        if let (Some(notifier), Some(token)) = (&state.notifier, state.token) {
            let _ = notifier.send(DecoderEvent::Error(token));
        }
    }

    pub fn set_buffered(&self, range: Option<TimeRange>) {
        self.state.lock().unwrap().buffered = range;
    }

    pub fn set_session_state(&self, session_state: SessionReadyState) {
        self.state.lock().unwrap().session_state = session_state;
    }

    /// Make the next append fail.
    pub fn fail_next_append(&self) {
        self.state.lock().unwrap().fail_next_append = true;
    }

    /// Make the next remove fail.
    pub fn fail_next_remove(&self) {
        self.state.lock().unwrap().fail_next_remove = true;
    }

    /// Make the next buffer attach fail.
    pub fn fail_next_attach(&self) {
        self.state.lock().unwrap().fail_next_attach = true;
    }

    /// Leave the buffer busy when an append fails.
    pub fn set_updating_on_failure(&self, updating: bool) {
        self.state.lock().unwrap().updating_on_failure = updating;
    }

    /// Every successfully appended chunk, in order.
    pub fn appended(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().appended.clone()
    }

    /// Every remove request as `(start, end)`.
    pub fn removed(&self) -> Vec<(f64, f64)> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn aborts(&self) -> usize {
        self.state.lock().unwrap().aborts
    }

    pub fn sessions_created(&self) -> usize {
        self.state.lock().unwrap().sessions_created
    }

    /// Sessions created and not yet dropped.
    pub fn live_sessions(&self) -> usize {
        self.state.lock().unwrap().live_sessions
    }

    /// MIME type the current buffer was attached with.
    pub fn buffer_mime_type(&self) -> Option<String> {
        self.state.lock().unwrap().buffer_mime_type.clone()
    }
}

// ---------------------------------------------------------------------------
// MockPlayback
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MockPlaybackState {
    seekable_end: Option<f64>,
    current_time: f64,
    ready_state: MediaReadyState,
    seeks: Vec<f64>,
}

/// Mock playback element.
pub struct MockPlayback {
    state: Arc<Mutex<MockPlaybackState>>,
}

impl Default for MockPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlayback {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockPlaybackState {
                seekable_end: None,
                current_time: 0.0,
                ready_state: MediaReadyState::HaveNothing,
                seeks: Vec::new(),
            })),
        }
    }

    pub fn handle(&self) -> MockPlaybackHandle {
        MockPlaybackHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl PlaybackElement for MockPlayback {
    fn seekable_end(&self) -> Option<f64> {
        self.state.lock().unwrap().seekable_end
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.state.lock().unwrap();
        state.current_time = seconds;
        state.seeks.push(seconds);
    }

    fn ready_state(&self) -> MediaReadyState {
        self.state.lock().unwrap().ready_state
    }
}

/// Clonable observer handle for `MockPlayback`.
#[derive(Clone)]
pub struct MockPlaybackHandle {
    state: Arc<Mutex<MockPlaybackState>>,
}

impl MockPlaybackHandle {
    pub fn set(&self, seekable_end: Option<f64>, current_time: f64, ready_state: MediaReadyState) {
        let mut state = self.state.lock().unwrap();
        state.seekable_end = seekable_end;
        state.current_time = current_time;
        state.ready_state = ready_state;
    }

    pub fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    /// Every seek made, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().unwrap().seeks.clone()
    }
}
