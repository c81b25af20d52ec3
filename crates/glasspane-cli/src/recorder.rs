//! Headless decoder backend: writes every stream to disk instead of
//! decoding it.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::PathBuf;

use bytes::Bytes;
use glasspane_stream::{
    AppendBuffer, DecoderEvent, DecoderFactory, DecoderNotifier, DecoderSession,
    SessionReadyState, SessionToken, StreamError, TimeRange,
};
use tracing::{debug, info};

/// Opens one output file per stream, or discards chunks without a directory.
#[derive(Debug, Clone, Default)]
pub struct RecordingDecoderFactory {
    dir: Option<PathBuf>,
}

impl RecordingDecoderFactory {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl DecoderFactory for RecordingDecoderFactory {
    fn is_type_supported(&self, _mime_type: &str) -> bool {
        true
    }

    fn create_session(
        &mut self,
        token: SessionToken,
        notifier: DecoderNotifier,
    ) -> Result<Box<dyn DecoderSession>, StreamError> {
        let path = match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Some(dir.join(format!("{token}.mp4")))
            }
            None => None,
        };
        notifier
            .send(DecoderEvent::Opened(token))
            .map_err(|e| StreamError::SessionCreate(e.to_string()))?;
        Ok(Box::new(RecordingSession { token, path }))
    }
}

struct RecordingSession {
    token: SessionToken,
    path: Option<PathBuf>,
}

impl DecoderSession for RecordingSession {
    fn ready_state(&self) -> SessionReadyState {
        SessionReadyState::Open
    }

    fn add_buffer(&mut self, mime_type: &str) -> Result<Box<dyn AppendBuffer>, StreamError> {
        let file = match &self.path {
            Some(path) => {
                info!(token = %self.token, path = %path.display(), mime_type, "recording stream");
                Some(File::create(path).map_err(|e| StreamError::Attach(e.to_string()))?)
            }
            None => None,
        };
        Ok(Box::new(RecordingBuffer { file, written: 0 }))
    }
}

struct RecordingBuffer {
    file: Option<File>,
    written: u64,
}

impl AppendBuffer for RecordingBuffer {
    fn is_updating(&self) -> bool {
        false
    }

    /// Nothing is decoded, so nothing is ever buffered or trimmed.
    fn buffered(&self) -> Option<TimeRange> {
        None
    }

    fn append(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(&chunk)
                .map_err(|e| StreamError::Append(e.to_string()))?;
        }
        self.written += chunk.len() as u64;
        debug!(len = chunk.len(), total = self.written, "chunk recorded");
        Ok(())
    }

    /// Clearing the whole range truncates the recording. Partial trims
    /// never happen since nothing is reported as buffered.
    fn remove(&mut self, start: f64, end: f64) -> Result<(), StreamError> {
        if start > 0.0 || end.is_finite() {
            return Ok(());
        }
        if let Some(file) = self.file.as_mut() {
            file.set_len(0)
                .and_then(|()| file.rewind())
                .map_err(|e| StreamError::Remove(e.to_string()))?;
        }
        debug!(discarded = self.written, "recording cleared");
        self.written = 0;
        Ok(())
    }

    fn abort(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}
