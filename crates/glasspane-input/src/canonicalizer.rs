//! Stateful input handler that turns raw events into wire messages.

use glasspane_protocol::MessageSink;
use glasspane_types::{
    ClientRect, KeyEventType, OutboundMessage, PointerEventType, SettingsProvider,
};
use tracing::{debug, trace};

use crate::canonical::{key_sample, pointer_sample, wheel_sample};
use crate::error::InputError;
use crate::raw::{RawKeyEvent, RawPointerEvent, RawWheelEvent, RecordedEvent};
use crate::{Disposition, InputSurface, PointerDispatch};

/// Converts raw input into canonical wire messages, sent in input order.
///
/// The surface rectangle is sampled on `pointerdown` and reused for the rest
/// of the gesture. A surface that moves mid-gesture is therefore measured
/// against its old position until the next press.
pub struct EventCanonicalizer {
    surface: Box<dyn InputSurface>,
    sink: Box<dyn MessageSink>,
    settings: Box<dyn SettingsProvider>,
    cached_rect: Option<ClientRect>,
}

impl EventCanonicalizer {
    pub fn new(
        surface: Box<dyn InputSurface>,
        sink: Box<dyn MessageSink>,
        settings: Box<dyn SettingsProvider>,
    ) -> Self {
        Self {
            surface,
            sink,
            settings,
            cached_rect: None,
        }
    }

    /// Send through a new sink, e.g. after reconnecting.
    pub fn set_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.sink = sink;
    }

    /// Handle one pointer event.
    ///
    /// Events from disabled pointer types are dropped. A `pointermove`
    /// carrying coalesced samples is expanded into one message per sample.
    pub fn handle_pointer_event(
        &mut self,
        raw: &RawPointerEvent,
        event_type: PointerEventType,
    ) -> Result<PointerDispatch, InputError> {
        if !self.settings.is_pointer_type_enabled(raw.pointer_type) {
            trace!(pointer_type = ?raw.pointer_type, %event_type, "pointer type disabled");
            return Ok(PointerDispatch::default());
        }

        let rect = if event_type == PointerEventType::PointerDown {
            self.surface.capture_pointer(raw.pointer_id);
            let rect = self.surface.bounding_rect();
            self.cached_rect = Some(rect);
            rect
        } else {
            self.rect()
        };

        let min_pressure = self.settings.min_pressure();
        let area = self.settings.custom_input_area(raw.pointer_type);

        let mut sent = 0;
        match raw.coalesced.as_deref() {
            Some(samples) if event_type == PointerEventType::PointerMove && !samples.is_empty() => {
                for sub in samples {
                    let sample = pointer_sample(sub, event_type, &rect, min_pressure, area);
                    self.sink.send(&OutboundMessage::PointerEvent(sample))?;
                    sent += 1;
                }
            }
            _ => {
                let sample = pointer_sample(raw, event_type, &rect, min_pressure, area);
                self.sink.send(&OutboundMessage::PointerEvent(sample))?;
                sent += 1;
            }
        }

        trace!(%event_type, pointer_id = raw.pointer_id, sent, "pointer event");
        Ok(PointerDispatch {
            sent,
            dismiss_settings_panel: self.settings.settings_panel_open(),
        })
    }

    /// Handle one wheel event. Native scrolling is always suppressed.
    pub fn handle_wheel_event(&mut self, raw: &RawWheelEvent) -> Result<Disposition, InputError> {
        let sample = wheel_sample(raw);
        trace!(dx = sample.dx, dy = sample.dy, "wheel event");
        self.sink.send(&OutboundMessage::WheelEvent(sample))?;
        Ok(Disposition::Suppress)
    }

    /// Handle one key event.
    ///
    /// While the settings panel is open keys belong to it and nothing is sent.
    pub fn handle_key_event(
        &mut self,
        raw: &RawKeyEvent,
        event_type: KeyEventType,
    ) -> Result<Disposition, InputError> {
        if self.settings.settings_panel_open() {
            return Ok(Disposition::PassThrough);
        }
        let sample = key_sample(raw, event_type);
        trace!(code = %sample.code, ?event_type, "key event");
        self.sink.send(&OutboundMessage::KeyboardEvent(sample))?;
        Ok(Disposition::Suppress)
    }

    /// Key press, `repeat` for auto-repeated presses.
    pub fn handle_keydown(&mut self, raw: &RawKeyEvent) -> Result<Disposition, InputError> {
        self.handle_key_event(raw, KeyEventType::from_keydown(raw.repeat))
    }

    pub fn handle_keyup(&mut self, raw: &RawKeyEvent) -> Result<Disposition, InputError> {
        self.handle_key_event(raw, KeyEventType::Up)
    }

    /// Character events carry nothing the host needs; they are only swallowed.
    pub fn handle_keypress(&self) -> Disposition {
        if self.settings.settings_panel_open() {
            Disposition::PassThrough
        } else {
            Disposition::Suppress
        }
    }

    /// Route a recorded event to the matching handler. Returns the number of
    /// wire messages sent.
    pub fn dispatch(&mut self, event: &RecordedEvent) -> Result<usize, InputError> {
        let sent = match event {
            RecordedEvent::Pointer { event_type, event } => {
                self.handle_pointer_event(event, *event_type)?.sent
            }
            RecordedEvent::Wheel { event } => {
                self.handle_wheel_event(event)?;
                1
            }
            RecordedEvent::KeyDown { event } => {
                usize::from(self.handle_keydown(event)? == Disposition::Suppress)
            }
            RecordedEvent::KeyUp { event } => {
                usize::from(self.handle_keyup(event)? == Disposition::Suppress)
            }
        };
        Ok(sent)
    }

    /// Forget the cached surface rectangle.
    pub fn invalidate_rect(&mut self) {
        self.cached_rect = None;
    }

    fn rect(&mut self) -> ClientRect {
        if let Some(rect) = self.cached_rect {
            return rect;
        }
        let rect = self.surface.bounding_rect();
        debug!(?rect, "no pointerdown seen yet, sampling surface");
        self.cached_rect = Some(rect);
        rect
    }
}
