//! Per-connection protocol state: handshake, inbound demultiplexing, input
//! gating and stream feeding.

use std::time::{Duration, Instant};

use bytes::Bytes;
use glasspane_input::{
    Disposition, EventCanonicalizer, InputSurface, PointerDispatch, RawKeyEvent, RawPointerEvent,
    RawWheelEvent,
};
use glasspane_protocol::{decode_inbound, ChannelSink, MessageSink};
use glasspane_stream::{
    DecoderEvent, FeedOutcome, FpsCounter, FramePacer, PacerTick, StreamBufferFeeder,
};
use glasspane_types::{
    decode_profiles, encode_profiles, InboundMessage, OutboundMessage, PointerEventType,
    SettingsProvider, SharedSettings, VirtualKeyProfile,
};
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::observer::ClientObserver;
use crate::state::{ConnectionId, ConnectionState};

/// Protocol state for the lifetime of a client, reset on every connection.
///
/// Every callback carries the [`ConnectionId`] it belongs to; callbacks
/// from superseded connections are ignored.
pub struct ClientSession<S = ChannelSink> {
    config: Config,
    settings: SharedSettings,
    observer: Box<dyn ClientObserver>,
    surface: Option<Box<dyn InputSurface>>,
    canonicalizer: Option<EventCanonicalizer>,
    feeder: StreamBufferFeeder,
    pacer: FramePacer,
    scheduled_tick: Option<Duration>,
    fps: FpsCounter,
    id: ConnectionId,
    state: ConnectionState,
    sink: Option<S>,
    hidden: bool,
}

impl<S> ClientSession<S>
where
    S: MessageSink + Clone + 'static,
{
    pub fn new(
        config: Config,
        settings: SharedSettings,
        observer: Box<dyn ClientObserver>,
        surface: Box<dyn InputSurface>,
        feeder: StreamBufferFeeder,
    ) -> Self {
        Self {
            config,
            settings,
            observer,
            surface: Some(surface),
            canonicalizer: None,
            feeder,
            pacer: FramePacer::new(),
            scheduled_tick: None,
            fps: FpsCounter::new(Instant::now()),
            id: ConnectionId::default(),
            state: ConnectionState::Idle,
            sink: None,
            hidden: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn feeder(&self) -> &StreamBufferFeeder {
        &self.feeder
    }

    /// Whether frame requests should be ticking.
    pub fn pacer_running(&self) -> bool {
        self.pacer.is_running()
    }

    /// Delay until the pacer's next tick when pacing just started with an
    /// immediate frame request. Cleared by the call.
    pub fn take_scheduled_tick(&mut self) -> Option<Duration> {
        self.scheduled_tick.take()
    }

    /// Start a new connection generation. The previous connection, if any,
    /// is abandoned.
    pub fn begin_connect(&mut self) -> ConnectionId {
        self.id = self.id.next();
        self.sink = None;
        self.pacer.stop();
        self.scheduled_tick = None;
        self.feeder.close();
        self.state = ConnectionState::Connecting;
        self.observer.on_connecting(self.id);
        self.id
    }

    /// The socket opened: send the access code, ask for the capturable list
    /// and send the configuration.
    pub fn on_open(&mut self, id: ConnectionId, sink: S) -> Result<(), ClientError> {
        if id != self.id {
            debug!(%id, current = %self.id, "open from outdated connection");
            return Ok(());
        }

        match self.canonicalizer.as_mut() {
            Some(c) => c.set_sink(Box::new(sink.clone())),
            None => {
                if let Some(surface) = self.surface.take() {
                    self.canonicalizer = Some(EventCanonicalizer::new(
                        surface,
                        Box::new(sink.clone()),
                        Box::new(self.settings.clone()),
                    ));
                }
            }
        }
        self.sink = Some(sink);
        self.feeder.on_connection_open();
        self.state = ConnectionState::AwaitingConfig;

        if let Some(code) = self.config.connection.access_code.clone() {
            if !code.is_empty() {
                self.sink_mut()?.send_text(code)?;
            }
        }
        self.send(&OutboundMessage::GetCapturableList)?;
        self.send_config()?;
        self.observer.on_connected(id);
        Ok(())
    }

    /// The socket failed or closed.
    pub fn on_closed(&mut self, id: ConnectionId, reason: &str) {
        if id != self.id || self.state == ConnectionState::Disconnected {
            return;
        }
        info!(%id, reason, "connection lost");
        self.state = ConnectionState::Disconnected;
        self.sink = None;
        self.pacer.stop();
        self.feeder.close();
        self.observer.on_disconnected(reason);
    }

    /// A text frame arrived.
    pub fn on_text(&mut self, id: ConnectionId, text: &str) -> Result<(), ClientError> {
        if id != self.id || !self.state.is_open() {
            return Ok(());
        }
        match decode_inbound(text) {
            Ok(Some(msg)) => self.on_message(msg),
            Ok(None) => Ok(()),
            Err(e) => {
                warn!(error = %e, "ignoring malformed message");
                Ok(())
            }
        }
    }

    fn on_message(&mut self, msg: InboundMessage) -> Result<(), ClientError> {
        match msg {
            InboundMessage::NewVideo => {
                if let Err(e) = self.feeder.on_new_video() {
                    warn!(error = %e, "failed to start decoder session");
                }
            }
            InboundMessage::ConfigOk => {
                if self.state == ConnectionState::AwaitingConfig {
                    self.state = ConnectionState::Ready;
                }
                if self.pacer.start() {
                    info!(id = %self.id, "configuration accepted, input enabled");
                    self.observer.on_config_ok();
                    if let PacerTick::RequestFrame(delay) | PacerTick::Wait(delay) =
                        self.on_frame_tick()?
                    {
                        self.scheduled_tick = Some(delay);
                    }
                } else {
                    debug!("repeated ConfigOk");
                }
            }
            InboundMessage::CapturableList(names) => {
                self.observer.on_capturable_list(&names);
            }
            InboundMessage::Error(message) => self.observer.on_error(&message),
            InboundMessage::ConfigError(message) => self.observer.on_config_error(&message),
            InboundMessage::CustomInputAreas(areas) => {
                self.settings.update(|s| s.custom_input_areas = areas);
                self.config.input.custom_input_areas = areas;
                self.observer.on_custom_input_areas(&areas);
            }
            InboundMessage::VirtualKeysProfiles(raw) => match decode_profiles(&raw) {
                Ok(profiles) => self.observer.on_virtual_key_profiles(&profiles),
                Err(e) => warn!(error = %e, "invalid virtual key profiles"),
            },
        }
        Ok(())
    }

    /// A binary frame arrived.
    pub fn on_binary(&mut self, id: ConnectionId, chunk: Bytes) -> Result<(), ClientError> {
        if id != self.id || !self.state.is_open() {
            return Ok(());
        }
        self.fps.record_frame();
        let outcome = self.feeder.on_chunk(chunk);
        self.handle_outcome(outcome)
    }

    /// A decoder backend completion arrived.
    pub fn on_decoder_event(&mut self, event: DecoderEvent) -> Result<(), ClientError> {
        let outcome = self.feeder.handle_decoder_event(event)?;
        self.handle_outcome(outcome)
    }

    fn handle_outcome(&mut self, outcome: FeedOutcome) -> Result<(), ClientError> {
        if outcome == FeedOutcome::ResyncRequested && self.state.is_open() {
            debug!("stream broke, re-sending configuration");
            self.send_config()?;
        }
        Ok(())
    }

    /// Timer tick of the frame pacer.
    pub fn on_frame_tick(&mut self) -> Result<PacerTick, ClientError> {
        if let Some(fps) = self.fps.poll(Instant::now()) {
            self.observer.on_fps(fps);
        }
        let tick = self.pacer.tick(
            self.state.is_open(),
            self.hidden,
            self.settings.video_enabled(),
            self.settings.frame_update_interval(),
        );
        if matches!(tick, PacerTick::RequestFrame(_)) {
            self.send(&OutboundMessage::TryGetFrame)?;
        }
        Ok(tick)
    }

    pub fn on_pointer(
        &mut self,
        raw: &RawPointerEvent,
        event_type: PointerEventType,
    ) -> Result<PointerDispatch, ClientError> {
        let Some(c) = self.input() else {
            return Ok(PointerDispatch::default());
        };
        let dispatch = c.handle_pointer_event(raw, event_type)?;
        if dispatch.dismiss_settings_panel {
            self.settings.update(|s| s.settings_panel_open = false);
            self.observer.on_settings_panel_dismissed();
        }
        Ok(dispatch)
    }

    pub fn on_wheel(&mut self, raw: &RawWheelEvent) -> Result<Disposition, ClientError> {
        match self.input() {
            Some(c) => Ok(c.handle_wheel_event(raw)?),
            None => Ok(Disposition::PassThrough),
        }
    }

    pub fn on_keydown(&mut self, raw: &RawKeyEvent) -> Result<Disposition, ClientError> {
        match self.input() {
            Some(c) => Ok(c.handle_keydown(raw)?),
            None => Ok(Disposition::PassThrough),
        }
    }

    pub fn on_keyup(&mut self, raw: &RawKeyEvent) -> Result<Disposition, ClientError> {
        match self.input() {
            Some(c) => Ok(c.handle_keyup(raw)?),
            None => Ok(Disposition::PassThrough),
        }
    }

    pub fn on_keypress(&mut self) -> Disposition {
        self.input()
            .map_or(Disposition::PassThrough, |c| c.handle_keypress())
    }

    /// The view was hidden or shown again.
    pub fn on_visibility_change(&mut self, hidden: bool) -> Result<(), ClientError> {
        if self.hidden == hidden {
            return Ok(());
        }
        self.hidden = hidden;
        if self.state.accepts_input() {
            let msg = if hidden {
                OutboundMessage::PauseVideo
            } else {
                OutboundMessage::ResumeVideo
            };
            self.send(&msg)?;
        }
        Ok(())
    }

    /// The viewport changed size; ask for a matching stream resolution.
    pub fn on_resize(
        &mut self,
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    ) -> Result<(), ClientError> {
        let capture = &mut self.config.capture;
        capture.viewport_width = width;
        capture.viewport_height = height;
        capture.device_pixel_ratio = device_pixel_ratio;
        if let Some(c) = self.canonicalizer.as_mut() {
            c.invalidate_rect();
        }
        if self.state.is_open() {
            self.send_config()?;
        }
        Ok(())
    }

    /// Pick another capturable and reconfigure the host.
    pub fn select_capturable(&mut self, capturable_id: usize) -> Result<(), ClientError> {
        self.config.capture.capturable_id = capturable_id;
        if self.state.is_open() {
            self.send_config()?;
        }
        Ok(())
    }

    pub fn set_settings_panel_open(&mut self, open: bool) {
        self.settings.update(|s| s.settings_panel_open = open);
    }

    pub fn refresh_capturables(&mut self) -> Result<(), ClientError> {
        self.send(&OutboundMessage::GetCapturableList)
    }

    /// Let the user pick input areas on the host.
    pub fn choose_custom_input_areas(&mut self) -> Result<(), ClientError> {
        self.send(&OutboundMessage::ChooseCustomInputAreas)
    }

    pub fn request_virtual_key_profiles(&mut self) -> Result<(), ClientError> {
        self.send(&OutboundMessage::RequestVirtualKeysProfiles)
    }

    /// Store profiles on the host.
    pub fn set_virtual_key_profiles(
        &mut self,
        profiles: &[VirtualKeyProfile],
    ) -> Result<(), ClientError> {
        let encoded = encode_profiles(profiles)?;
        self.send(&OutboundMessage::SetVirtualKeysProfiles(encoded))
    }

    /// Send the current configuration.
    pub fn send_config(&mut self) -> Result<(), ClientError> {
        let config = self.config.client_configuration();
        debug!(
            capturable_id = config.capturable_id,
            max_width = config.max_width,
            max_height = config.max_height,
            "sending configuration"
        );
        self.send(&OutboundMessage::Config(config))
    }

    /// Drop the connection for good.
    pub fn shutdown(&mut self) {
        self.sink = None;
        self.pacer.stop();
        self.feeder.close();
        self.state = ConnectionState::Idle;
    }

    /// The canonicalizer, if input may flow.
    fn input(&mut self) -> Option<&mut EventCanonicalizer> {
        if !self.state.accepts_input() {
            trace!(state = %self.state, "dropping input before ConfigOk");
            return None;
        }
        self.canonicalizer.as_mut()
    }

    fn sink_mut(&mut self) -> Result<&mut S, ClientError> {
        self.sink.as_mut().ok_or(ClientError::NotConnected)
    }

    fn send(&mut self, msg: &OutboundMessage) -> Result<(), ClientError> {
        self.sink_mut()?.send(msg)?;
        Ok(())
    }
}
