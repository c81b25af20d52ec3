//! Client orchestration: socket tasks, decoder completions and the frame
//! pacer, all funnelled into one event loop.

use glasspane_input::{InputSurface, RawKeyEvent, RawPointerEvent, RawWheelEvent};
use glasspane_protocol::{connect, socket_url, ChannelSink, Frame};
use glasspane_stream::{
    DecoderEvent, DecoderFactory, PacerTick, PlaybackElement, StreamBufferFeeder, StreamState,
};
use glasspane_types::{PointerEventType, SharedSettings, VirtualKeyProfile};
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::capabilities::PlatformCapabilities;
use crate::config::Config;
use crate::error::ClientError;
use crate::observer::ClientObserver;
use crate::session::ClientSession;
use crate::state::{ConnectionId, ConnectionState};

/// Close reason when the host ends the connection.
pub const REASON_CLOSED: &str = "Connection closed.";
/// Close reason when the socket fails.
pub const REASON_LOST: &str = "Lost connection.";

/// Events fed into the client from the user interface.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Pointer {
        event_type: PointerEventType,
        event: RawPointerEvent,
    },
    Wheel(RawWheelEvent),
    KeyDown(RawKeyEvent),
    KeyUp(RawKeyEvent),
    KeyPress,
    /// The view was hidden or shown.
    VisibilityChanged { hidden: bool },
    /// The viewport changed size.
    Resized {
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    },
    SelectCapturable(usize),
    RefreshCapturables,
    ChooseCustomInputAreas,
    RequestVirtualKeyProfiles,
    SetVirtualKeyProfiles(Vec<VirtualKeyProfile>),
    SettingsPanel { open: bool },
    /// Drop the current connection, if any, and connect again.
    Reconnect,
    Shutdown,
}

/// Snapshot of the client, published after every event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientStatus {
    pub connection: ConnectionId,
    pub state: ConnectionState,
    pub stream: StreamState,
    pub pacing: bool,
}

/// What the socket tasks report.
enum TransportEvent {
    Opened(ConnectionId, ChannelSink),
    Frame(ConnectionId, Frame),
    Closed(ConnectionId, &'static str),
}

/// The glasspane client.
pub struct Client {
    session: ClientSession<ChannelSink>,
    event_tx: mpsc::Sender<ClientEvent>,
    event_rx: mpsc::Receiver<ClientEvent>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    decoder_rx: mpsc::UnboundedReceiver<DecoderEvent>,
    status_tx: watch::Sender<ClientStatus>,
    tasks: Vec<AbortHandle>,
    next_tick: Option<Instant>,
}

impl Client {
    pub fn new(
        config: Config,
        observer: Box<dyn ClientObserver>,
        surface: Box<dyn InputSurface>,
        factory: Box<dyn DecoderFactory>,
        playback: Box<dyn PlaybackElement>,
    ) -> Self {
        let settings = SharedSettings::new(config.settings());
        let (decoder_tx, decoder_rx) = mpsc::unbounded_channel();
        let feeder = StreamBufferFeeder::new(factory, playback, Box::new(settings.clone()), decoder_tx);
        let session = ClientSession::new(config, settings, observer, surface, feeder);

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ClientStatus {
            connection: session.connection_id(),
            state: session.state(),
            stream: session.feeder().state(),
            pacing: false,
        });

        Self {
            session,
            event_tx,
            event_rx,
            transport_tx,
            transport_rx,
            decoder_rx,
            status_tx,
            tasks: Vec::new(),
            next_tick: None,
        }
    }

    /// Get a clone of the event sender for feeding events into the client.
    pub fn event_sender(&self) -> mpsc::Sender<ClientEvent> {
        self.event_tx.clone()
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<ClientStatus> {
        self.status_tx.subscribe()
    }

    /// Settings handle shared with the pipelines. Changes apply to the next
    /// event or frame.
    pub fn settings(&self) -> SharedSettings {
        self.session.settings().clone()
    }

    pub fn config(&self) -> &Config {
        self.session.config()
    }

    /// Connect and run the event loop until [`ClientEvent::Shutdown`].
    pub async fn run(&mut self, capabilities: PlatformCapabilities) -> Result<(), ClientError> {
        capabilities.check();
        self.connect();

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(ClientEvent::Shutdown) | None => {
                            info!("shutting down");
                            break;
                        }
                        Some(ClientEvent::Reconnect) => self.connect(),
                        Some(event) => {
                            if let Err(e) = self.handle_client_event(event) {
                                warn!(error = %e, "failed to handle client event");
                            }
                        }
                    }
                }
                Some(event) = self.transport_rx.recv() => {
                    if let Err(e) = self.handle_transport_event(event) {
                        warn!(error = %e, "failed to handle transport event");
                    }
                }
                Some(event) = self.decoder_rx.recv() => {
                    if let Err(e) = self.session.on_decoder_event(event) {
                        warn!(error = %e, "failed to handle decoder event");
                    }
                }
                () = sleep_until_deadline(self.next_tick) => {
                    self.next_tick = None;
                    match self.session.on_frame_tick() {
                        Ok(PacerTick::RequestFrame(delay) | PacerTick::Wait(delay)) => {
                            self.next_tick = Some(Instant::now() + delay);
                        }
                        Ok(PacerTick::Stop) => debug!("frame pacer stopped"),
                        Err(e) => warn!(error = %e, "frame request failed"),
                    }
                }
            }

            if let Some(delay) = self.session.take_scheduled_tick() {
                self.next_tick = Some(Instant::now() + delay);
            } else if self.next_tick.is_none() && self.session.pacer_running() {
                self.next_tick = Some(Instant::now());
            }
            self.publish_status();
        }

        self.abort_tasks();
        self.session.shutdown();
        self.publish_status();
        Ok(())
    }

    /// Abandon the current connection and open a new one.
    fn connect(&mut self) {
        self.abort_tasks();
        self.next_tick = None;
        let id = self.session.begin_connect();
        let connection = &self.session.config().connection;
        let url = socket_url(&connection.host, connection.port, connection.secure);
        info!(%id, url = %url, "connecting to host");

        let tx = self.transport_tx.clone();
        let handle = tokio::spawn(async move {
            let (mut sender, mut receiver) = match connect(&url).await {
                Ok(halves) => halves,
                Err(e) => {
                    warn!(%id, error = %e, "failed to connect");
                    let _ = tx.send(TransportEvent::Closed(id, REASON_LOST));
                    return;
                }
            };

            let (sink, mut outbound) = ChannelSink::new();
            if tx.send(TransportEvent::Opened(id, sink)).is_err() {
                return;
            }

            loop {
                tokio::select! {
                    text = outbound.recv() => {
                        let Some(text) = text else { break };
                        if let Err(e) = sender.send_text(text).await {
                            debug!(%id, error = %e, "write failed");
                            let _ = tx.send(TransportEvent::Closed(id, REASON_LOST));
                            break;
                        }
                    }
                    frame = receiver.recv() => {
                        match frame {
                            Ok(Some(frame)) => {
                                if tx.send(TransportEvent::Frame(id, frame)).is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {
                                let _ = tx.send(TransportEvent::Closed(id, REASON_CLOSED));
                                break;
                            }
                            Err(e) => {
                                debug!(%id, error = %e, "read failed");
                                let _ = tx.send(TransportEvent::Closed(id, REASON_LOST));
                                break;
                            }
                        }
                    }
                }
            }
            let _ = sender.close().await;
        });
        self.tasks.push(handle.abort_handle());
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) -> Result<(), ClientError> {
        match event {
            TransportEvent::Opened(id, sink) => self.session.on_open(id, sink),
            TransportEvent::Frame(id, Frame::Text(text)) => self.session.on_text(id, &text),
            TransportEvent::Frame(id, Frame::Binary(chunk)) => self.session.on_binary(id, chunk),
            TransportEvent::Closed(id, reason) => {
                self.session.on_closed(id, reason);
                Ok(())
            }
        }
    }

    fn handle_client_event(&mut self, event: ClientEvent) -> Result<(), ClientError> {
        match event {
            ClientEvent::Pointer { event_type, event } => {
                self.session.on_pointer(&event, event_type)?;
            }
            ClientEvent::Wheel(event) => {
                self.session.on_wheel(&event)?;
            }
            ClientEvent::KeyDown(event) => {
                self.session.on_keydown(&event)?;
            }
            ClientEvent::KeyUp(event) => {
                self.session.on_keyup(&event)?;
            }
            ClientEvent::KeyPress => {
                self.session.on_keypress();
            }
            ClientEvent::VisibilityChanged { hidden } => self.session.on_visibility_change(hidden)?,
            ClientEvent::Resized {
                width,
                height,
                device_pixel_ratio,
            } => self.session.on_resize(width, height, device_pixel_ratio)?,
            ClientEvent::SelectCapturable(index) => self.session.select_capturable(index)?,
            ClientEvent::RefreshCapturables => self.session.refresh_capturables()?,
            ClientEvent::ChooseCustomInputAreas => self.session.choose_custom_input_areas()?,
            ClientEvent::RequestVirtualKeyProfiles => {
                self.session.request_virtual_key_profiles()?;
            }
            ClientEvent::SetVirtualKeyProfiles(profiles) => {
                self.session.set_virtual_key_profiles(&profiles)?;
            }
            ClientEvent::SettingsPanel { open } => self.session.set_settings_panel_open(open),
            ClientEvent::Reconnect | ClientEvent::Shutdown => {}
        }
        Ok(())
    }

    fn publish_status(&self) {
        let status = ClientStatus {
            connection: self.session.connection_id(),
            state: self.session.state(),
            stream: self.session.feeder().state(),
            pacing: self.session.pacer_running(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Sleep until the deadline, or forever without one.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
