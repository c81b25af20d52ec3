//! Client core for glasspane.
//!
//! Owns the host connection: the handshake, demultiplexing of inbound
//! control messages and video chunks, input gating until the host accepts
//! the configuration, and frame pacing. [`ClientSession`] is the
//! synchronous state machine, [`Client`] drives it from socket tasks and
//! timers.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod error;
pub mod observer;
pub mod session;
pub mod setup;
pub mod state;

pub use capabilities::PlatformCapabilities;
pub use client::{Client, ClientEvent, ClientStatus};
pub use config::Config;
pub use error::ClientError;
pub use observer::{ClientObserver, LogObserver};
pub use session::ClientSession;
pub use state::{ConnectionId, ConnectionState};
