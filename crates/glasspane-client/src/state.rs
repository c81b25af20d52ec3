//! Connection state machine.

/// State of the host connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, or the last one was closed by the user.
    Idle,
    /// Socket opening.
    Connecting,
    /// Socket open, `Config` sent, waiting for `"ConfigOk"`.
    AwaitingConfig,
    /// Handshake complete, input and frame requests flow.
    Ready,
    /// The socket failed or closed; waiting for the user to reconnect.
    Disconnected,
}

impl ConnectionState {
    /// Whether the socket is open.
    pub fn is_open(self) -> bool {
        matches!(self, Self::AwaitingConfig | Self::Ready)
    }

    /// Whether input may be forwarded to the host.
    pub fn accepts_input(self) -> bool {
        self == Self::Ready
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::AwaitingConfig => write!(f, "AwaitingConfig"),
            Self::Ready => write!(f, "Ready"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Generation of a connection. Callbacks from older generations are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
