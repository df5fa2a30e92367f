use std::error::Error as StdError;

use crate::transport::TransportError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Everything the raw dispatcher and lifecycle operations can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// `connect()` (dial or its embedded health check) failed, or the server
    /// address could not be parsed.
    #[error("cannot connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// A call was attempted without a live connection. No I/O was performed.
    #[error("not connected to the intelligence backend")]
    NotConnected,
    /// The reply was unparsable or not a `response` envelope.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// The reply answers a different request. Request/reply pairing on the
    /// connection can no longer be trusted.
    #[error("protocol violation: reply to {reply} arrived for request {request}")]
    Desync { request: String, reply: String },
    /// The backend answered with `success: false`.
    #[error("{0}")]
    Application(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ConnectorError {
    pub(crate) fn connection(endpoint: impl ToString, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            endpoint: endpoint.to_string(),
            source: source.into(),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::NotConnected => "not_connected",
            Self::Protocol(_) | Self::Desync { .. } => "protocol",
            Self::Application(_) => "application",
            Self::Transport(_) => "transport",
        }
    }

    /// Whether the connection must be dropped after this error.
    pub(crate) fn breaks_connection(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Desync { .. })
    }
}
