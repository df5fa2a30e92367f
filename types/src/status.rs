//! Connection status and its transition edges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the connection to the intelligence backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ConnectionStatus,
    pub to: ConnectionStatus,
}

impl ConnectionStatus {
    /// Whether `self -> next` is an edge of the status machine.
    ///
    /// `Error` is reachable from anywhere. Re-announcing the current state is
    /// allowed; observers are notified on every explicit change, repeated or not.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next || next == Self::Error {
            return true;
        }
        matches!(
            (self, next),
            (Self::Disconnected | Self::Error, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connected | Self::Error, Self::Disconnected)
        )
    }

    /// Validate a transition, returning the target state on success.
    pub fn transition(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
