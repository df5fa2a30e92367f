//! Client-side connector to the Sage intelligence backend.
//!
//! [`IntelligenceClient`] owns one request/reply connection, tracks its
//! [`ConnectionStatus`](sage_types::ConnectionStatus), and exposes typed
//! operations (file and project analysis, commit generation, questions,
//! similarity search) on top of a raw [`IntelligenceClient::call`].

pub mod codec;
pub mod envelope;
pub mod mappers;
pub mod protocol;
pub mod suggestions;
pub mod transport;

mod client;
mod error;
mod status;

pub use client::IntelligenceClient;
pub use error::ConnectorError;
pub use status::StatusObserver;
pub use transport::{
    DEFAULT_SERVER_URL, Dialer, Endpoint, EndpointError, FramedTransport, TcpDialer, Transport,
    TransportError, TransportFut,
};
