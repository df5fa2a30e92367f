//! Transport socket wrapper: one request/reply channel to the backend.
//!
//! A [`Transport`] moves whole frames; it knows nothing about envelopes. A
//! [`Dialer`] opens a fresh transport for an [`Endpoint`], which keeps the
//! connector independent of the physical channel (TCP in production,
//! in-memory pipes in tests).

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use url::{Host, Url};

use crate::codec::{FrameReader, FrameWriter};

pub use sage_types::DEFAULT_SERVER_URL;

const TCP_SCHEME: &str = "tcp";

/// Transport future type alias.
pub type TransportFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("transport closed by peer")]
    Closed,
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// A bidirectional frame channel.
///
/// Callers pair every `send` with exactly one `recv`; the transport itself
/// does no multiplexing.
pub trait Transport: Send {
    fn send<'a>(&'a mut self, frame: &'a [u8]) -> TransportFut<'a, ()>;

    /// Receive the next frame. A peer that hangs up yields [`TransportError::Closed`].
    fn recv(&mut self) -> TransportFut<'_, Vec<u8>>;

    fn close(&mut self) -> TransportFut<'_, ()>;
}

/// Opens transports to an endpoint.
pub trait Dialer: Send + Sync {
    fn dial<'a>(&'a self, endpoint: &'a Endpoint) -> TransportFut<'a, Box<dyn Transport>>;
}

/// [`Transport`] over any async read/write pair using the frame codec.
pub struct FramedTransport<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl<R, W> FramedTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }
}

impl<R, W> Transport for FramedTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn send<'a>(&'a mut self, frame: &'a [u8]) -> TransportFut<'a, ()> {
        Box::pin(self.writer.write_frame(frame))
    }

    fn recv(&mut self) -> TransportFut<'_, Vec<u8>> {
        Box::pin(async move { self.reader.read_frame().await?.ok_or(TransportError::Closed) })
    }

    fn close(&mut self) -> TransportFut<'_, ()> {
        Box::pin(self.writer.shutdown())
    }
}

/// Dials `tcp://host:port` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial<'a>(&'a self, endpoint: &'a Endpoint) -> TransportFut<'a, Box<dyn Transport>> {
        Box::pin(async move {
            let stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;
            stream.set_nodelay(true)?;
            let (read_half, write_half) = stream.into_split();
            tracing::debug!(endpoint = %endpoint, "TCP transport opened");
            let transport: Box<dyn Transport> =
                Box::new(FramedTransport::new(read_half, write_half));
            Ok(transport)
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid server address: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("unsupported scheme '{0}' (expected tcp)")]
    UnsupportedScheme(String),
    #[error("server address has no host")]
    MissingHost,
    #[error("server address has no port")]
    MissingPort,
}

/// Physical address of the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse a `tcp://host:port` address.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(address.trim())?;
        if url.scheme() != TCP_SCHEME {
            return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(EndpointError::MissingHost),
        };
        let port = url.port().ok_or(EndpointError::MissingPort)?;
        Ok(Self { host, port })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5555,
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{TCP_SCHEME}://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{TCP_SCHEME}://{}:{}", self.host, self.port)
        }
    }
}
