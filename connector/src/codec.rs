//! Length-prefixed framing for envelopes on a byte stream.
//!
//! Each frame is `Content-Length: N\r\n\r\n<body>` where the body is one
//! serialized envelope. [`FrameReader`] and [`FrameWriter`] only move opaque
//! bodies; parsing them is the envelope codec's job.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::transport::TransportError;

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Reads frames from an async reader.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame body.
    ///
    /// Returns `Ok(None)` on EOF before any header byte (clean shutdown).
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            return Err(TransportError::FrameTooLarge {
                size: content_length,
                max: MAX_FRAME_BYTES,
            });
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;
        Ok(Some(body))
    }

    /// Parse headers until the empty line separator.
    async fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF is only clean between frames.
                if !saw_any_header_bytes {
                    return Ok(None);
                }
                return Err(TransportError::MalformedFrame(
                    "unexpected EOF while reading headers".to_string(),
                ));
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':')
                && key.trim().eq_ignore_ascii_case("Content-Length")
            {
                let len = value.trim().parse::<usize>().map_err(|_| {
                    TransportError::MalformedFrame(format!(
                        "invalid Content-Length value: {}",
                        value.trim()
                    ))
                })?;
                content_length = Some(len);
            }
            // Other headers are ignored.
        }

        content_length.map(Some).ok_or_else(|| {
            TransportError::MalformedFrame("missing Content-Length header".to_string())
        })
    }
}

/// Writes frames to an async writer.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one frame body with its `Content-Length` header and flush.
    pub async fn write_frame(&mut self, body: &[u8]) -> Result<(), TransportError> {
        if body.len() > MAX_FRAME_BYTES {
            return Err(TransportError::FrameTooLarge {
                size: body.len(),
                max: MAX_FRAME_BYTES,
            });
        }
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and shut down the write half.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
