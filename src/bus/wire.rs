//! # Wire framing for the external broker protocol.
//!
//! Frames are a 4-byte big-endian length prefix followed by a JSON payload:
//!
//! ```text
//! ┌────────────┬──────────────────────────┐
//! │ u32 (BE)   │ JSON payload             │
//! │ byte count │ Request / Response enum  │
//! └────────────┴──────────────────────────┘
//! ```
//!
//! ## Rules
//! - Frames above [`MAX_FRAME`] are rejected on both the read and write side.
//! - One request per exchange on topic connections; subscription connections
//!   switch to a one-way `deliver` stream after the subscribe ack.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::bus::Message;
use crate::error::BusError;

/// Maximum accepted frame size in bytes.
pub(crate) const MAX_FRAME: usize = 4 * 1024 * 1024;

/// Client → broker requests.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Request {
    /// Publish one message to a remote topic.
    Publish { topic: String, message: Message },
    /// Open a delivery stream for a remote topic as part of a consumer group.
    Subscribe { topic: String, group: String },
}

/// Broker → client responses.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Response {
    /// Request accepted.
    Ok,
    /// Request rejected.
    Error { reason: String },
    /// One delivered message on a subscription stream.
    Deliver { message: Message },
}

/// Serializes a value into a frame payload.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, BusError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserializes a frame payload.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, BusError> {
    Ok(serde_json::from_slice(data)?)
}

/// Writes one length-prefixed frame.
pub(crate) async fn write_frame<W>(writer: &mut W, data: &[u8]) -> Result<(), BusError>
where
    W: AsyncWrite + Unpin,
{
    if data.len() > MAX_FRAME {
        return Err(BusError::FrameTooLarge {
            len: data.len(),
            max: MAX_FRAME,
        });
    }
    writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame payload.
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, BusError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix).await?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME {
        return Err(BusError::FrameTooLarge {
            len,
            max: MAX_FRAME,
        });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Encodes and writes one frame.
pub(crate) async fn send<W, T>(writer: &mut W, value: &T) -> Result<(), BusError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = encode(value)?;
    write_frame(writer, &data).await
}

/// Reads and decodes one frame.
pub(crate) async fn recv<R, T>(reader: &mut R) -> Result<T, BusError>
where
    R: AsyncRead + Unpin,
    T: for<'de> Deserialize<'de>,
{
    let data = read_frame(reader).await?;
    decode(&data)
}
