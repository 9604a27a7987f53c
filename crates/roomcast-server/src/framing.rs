//! Reading and writing frames on byte streams.
//!
//! Frames are self-delimiting: a fixed-size header carrying the payload
//! length, then the payload. Works over any Tokio stream, so the QUIC
//! runtime and the simulated TCP runtime share it.

use std::{io::ErrorKind, time::Duration};

use roomcast_proto::{Frame, FrameHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ServerError;

/// Read the next frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends before a new header starts.
///
/// # Errors
///
/// - `ServerError::Protocol` if the header is invalid (bad magic, version,
///   or an oversized payload claim)
/// - `ServerError::Transport` if the stream fails or ends mid-frame
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, ServerError>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; FrameHeader::SIZE];
    match reader.read_exact(&mut header_buf).await {
        Ok(_) => {},
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let header = *FrameHeader::from_bytes(&header_buf)?;

    let mut payload = vec![0u8; header.payload_size() as usize];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Frame::new(header, payload)))
}

/// Encode `frame` and write it to `writer`, then flush.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.to_vec()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Write all of `bytes` to `writer` unless it stalls for longer than `limit`.
///
/// # Errors
///
/// - `ServerError::Transport` if the write fails or does not finish in time
pub async fn write_all_within<W>(
    writer: &mut W,
    bytes: &[u8],
    limit: Duration,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(limit, writer.write_all(bytes)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ServerError::Transport(format!("write stalled for {limit:?}"))),
    }
}
