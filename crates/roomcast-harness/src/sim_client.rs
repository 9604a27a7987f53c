//! Simulated chat client speaking the relay's framing over turmoil TCP.

use std::{io, time::Duration};

use roomcast_proto::{
    Payload,
    payloads::{ChatMessage, JoinRoom, Message, RoomUsers},
};
use roomcast_server::{read_frame, write_frame};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use turmoil::net::TcpStream;

/// A client connection to a [`crate::SimServer`].
pub struct SimClient {
    reader: ReadHalf<TcpStream>,
    writer: WriteHalf<TcpStream>,
}

impl SimClient {
    /// Connect to a simulated server, e.g. `"server:3000"`.
    pub async fn connect(address: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (reader, writer) = tokio::io::split(stream);
        Ok(Self { reader, writer })
    }

    /// Send any payload, including ones the relay should reject.
    pub async fn send(&mut self, payload: Payload) -> io::Result<()> {
        let frame =
            payload.into_frame().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_frame(&mut self.writer, &frame).await.map_err(io::Error::other)
    }

    /// Send raw bytes without framing checks.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    /// Join `room` as `username`.
    pub async fn join(&mut self, username: &str, room: &str) -> io::Result<()> {
        self.send(Payload::JoinRoom(JoinRoom {
            username: username.to_string(),
            room: room.to_string(),
        }))
        .await
    }

    /// Send a chat line to the joined room.
    pub async fn chat(&mut self, text: &str) -> io::Result<()> {
        self.send(Payload::ChatMessage(ChatMessage { text: text.to_string() })).await
    }

    /// Wait for the next payload from the relay.
    pub async fn recv(&mut self) -> io::Result<Payload> {
        let frame = read_frame(&mut self.reader)
            .await
            .map_err(io::Error::other)?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "server closed"))?;

        Payload::from_frame(&frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Wait up to `timeout` for the next payload. `Ok(None)` if nothing came.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> io::Result<Option<Payload>> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(payload) => payload.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Next payload, which must be a chat line or notice.
    pub async fn recv_message(&mut self) -> io::Result<Message> {
        match self.recv().await? {
            Payload::Message(message) => Ok(message),
            other => Err(unexpected("message", &other)),
        }
    }

    /// Next payload, which must be a roster.
    pub async fn recv_roster(&mut self) -> io::Result<RoomUsers> {
        match self.recv().await? {
            Payload::RoomUsers(roster) => Ok(roster),
            other => Err(unexpected("roomUsers", &other)),
        }
    }

    /// Half-close the connection so the relay sees it end.
    pub async fn close(mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

fn unexpected(wanted: &str, got: &Payload) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("expected {wanted}, got {}", got.opcode().event_name()),
    )
}
