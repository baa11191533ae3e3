use crate::error::PeerError;
use crate::handshake::{Handshake, HANDSHAKE_TAIL_LEN};
use crate::message::Message;
use bytes::{Buf, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Receive ceiling for a single frame. Hostile length prefixes above this
/// are rejected before any payload is buffered.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

// A peer silent for two minutes is considered dead (BEP-3 guideline).
const READ_TIMEOUT: Duration = Duration::from_secs(120);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads handshakes and length-prefixed frames from the read half of a
/// peer stream.
pub struct FrameReader<R> {
    stream: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(32 * 1024),
        }
    }

    /// Fills the buffer until at least `len` bytes are available.
    async fn fill(&mut self, len: usize, on_eof: impl FnOnce() -> PeerError) -> Result<(), PeerError> {
        while self.buf.len() < len {
            let n = timeout(READ_TIMEOUT, self.stream.read_buf(&mut self.buf))
                .await
                .map_err(|_| PeerError::Timeout)??;

            if n == 0 {
                return Err(on_eof());
            }
        }
        Ok(())
    }

    /// Reads one handshake: the length byte, the protocol string it
    /// announces, and the 48-byte tail.
    pub async fn receive_handshake(&mut self) -> Result<Handshake, PeerError> {
        self.fill(1, || PeerError::HandshakeClosed).await?;
        let total = 1 + self.buf[0] as usize + HANDSHAKE_TAIL_LEN;
        self.fill(total, || PeerError::HandshakeClosed).await?;

        let data = self.buf.split_to(total);
        Handshake::decode(&data)
    }

    /// Reads and decodes one length-prefixed frame.
    pub async fn receive_message(&mut self) -> Result<Message, PeerError> {
        self.fill(4, || PeerError::ChannelClosed).await?;

        let length =
            u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;

        if length > MAX_FRAME_SIZE {
            return Err(PeerError::FrameTooLarge(length));
        }

        let total = 4 + length;
        self.fill(total, || PeerError::MalformedFrame("truncated payload"))
            .await?;

        let frame = self.buf.split_to(total);
        Message::decode(frame.freeze())
    }
}

/// Writes handshakes and frames to the write half of a peer stream.
pub struct FrameWriter<W> {
    stream: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    pub async fn send_handshake(&mut self, handshake: &Handshake) -> Result<(), PeerError> {
        let data = handshake.encode();
        timeout(WRITE_TIMEOUT, self.stream.write_all(&data))
            .await
            .map_err(|_| PeerError::Timeout)??;
        Ok(())
    }

    pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        // A Piece frame is written as header + payload so the block data
        // is not copied into the encode buffer.
        let mut buf = match message {
            Message::Piece(block) => Message::piece_header(block).chain(block.data.clone()),
            other => other.encode().chain(Bytes::new()),
        };
        timeout(WRITE_TIMEOUT, self.stream.write_all_buf(&mut buf))
            .await
            .map_err(|_| PeerError::Timeout)??;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), PeerError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
