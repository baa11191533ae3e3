//! The peer channel: a handshaken, duplex, typed message stream.
//!
//! A [`PeerChannel`] owns one byte stream and the choke/interest state of
//! the connection. It can be driven whole, or split into a sender and a
//! receiver so outgoing frames never wait behind incoming ones.

use crate::capabilities::Capabilities;
use crate::error::PeerError;
use crate::handshake::{Handshake, InfoHash};
use crate::message::Message;
use crate::peer_id::PeerId;
use crate::session::{SessionStatus, SharedStatus};
use crate::transport::{FrameReader, FrameWriter};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{self, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

// State shared between the two halves of a channel.
#[derive(Debug)]
struct Shared {
    status: SharedStatus,
    closed: AtomicBool,
    remote_peer_id: PeerId,
    remote_caps: Capabilities,
    // Set once any post-handshake frame has been received; a Bitfield
    // arriving after that is a protocol violation.
    saw_frame: AtomicBool,
}

impl Shared {
    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Opens a channel over an established byte stream.
///
/// Builds the local handshake from the given identity, sends it, then
/// reads and validates the peer's. Returns the remote peer id and
/// capabilities alongside the channel.
pub async fn open_channel<S: AsyncRead + AsyncWrite>(
    stream: S,
    info_hash: InfoHash,
    peer_id: PeerId,
    capabilities: Capabilities,
) -> Result<(PeerId, Capabilities, PeerChannel<S>), PeerError> {
    let (remote, channel) =
        PeerChannel::open(stream, Handshake::new(info_hash, peer_id, capabilities)).await?;
    Ok((remote.peer_id, remote.reserved, channel))
}

/// A duplex peer wire connection.
///
/// Created by [`PeerChannel::open`] or [`PeerChannel::accept`], which run
/// the handshake exactly once and install the default session state (both
/// sides choked and uninterested). Control messages flowing through
/// [`send`](PeerChannel::send) and [`recv`](PeerChannel::recv) move that
/// state; data-permission predicates are read from it at any time.
///
/// Any I/O or protocol error is fatal: the channel closes itself and every
/// later operation fails with [`PeerError::ChannelClosed`].
pub struct PeerChannel<S> {
    sender: PeerSender<S>,
    receiver: PeerReceiver<S>,
}

impl<S: AsyncRead + AsyncWrite> PeerChannel<S> {
    /// Opens an outbound connection: sends our handshake, then reads and
    /// validates the peer's.
    pub async fn open(stream: S, local: Handshake) -> Result<(Handshake, Self), PeerError> {
        let (read_half, write_half) = io::split(stream);
        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);

        writer.send_handshake(&local).await?;
        let remote = reader.receive_handshake().await?;

        Self::establish(reader, writer, &local, remote)
    }

    /// Accepts an inbound connection: reads and validates the peer's
    /// handshake, then replies with ours.
    pub async fn accept(stream: S, local: Handshake) -> Result<(Handshake, Self), PeerError> {
        let (read_half, write_half) = io::split(stream);
        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);

        let remote = reader.receive_handshake().await?;
        if remote.info_hash != local.info_hash {
            return Err(PeerError::InfoHashMismatch);
        }
        writer.send_handshake(&local).await?;

        Self::establish(reader, writer, &local, remote)
    }

    fn establish(
        reader: FrameReader<ReadHalf<S>>,
        writer: FrameWriter<WriteHalf<S>>,
        local: &Handshake,
        remote: Handshake,
    ) -> Result<(Handshake, Self), PeerError> {
        if remote.info_hash != local.info_hash {
            return Err(PeerError::InfoHashMismatch);
        }

        debug!(peer_id = %remote.peer_id, caps = ?remote.reserved, "handshake complete");

        let shared = Arc::new(Shared {
            status: SharedStatus::new(),
            closed: AtomicBool::new(false),
            remote_peer_id: remote.peer_id,
            remote_caps: remote.reserved,
            saw_frame: AtomicBool::new(false),
        });

        let channel = Self {
            sender: PeerSender {
                writer,
                shared: Arc::clone(&shared),
            },
            receiver: PeerReceiver { reader, shared },
        };
        Ok((remote, channel))
    }

    /// Encodes and writes one frame; a control message moves our side of
    /// the session state once the frame is fully written.
    pub async fn send(&mut self, message: Message) -> Result<(), PeerError> {
        self.sender.send(message).await
    }

    /// Reads one frame; a control message moves the peer's side of the
    /// session state before the message is returned.
    pub async fn recv(&mut self) -> Result<Message, PeerError> {
        self.receiver.recv().await
    }

    /// Closes the channel. Idempotent.
    pub async fn close(&mut self) -> Result<(), PeerError> {
        self.sender.close().await
    }

    /// Splits the channel into independently usable halves sharing the
    /// same session state, so reads never serialize behind writes.
    pub fn split(self) -> (PeerSender<S>, PeerReceiver<S>) {
        (self.sender, self.receiver)
    }
}

impl PeerChannel<TcpStream> {
    /// Dials a peer and performs the handshake.
    pub async fn connect(
        addr: SocketAddr,
        info_hash: InfoHash,
        peer_id: PeerId,
        capabilities: Capabilities,
    ) -> Result<(Handshake, Self), PeerError> {
        let stream = TcpStream::connect(addr).await?;
        Self::open(stream, Handshake::new(info_hash, peer_id, capabilities)).await
    }
}

impl<S> PeerChannel<S> {
    /// A snapshot of the bilateral choke/interest state.
    pub fn status(&self) -> SessionStatus {
        self.sender.shared.status.snapshot()
    }

    /// The peer wants data and we are not choking it.
    pub fn can_upload(&self) -> bool {
        self.sender.shared.status.can_upload()
    }

    /// We want data and the peer is not choking us.
    pub fn can_download(&self) -> bool {
        self.sender.shared.status.can_download()
    }

    /// The peer id announced in the remote handshake.
    pub fn remote_peer_id(&self) -> PeerId {
        self.sender.shared.remote_peer_id
    }

    /// The capabilities announced in the remote handshake.
    pub fn remote_capabilities(&self) -> Capabilities {
        self.sender.shared.remote_caps
    }

    pub fn is_closed(&self) -> bool {
        self.sender.shared.is_closed()
    }
}

/// The writing half of a [`PeerChannel`].
pub struct PeerSender<S> {
    writer: FrameWriter<WriteHalf<S>>,
    shared: Arc<Shared>,
}

impl<S: AsyncWrite> PeerSender<S> {
    /// Encodes and writes one frame; a control message moves our side of
    /// the session state once the frame is fully written.
    pub async fn send(&mut self, message: Message) -> Result<(), PeerError> {
        if self.shared.is_closed() {
            return Err(PeerError::ChannelClosed);
        }

        match self.writer.send_message(&message).await {
            Ok(()) => {
                self.shared.status.apply_sent(&message);
                Ok(())
            }
            Err(e) => {
                self.shared.close();
                Err(e)
            }
        }
    }

    /// Closes the channel. The first call shuts the write half down;
    /// repeat calls return immediately.
    pub async fn close(&mut self) -> Result<(), PeerError> {
        if self.shared.close() {
            let _ = self.writer.shutdown().await;
        }
        Ok(())
    }
}

impl<S> PeerSender<S> {
    pub fn status(&self) -> SessionStatus {
        self.shared.status.snapshot()
    }

    pub fn can_upload(&self) -> bool {
        self.shared.status.can_upload()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

/// The reading half of a [`PeerChannel`].
pub struct PeerReceiver<S> {
    reader: FrameReader<ReadHalf<S>>,
    shared: Arc<Shared>,
}

impl<S: AsyncRead> PeerReceiver<S> {
    /// Reads one frame; a control message moves the peer's side of the
    /// session state before the message is returned.
    pub async fn recv(&mut self) -> Result<Message, PeerError> {
        if self.shared.is_closed() {
            return Err(PeerError::ChannelClosed);
        }

        let message = match self.reader.receive_message().await {
            Ok(message) => message,
            Err(e) => {
                self.shared.close();
                return Err(e);
            }
        };

        if let Err(e) = self.enforce_protocol(&message) {
            debug!(error = %e, "protocol violation, closing channel");
            self.shared.close();
            return Err(e);
        }

        self.shared.status.apply_received(&message);
        Ok(message)
    }

    // Session-layer checks the codec cannot make on its own: bitfield
    // ordering, and fast-extension messages from a peer that never
    // negotiated the fast bit.
    fn enforce_protocol(&self, message: &Message) -> Result<(), PeerError> {
        let first = !self.shared.saw_frame.swap(true, Ordering::AcqRel);

        if matches!(message, Message::Bitfield(_)) && !first {
            return Err(PeerError::OutOfOrderBitfield);
        }

        if let Some(id) = message.id() {
            if id.is_fast_extension() && !self.shared.remote_caps.supports_fast_extension() {
                return Err(PeerError::UnknownMessage(id as u8));
            }
        }

        Ok(())
    }
}

impl<S> PeerReceiver<S> {
    pub fn status(&self) -> SessionStatus {
        self.shared.status.snapshot()
    }

    pub fn can_download(&self) -> bool {
        self.shared.status.can_download()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}
