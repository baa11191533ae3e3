use crate::capabilities::Capabilities;
use crate::error::PeerError;
use crate::peer_id::PeerId;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The standard protocol identifier.
pub const PROTOCOL: &[u8] = b"BitTorrent protocol";

/// Bytes following the protocol string: reserved word, info hash, peer id.
pub const HANDSHAKE_TAIL_LEN: usize = 8 + 20 + 20;

/// Length of a handshake carrying the standard protocol identifier.
pub const HANDSHAKE_LEN: usize = 1 + PROTOCOL.len() + HANDSHAKE_TAIL_LEN;

/// A torrent's 20-byte v1 info hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Converts to a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        self.0.iter().fold(String::with_capacity(40), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
            s
        })
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// The handshake message, exchanged exactly once at connection start.
///
/// Wire layout: a length byte, the protocol identifier, the eight-byte
/// reserved word carrying [`Capabilities`], the torrent's info hash, and
/// the sender's peer id. With the standard protocol identifier the whole
/// message is 68 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Protocol identifier; at most 255 bytes.
    pub protocol: Bytes,
    /// Negotiated capability flags.
    pub reserved: Capabilities,
    /// The torrent's info hash.
    pub info_hash: InfoHash,
    /// The sender's peer id.
    pub peer_id: PeerId,
}

impl Handshake {
    /// Creates a handshake with the standard protocol identifier.
    pub fn new(info_hash: InfoHash, peer_id: PeerId, reserved: Capabilities) -> Self {
        Self {
            protocol: Bytes::from_static(PROTOCOL),
            reserved,
            info_hash,
            peer_id,
        }
    }

    /// The encoded size of this handshake in bytes.
    pub fn encoded_len(&self) -> usize {
        1 + self.protocol.len() + HANDSHAKE_TAIL_LEN
    }

    /// Encodes the handshake to bytes for transmission.
    pub fn encode(&self) -> Bytes {
        debug_assert!(self.protocol.len() <= u8::MAX as usize);
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.protocol.len() as u8);
        buf.put_slice(&self.protocol);
        buf.put_u64(self.reserved.bits());
        buf.put_slice(self.info_hash.as_bytes());
        buf.put_slice(self.peer_id.as_bytes());
        buf.freeze()
    }

    /// Decodes a complete handshake. `data` must hold exactly the bytes
    /// announced by its own length byte.
    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        if data.is_empty() {
            return Err(PeerError::InvalidHandshake);
        }

        let pstrlen = data[0] as usize;
        if data.len() != 1 + pstrlen + HANDSHAKE_TAIL_LEN {
            return Err(PeerError::InvalidHandshake);
        }

        let protocol = Bytes::copy_from_slice(&data[1..1 + pstrlen]);
        let tail = &data[1 + pstrlen..];

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&tail[..8]);

        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&tail[8..28]);

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&tail[28..48]);

        Ok(Self {
            protocol,
            reserved: Capabilities::from_bits(u64::from_be_bytes(reserved)),
            info_hash: InfoHash(info_hash),
            peer_id: PeerId(peer_id),
        })
    }
}
