use crate::block::{Block, BlockRequest};
use crate::error::PeerError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Message type identifiers in the peer wire protocol.
///
/// Each message (except KeepAlive) has a one-byte id following the length
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    /// Stop sending data to the peer.
    Choke = 0,
    /// Ready to send data to the peer.
    Unchoke = 1,
    /// Want data from the peer.
    Interested = 2,
    /// Don't want data from the peer.
    NotInterested = 3,
    /// Announce a newly-acquired piece.
    Have = 4,
    /// Announce all available pieces.
    Bitfield = 5,
    /// Request a data block.
    Request = 6,
    /// Send piece data.
    Piece = 7,
    /// Cancel a pending request.
    Cancel = 8,
    /// DHT port announcement.
    Port = 9,
    // Fast extension (BEP-6)
    /// Suggest a piece to download.
    Suggest = 13,
    /// Peer has all pieces (seeder).
    HaveAll = 14,
    /// Peer has no pieces.
    HaveNone = 15,
    /// Reject a block request.
    Reject = 16,
    /// Allow downloading while choked.
    AllowedFast = 17,
}

impl MessageId {
    /// Returns `true` for messages introduced by the fast extension
    /// (BEP-6). Receiving one from a peer that did not negotiate the fast
    /// bit is a protocol violation.
    pub fn is_fast_extension(self) -> bool {
        matches!(
            self,
            MessageId::Suggest
                | MessageId::HaveAll
                | MessageId::HaveNone
                | MessageId::Reject
                | MessageId::AllowedFast
        )
    }
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            9 => Ok(MessageId::Port),
            13 => Ok(MessageId::Suggest),
            14 => Ok(MessageId::HaveAll),
            15 => Ok(MessageId::HaveNone),
            16 => Ok(MessageId::Reject),
            17 => Ok(MessageId::AllowedFast),
            _ => Err(PeerError::UnknownMessage(value)),
        }
    }
}

/// A peer wire protocol message.
///
/// Messages are length-prefixed: a 4-byte big-endian length followed by
/// a 1-byte message id (except KeepAlive, which has length 0) and payload.
///
/// # Examples
///
/// ```
/// use peerwire::{BlockRequest, Message};
///
/// // Request the first 16 KiB block of piece 0
/// let request = Message::Request(BlockRequest::new(0, 0, 16384));
///
/// let bytes = request.encode();
/// assert_eq!(bytes.len(), 17); // 4-byte length + 1-byte id + 12-byte body
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Empty message to keep the connection alive.
    KeepAlive,
    /// We are choking the peer (not sending data).
    Choke,
    /// We are unchoking the peer (ready to send data).
    Unchoke,
    /// We are interested in the peer's data.
    Interested,
    /// We are not interested in the peer's data.
    NotInterested,
    /// Announce that we have a piece.
    Have { piece: u32 },
    /// Packed bitfield of all pieces we have.
    Bitfield(Bytes),
    /// Request a block of data.
    Request(BlockRequest),
    /// Send piece data.
    Piece(Block),
    /// Cancel a pending request.
    Cancel(BlockRequest),
    /// DHT port announcement.
    Port(u16),
    // Fast extension
    /// Suggest a piece to download (fast extension).
    Suggest { piece: u32 },
    /// Peer has all pieces (fast extension, seeder shortcut).
    HaveAll,
    /// Peer has no pieces (fast extension).
    HaveNone,
    /// Reject a block request (fast extension).
    Reject(BlockRequest),
    /// Allow downloading this piece while choked (fast extension).
    AllowedFast { piece: u32 },
}

impl Message {
    /// The wire id of this message, or `None` for KeepAlive.
    pub fn id(&self) -> Option<MessageId> {
        match self {
            Message::KeepAlive => None,
            Message::Choke => Some(MessageId::Choke),
            Message::Unchoke => Some(MessageId::Unchoke),
            Message::Interested => Some(MessageId::Interested),
            Message::NotInterested => Some(MessageId::NotInterested),
            Message::Have { .. } => Some(MessageId::Have),
            Message::Bitfield(_) => Some(MessageId::Bitfield),
            Message::Request(_) => Some(MessageId::Request),
            Message::Piece(_) => Some(MessageId::Piece),
            Message::Cancel(_) => Some(MessageId::Cancel),
            Message::Port(_) => Some(MessageId::Port),
            Message::Suggest { .. } => Some(MessageId::Suggest),
            Message::HaveAll => Some(MessageId::HaveAll),
            Message::HaveNone => Some(MessageId::HaveNone),
            Message::Reject(_) => Some(MessageId::Reject),
            Message::AllowedFast { .. } => Some(MessageId::AllowedFast),
        }
    }

    /// Frame header for a Piece message. The transport appends the block
    /// payload as a separate buffer so the data is never copied.
    pub(crate) fn piece_header(block: &Block) -> Bytes {
        let mut buf = BytesMut::with_capacity(13);
        buf.put_u32(9 + block.data.len() as u32);
        buf.put_u8(MessageId::Piece as u8);
        buf.put_u32(block.piece);
        buf.put_u32(block.offset);
        buf.freeze()
    }

    /// Encodes the message to bytes for transmission.
    ///
    /// The output includes the 4-byte length prefix.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Message::KeepAlive => {
                buf.put_u32(0);
            }
            Message::Choke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Choke as u8);
            }
            Message::Unchoke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Unchoke as u8);
            }
            Message::Interested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Interested as u8);
            }
            Message::NotInterested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::NotInterested as u8);
            }
            Message::Have { piece } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::Have as u8);
                buf.put_u32(*piece);
            }
            Message::Bitfield(bits) => {
                buf.put_u32(1 + bits.len() as u32);
                buf.put_u8(MessageId::Bitfield as u8);
                buf.put_slice(bits);
            }
            Message::Request(req) => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Request as u8);
                buf.put_u32(req.piece);
                buf.put_u32(req.offset);
                buf.put_u32(req.length);
            }
            Message::Piece(block) => {
                buf.reserve(13 + block.data.len());
                buf.put_slice(&Self::piece_header(block));
                buf.put_slice(&block.data);
            }
            Message::Cancel(req) => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Cancel as u8);
                buf.put_u32(req.piece);
                buf.put_u32(req.offset);
                buf.put_u32(req.length);
            }
            Message::Port(port) => {
                buf.put_u32(3);
                buf.put_u8(MessageId::Port as u8);
                buf.put_u16(*port);
            }
            Message::Suggest { piece } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::Suggest as u8);
                buf.put_u32(*piece);
            }
            Message::HaveAll => {
                buf.put_u32(1);
                buf.put_u8(MessageId::HaveAll as u8);
            }
            Message::HaveNone => {
                buf.put_u32(1);
                buf.put_u8(MessageId::HaveNone as u8);
            }
            Message::Reject(req) => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Reject as u8);
                buf.put_u32(req.piece);
                buf.put_u32(req.offset);
                buf.put_u32(req.length);
            }
            Message::AllowedFast { piece } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::AllowedFast as u8);
                buf.put_u32(*piece);
            }
        }

        buf.freeze()
    }

    /// Decodes one complete frame, length prefix included.
    ///
    /// The declared length must match the body size dictated by the
    /// message id exactly; anything else is a [`PeerError::MalformedFrame`].
    pub fn decode(mut data: Bytes) -> Result<Self, PeerError> {
        if data.len() < 4 {
            return Err(PeerError::MalformedFrame("truncated length prefix"));
        }

        let length = data.get_u32() as usize;

        if length == 0 {
            return Ok(Message::KeepAlive);
        }

        if data.remaining() != length {
            return Err(PeerError::MalformedFrame("length prefix mismatch"));
        }

        let id = MessageId::try_from(data.get_u8())?;
        let body = length - 1;

        match id {
            MessageId::Choke => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("choke carries no body"));
                }
                Ok(Message::Choke)
            }
            MessageId::Unchoke => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("unchoke carries no body"));
                }
                Ok(Message::Unchoke)
            }
            MessageId::Interested => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("interested carries no body"));
                }
                Ok(Message::Interested)
            }
            MessageId::NotInterested => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("not interested carries no body"));
                }
                Ok(Message::NotInterested)
            }
            MessageId::Have => {
                if body != 4 {
                    return Err(PeerError::MalformedFrame("have body length"));
                }
                Ok(Message::Have {
                    piece: data.get_u32(),
                })
            }
            MessageId::Bitfield => Ok(Message::Bitfield(data.copy_to_bytes(body))),
            MessageId::Request => {
                if body != 12 {
                    return Err(PeerError::MalformedFrame("request body length"));
                }
                Ok(Message::Request(BlockRequest {
                    piece: data.get_u32(),
                    offset: data.get_u32(),
                    length: data.get_u32(),
                }))
            }
            MessageId::Piece => {
                if body < 8 {
                    return Err(PeerError::MalformedFrame("piece body length"));
                }
                let piece = data.get_u32();
                let offset = data.get_u32();
                Ok(Message::Piece(Block {
                    piece,
                    offset,
                    data: data.copy_to_bytes(body - 8),
                }))
            }
            MessageId::Cancel => {
                if body != 12 {
                    return Err(PeerError::MalformedFrame("cancel body length"));
                }
                Ok(Message::Cancel(BlockRequest {
                    piece: data.get_u32(),
                    offset: data.get_u32(),
                    length: data.get_u32(),
                }))
            }
            MessageId::Port => {
                if body != 2 {
                    return Err(PeerError::MalformedFrame("port body length"));
                }
                Ok(Message::Port(data.get_u16()))
            }
            MessageId::Suggest => {
                if body != 4 {
                    return Err(PeerError::MalformedFrame("suggest body length"));
                }
                Ok(Message::Suggest {
                    piece: data.get_u32(),
                })
            }
            MessageId::HaveAll => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("have all carries no body"));
                }
                Ok(Message::HaveAll)
            }
            MessageId::HaveNone => {
                if body != 0 {
                    return Err(PeerError::MalformedFrame("have none carries no body"));
                }
                Ok(Message::HaveNone)
            }
            MessageId::Reject => {
                if body != 12 {
                    return Err(PeerError::MalformedFrame("reject body length"));
                }
                Ok(Message::Reject(BlockRequest {
                    piece: data.get_u32(),
                    offset: data.get_u32(),
                    length: data.get_u32(),
                }))
            }
            MessageId::AllowedFast => {
                if body != 4 {
                    return Err(PeerError::MalformedFrame("allowed fast body length"));
                }
                Ok(Message::AllowedFast {
                    piece: data.get_u32(),
                })
            }
        }
    }
}
