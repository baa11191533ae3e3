use thiserror::Error;

/// Errors that can occur on a peer wire connection.
///
/// Every variant except [`PeerError::ChannelClosed`] is fatal to the
/// connection it occurred on; the channel closes itself and further
/// operations fail with `ChannelClosed`.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream closed before a full handshake was received.
    #[error("stream closed during handshake")]
    HandshakeClosed,

    /// The peer sent a handshake that could not be decoded.
    #[error("invalid handshake")]
    InvalidHandshake,

    /// The peer's info hash doesn't match ours.
    #[error("info hash mismatch")]
    InfoHashMismatch,

    /// A frame whose declared length is inconsistent with its message id,
    /// or whose payload was truncated.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// A frame whose declared length exceeds the receive ceiling.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// A message id outside the protocol table, or one belonging to an
    /// extension the peer did not negotiate.
    #[error("unknown message id: {0}")]
    UnknownMessage(u8),

    /// A bitfield arrived after other frames had already been exchanged.
    #[error("bitfield received out of order")]
    OutOfOrderBitfield,

    /// The channel is closed: either explicitly, by the peer hanging up,
    /// or as the aftermath of an earlier fatal error.
    #[error("channel closed")]
    ChannelClosed,

    /// Operation timed out.
    #[error("timeout")]
    Timeout,
}
