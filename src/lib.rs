//! peerwire - The BitTorrent peer wire protocol
//!
//! This library implements the connection-level core of the BitTorrent
//! peer protocol: handshake framing, the length-prefixed message codec,
//! and the bilateral choke/interest state machine, per BEP-3 with the
//! BEP-6 fast extension messages.
//!
//! It deliberately ends where policy begins. Trackers, metainfo, storage,
//! piece selection, and choking algorithms are external collaborators;
//! this crate gives them a typed duplex message stream and a session
//! state to drive.
//!
//! # Modules
//!
//! - [`handshake`] - Fixed-layout handshake codec and info hash type
//! - [`message`] - Length-prefixed message codec for all wire messages
//! - [`channel`] - The peer channel: handshake exchange, typed send/recv,
//!   state transitions
//! - [`session`] - Choke/interest state and data-permission predicates
//! - [`block`] - Piece/block addressing and payload types
//! - [`bitfield`] - Packed piece-availability bitfields
//! - [`capabilities`] - The handshake's reserved-word capability flags
//! - [`fast`] - BEP-6 allowed-fast set and per-peer fast state
//! - [`peer_id`] - 20-byte peer identifiers
//! - [`transport`] - Buffered frame I/O over split stream halves
//! - [`error`] - The error taxonomy shared by all of the above
//!
//! # Example
//!
//! ```no_run
//! use peerwire::{open_channel, Capabilities, InfoHash, Message, PeerId};
//!
//! # async fn example() -> Result<(), peerwire::PeerError> {
//! let stream = tokio::net::TcpStream::connect("203.0.113.1:6881").await?;
//! let (peer_id, caps, mut channel) = open_channel(
//!     stream,
//!     InfoHash([0u8; 20]),
//!     PeerId::generate(),
//!     Capabilities::FAST,
//! )
//! .await?;
//! println!("connected to {peer_id} (fast: {})", caps.supports_fast_extension());
//!
//! channel.send(Message::Interested).await?;
//! while let Ok(_message) = channel.recv().await {
//!     if channel.can_download() {
//!         // request blocks
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bitfield;
pub mod block;
pub mod capabilities;
pub mod channel;
pub mod error;
pub mod fast;
pub mod handshake;
pub mod message;
pub mod peer_id;
pub mod session;
pub mod transport;

pub use bitfield::Bitfield;
pub use block::{block_count, block_length, Block, BlockRequest, DEFAULT_BLOCK_SIZE};
pub use capabilities::Capabilities;
pub use channel::{open_channel, PeerChannel, PeerReceiver, PeerSender};
pub use error::PeerError;
pub use fast::{generate_allowed_fast_set, FastState, ALLOWED_FAST_SET_SIZE};
pub use handshake::{Handshake, InfoHash, HANDSHAKE_LEN, PROTOCOL};
pub use message::{Message, MessageId};
pub use peer_id::PeerId;
pub use session::{PeerStatus, SessionStatus, SharedStatus, DEFAULT_UNCHOKE_SLOTS};
pub use transport::MAX_FRAME_SIZE;
