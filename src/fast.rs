//! Fast extension (BEP-6) bookkeeping.
//!
//! The codec and channel already carry the five fast-extension messages;
//! this module holds the per-peer view they build up and the canonical
//! allowed-fast set construction. What to do with the hints (piece
//! selection, serving policy) is left to higher layers.

use crate::handshake::InfoHash;
use crate::message::Message;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::net::IpAddr;

/// Conventional size of the allowed-fast set (BEP-6 suggests small sets).
pub const ALLOWED_FAST_SET_SIZE: usize = 10;

/// Per-peer fast-extension state, built from observed messages.
#[derive(Debug, Clone, Default)]
pub struct FastState {
    /// Pieces the remote peer allows us to request while it chokes us.
    pub allowed_fast: HashSet<u32>,
    /// Pieces we allow the remote peer to request while choked.
    pub allowed_fast_sent: HashSet<u32>,
    /// Pieces the remote peer suggested we fetch next, in arrival order.
    pub suggested: Vec<u32>,
    /// The remote peer announced it has every piece.
    pub has_all: bool,
    /// The remote peer announced it has no pieces.
    pub has_none: bool,
}

impl FastState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a received message into this view. Non-fast messages are
    /// ignored, so every message coming off a channel can be passed in.
    pub fn observe(&mut self, message: &Message) {
        match message {
            Message::HaveAll => {
                self.has_all = true;
                self.has_none = false;
            }
            Message::HaveNone => {
                self.has_none = true;
                self.has_all = false;
            }
            Message::Suggest { piece } => {
                if !self.suggested.contains(piece) {
                    self.suggested.push(*piece);
                }
            }
            Message::AllowedFast { piece } => {
                self.allowed_fast.insert(*piece);
            }
            _ => {}
        }
    }

    /// Records an AllowedFast piece we granted to the remote peer.
    pub fn grant(&mut self, piece: u32) {
        self.allowed_fast_sent.insert(piece);
    }

    /// True if we may request this piece even while the peer chokes us.
    pub fn may_request_choked(&self, piece: u32) -> bool {
        self.allowed_fast.contains(&piece)
    }

    /// True if we should serve a request for this piece from a peer we
    /// choke.
    pub fn should_serve_choked(&self, piece: u32) -> bool {
        self.allowed_fast_sent.contains(&piece)
    }
}

/// Generates the allowed-fast set for a peer (BEP-6).
///
/// The set is a deterministic function of the peer's IP address (masked
/// to /24 for IPv4) and the torrent's info hash, so both endpoints can
/// compute it independently: SHA-1 over `masked_ip || info_hash` yields
/// five candidate piece indices per round, and the digest is re-hashed
/// until enough distinct indices have been drawn.
pub fn generate_allowed_fast_set(
    info_hash: &InfoHash,
    peer_ip: IpAddr,
    num_pieces: u32,
    set_size: usize,
) -> Vec<u32> {
    if num_pieces == 0 {
        return Vec::new();
    }
    let want = set_size.min(num_pieces as usize);

    let mut seed = [0u8; 24];
    seed[..4].copy_from_slice(&masked_ip(peer_ip));
    seed[4..].copy_from_slice(info_hash.as_bytes());

    let mut digest = Sha1::digest(seed);
    let mut set = Vec::with_capacity(want);
    let mut seen = HashSet::with_capacity(want);

    loop {
        for word in digest.chunks_exact(4) {
            let piece = u32::from_be_bytes([word[0], word[1], word[2], word[3]]) % num_pieces;
            if seen.insert(piece) {
                set.push(piece);
                if set.len() == want {
                    return set;
                }
            }
        }
        digest = Sha1::digest(digest);
    }
}

// IPv4 peers are identified by their /24 so neighbouring hosts share a
// set; IPv6 uses the leading four bytes.
fn masked_ip(ip: IpAddr) -> [u8; 4] {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            [a, b, c, 0]
        }
        IpAddr::V6(v6) => {
            let octets = v6.octets();
            [octets[0], octets[1], octets[2], octets[3]]
        }
    }
}
