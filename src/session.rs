//! Bilateral choke/interest state.
//!
//! Each side of a connection carries two flags: whether it chokes the
//! other, and whether it is interested in the other's pieces. Both sides
//! start choked and uninterested. The four control messages each toggle
//! exactly one flag: sent messages move the client's flags, received
//! messages move the peer's.

use crate::message::Message;
use std::sync::atomic::{AtomicBool, Ordering};

/// Advisory number of peers a client unchokes simultaneously. Consumed by
/// choking algorithms built on top of this crate.
pub const DEFAULT_UNCHOKE_SLOTS: usize = 4;

/// Choke and interest flags for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerStatus {
    pub choking: bool,
    pub interested: bool,
}

impl Default for PeerStatus {
    fn default() -> Self {
        Self {
            choking: true,
            interested: false,
        }
    }
}

/// A snapshot of both endpoints' choke/interest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    /// Our flags: are we choking the peer, are we interested in it.
    pub client: PeerStatus,
    /// The peer's flags: is it choking us, is it interested in us.
    pub peer: PeerStatus,
}

impl SessionStatus {
    /// The peer wants data and we are not choking it.
    pub fn can_upload(&self) -> bool {
        self.peer.interested && !self.client.choking
    }

    /// We want data and the peer is not choking us.
    pub fn can_download(&self) -> bool {
        self.client.interested && !self.peer.choking
    }
}

/// Choke/interest state shared by the two halves of a channel.
///
/// The client flags are written only by the sending half and the peer
/// flags only by the receiving half, so independent atomics are enough;
/// no lock is needed. A transition is published only after the frame that
/// caused it has been fully written or read.
#[derive(Debug)]
pub struct SharedStatus {
    client_choking: AtomicBool,
    client_interested: AtomicBool,
    peer_choking: AtomicBool,
    peer_interested: AtomicBool,
}

impl SharedStatus {
    /// Both sides choked and uninterested.
    pub fn new() -> Self {
        Self {
            client_choking: AtomicBool::new(true),
            client_interested: AtomicBool::new(false),
            peer_choking: AtomicBool::new(true),
            peer_interested: AtomicBool::new(false),
        }
    }

    /// Applies the transition for a control message we sent. Other
    /// messages leave the state untouched.
    pub fn apply_sent(&self, message: &Message) {
        match message {
            Message::Choke => self.client_choking.store(true, Ordering::Release),
            Message::Unchoke => self.client_choking.store(false, Ordering::Release),
            Message::Interested => self.client_interested.store(true, Ordering::Release),
            Message::NotInterested => self.client_interested.store(false, Ordering::Release),
            _ => {}
        }
    }

    /// Applies the transition for a control message the peer sent.
    pub fn apply_received(&self, message: &Message) {
        match message {
            Message::Choke => self.peer_choking.store(true, Ordering::Release),
            Message::Unchoke => self.peer_choking.store(false, Ordering::Release),
            Message::Interested => self.peer_interested.store(true, Ordering::Release),
            Message::NotInterested => self.peer_interested.store(false, Ordering::Release),
            _ => {}
        }
    }

    /// A consistent point-in-time copy of all four flags.
    pub fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            client: PeerStatus {
                choking: self.client_choking.load(Ordering::Acquire),
                interested: self.client_interested.load(Ordering::Acquire),
            },
            peer: PeerStatus {
                choking: self.peer_choking.load(Ordering::Acquire),
                interested: self.peer_interested.load(Ordering::Acquire),
            },
        }
    }

    /// The peer wants data and we are not choking it.
    pub fn can_upload(&self) -> bool {
        self.snapshot().can_upload()
    }

    /// We want data and the peer is not choking us.
    pub fn can_download(&self) -> bool {
        self.snapshot().can_download()
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new()
    }
}
