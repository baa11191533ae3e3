use rand::RngCore as _;
use std::fmt;

// Dash-delimited client token for generated ids (Azureus convention).
const CLIENT_TOKEN: [u8; 8] = *b"-PW0001-";

/// A 20-byte peer identifier carried in handshakes.
///
/// Peers self-assign these. The only structure this crate relies on is
/// the Azureus convention of a dash-delimited client token in the first
/// eight bytes, surfaced for diagnostics; the wire treats the id as
/// opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub [u8; 20]);

impl PeerId {
    /// Self-assigns an id: the client token followed by twelve random
    /// bytes.
    pub fn generate() -> Self {
        let mut id = [0u8; 20];
        let (token, tail) = id.split_at_mut(CLIENT_TOKEN.len());
        token.copy_from_slice(&CLIENT_TOKEN);
        rand::rng().fill_bytes(tail);
        Self(id)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The six-byte client token, if this id follows the Azureus
    /// `-XX0000-` convention.
    pub fn client_token(&self) -> Option<&str> {
        match self.0.first_chunk::<8>() {
            Some([b'-', token @ .., b'-']) => std::str::from_utf8(token).ok(),
            _ => None,
        }
    }
}

impl From<[u8; 20]> for PeerId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client_token() {
            Some(token) => write!(f, "PeerId({})", token),
            None => write!(f, "PeerId({})", self),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}
