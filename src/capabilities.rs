use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Capability flags carried in the handshake's eight reserved bytes.
///
/// The reserved field is interpreted as a big-endian u64, so bit 0 is the
/// lowest bit of the last byte on the wire. Only the bits this crate acts
/// on are named here; the meaning of every other bit is left to external
/// extension registries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u64);

impl Capabilities {
    /// DHT support ([BEP-5]): last reserved byte, bit 0.
    ///
    /// [BEP-5]: http://bittorrent.org/beps/bep_0005.html
    pub const DHT: Capabilities = Capabilities(1);

    /// Fast extension ([BEP-6]): last reserved byte, bit 2.
    ///
    /// [BEP-6]: http://bittorrent.org/beps/bep_0006.html
    pub const FAST: Capabilities = Capabilities(1 << 2);

    /// Extension protocol ([BEP-10]): sixth reserved byte, bit 4.
    ///
    /// [BEP-10]: http://bittorrent.org/beps/bep_0010.html
    pub const EXTENSION_PROTOCOL: Capabilities = Capabilities(1 << 20);

    /// No capabilities set.
    pub const fn none() -> Self {
        Capabilities(0)
    }

    /// Creates a capability set from the raw reserved word.
    pub const fn from_bits(bits: u64) -> Self {
        Capabilities(bits)
    }

    /// The raw reserved word.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set in `self`.
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of `self` and `other`.
    #[must_use]
    pub const fn with(self, other: Capabilities) -> Self {
        Capabilities(self.0 | other.0)
    }

    /// Returns `true` if the peer supports DHT ([BEP-5]).
    ///
    /// [BEP-5]: http://bittorrent.org/beps/bep_0005.html
    pub const fn supports_dht(self) -> bool {
        self.contains(Self::DHT)
    }

    /// Returns `true` if the peer supports the fast extension ([BEP-6]).
    ///
    /// [BEP-6]: http://bittorrent.org/beps/bep_0006.html
    pub const fn supports_fast_extension(self) -> bool {
        self.contains(Self::FAST)
    }

    /// Returns `true` if the peer supports the extension protocol ([BEP-10]).
    ///
    /// [BEP-10]: http://bittorrent.org/beps/bep_0010.html
    pub const fn supports_extension_protocol(self) -> bool {
        self.contains(Self::EXTENSION_PROTOCOL)
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.with(rhs)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capabilities({:#018x})", self.0)
    }
}
