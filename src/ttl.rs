use crate::{PingError, PingResult};

/// IPv4 time-to-live. Zero is never sent, so an outgoing TTL is always in 1..=255.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ttl(pub u8);

impl Ttl {
    pub const DEFAULT: Ttl = Ttl(64);

    pub fn for_sending(value: u32) -> PingResult<Self> {
        match u8::try_from(value) {
            Ok(0) | Err(_) => Err(PingError::InvalidOption { message: format!("ttl must be in 1..=255, got {value}") }),
            Ok(ttl) => Ok(Ttl(ttl)),
        }
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::DEFAULT
    }
}

impl From<u8> for Ttl {
    fn from(integer: u8) -> Self {
        Ttl(integer)
    }
}

impl From<Ttl> for u8 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
