//! Key-identifier search terms: `0x`-prefixed short IDs, long IDs and fingerprints

use std::fmt;

/// Prefix marking a search term as a key identifier
pub const KEY_ID_PREFIX: &str = "0x";

/// A search term disambiguated by its decoded length
///
/// Only 4, 8 and 20 byte values are representable. The derived views return
/// `None` when the length does not carry enough information for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyIdSearch {
    /// 32-bit key ID
    Short([u8; 4]),
    /// 64-bit key ID
    Long([u8; 8]),
    /// Full 20-byte fingerprint
    Fingerprint([u8; 20]),
}

impl KeyIdSearch {
    /// Parse a `0x`-prefixed hex search term.
    ///
    /// Returns `None` for anything that is not a key-ID search: missing prefix,
    /// invalid hex, or a decoded length other than 4, 8 or 20 bytes. Callers
    /// fall back to free-text search in that case.
    pub fn parse(search: &str) -> Option<Self> {
        let digits = search.strip_prefix(KEY_ID_PREFIX)?;
        let bytes = hex::decode(digits).ok()?;

        match bytes.len() {
            4 => bytes.try_into().ok().map(KeyIdSearch::Short),
            8 => bytes.try_into().ok().map(KeyIdSearch::Long),
            20 => bytes.try_into().ok().map(KeyIdSearch::Fingerprint),
            _ => None,
        }
    }

    /// Raw decoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyIdSearch::Short(b) => b,
            KeyIdSearch::Long(b) => b,
            KeyIdSearch::Fingerprint(b) => b,
        }
    }

    /// Full fingerprint, only present for 20-byte searches
    pub fn fingerprint(&self) -> Option<[u8; 20]> {
        match self {
            KeyIdSearch::Fingerprint(fp) => Some(*fp),
            _ => None,
        }
    }

    /// 64-bit key ID: the whole value, or the last 8 bytes of a fingerprint
    pub fn key_id(&self) -> Option<u64> {
        match self {
            KeyIdSearch::Short(_) => None,
            KeyIdSearch::Long(b) => Some(u64::from_be_bytes(*b)),
            KeyIdSearch::Fingerprint(fp) => Some(fingerprint_key_id(fp)),
        }
    }

    /// 32-bit key ID: always the last 4 bytes
    pub fn key_id_short(&self) -> Option<u32> {
        let bytes = self.as_bytes();
        let tail: [u8; 4] = bytes[bytes.len() - 4..].try_into().ok()?;
        Some(u32::from_be_bytes(tail))
    }
}

impl fmt::Display for KeyIdSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", KEY_ID_PREFIX, hex::encode_upper(self.as_bytes()))
    }
}

/// 64-bit key ID of a fingerprint (its last 8 bytes, big-endian)
pub fn fingerprint_key_id(fingerprint: &[u8; 20]) -> u64 {
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&fingerprint[12..]);
    u64::from_be_bytes(tail)
}
