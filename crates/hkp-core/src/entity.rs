//! External OpenPGP capability consumed by the protocol engine
//!
//! Key parsing, armor and signature inspection live outside this crate. A
//! caller plugs in an implementation of [`Keyring`] (for example one backed by
//! an OpenPGP library) and the client and server move its entities over HKP.

use chrono::{DateTime, Utc};

use crate::error::BoxError;

/// A user identity of a key entity, as seen through its self-signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdentity {
    pub name: String,
    /// Self-signature creation time
    pub created: Option<DateTime<Utc>>,
    /// Key expiration carried by the self-signature
    pub expires: Option<DateTime<Utc>>,
    /// Whether the self-signature marks this as the primary user ID
    pub primary: bool,
}

/// Read access to a parsed public key
pub trait KeyEntity {
    /// Primary-key fingerprint
    fn fingerprint(&self) -> [u8; 20];

    /// Primary-key creation time
    fn created(&self) -> DateTime<Utc>;

    /// Public-key algorithm identifier
    fn algorithm(&self) -> u8;

    /// Primary-key size in bits
    fn bit_length(&self) -> Result<u32, BoxError>;

    /// User identities in key order
    fn identities(&self) -> Vec<EntityIdentity>;
}

/// Armored key-ring reader/writer
pub trait Keyring: Send + Sync + 'static {
    type Entity: KeyEntity + Send + Sync + 'static;

    /// Parse armored key-ring text into entities
    fn read_armored(&self, text: &str) -> Result<Vec<Self::Entity>, BoxError>;

    /// Serialize entities into a single armored block
    fn write_armored(&self, entities: &[Self::Entity]) -> Result<String, BoxError>;
}
