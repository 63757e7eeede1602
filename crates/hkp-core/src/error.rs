//! Error types for hkp-core

use thiserror::Error;

use crate::index::IndexKey;

/// Boxed error returned by the external key-entity/armor capability
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of index: missing info line")]
    MissingHeader,

    #[error("Failed to parse info line: {0}")]
    InvalidHeader(String),

    #[error("Unsupported index version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Failed to parse {tag} line: expected {expected} fields, got {actual}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Got uid before pub")]
    UidBeforePub,

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(#[from] hex::FromHexError),

    #[error("Invalid fingerprint size: expected 20 bytes, got {0}")]
    FingerprintLength(usize),

    #[error("Invalid {field} field: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid percent escape in uid: {0:?}")]
    InvalidEscape(String),

    #[error("Key count mismatch: info declares {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Armor error: {0}")]
    Armor(#[source] BoxError),

    #[error("Key entity error: {0}")]
    Entity(String),
}

/// Index decoding failure together with the records decoded before it
#[derive(Error, Debug)]
#[error("{source}")]
pub struct DecodeError {
    /// Records fully decoded before the failure
    pub partial: Vec<IndexKey>,
    #[source]
    pub source: Error,
}

impl DecodeError {
    pub fn new(partial: Vec<IndexKey>, source: Error) -> Self {
        Self { partial, source }
    }

    /// Borrow the underlying cause
    pub fn kind(&self) -> &Error {
        &self.source
    }

    /// Split into the partial records and the cause
    pub fn into_parts(self) -> (Vec<IndexKey>, Error) {
        (self.partial, self.source)
    }
}

impl From<Error> for DecodeError {
    fn from(source: Error) -> Self {
        Self::new(Vec::new(), source)
    }
}
