//! hkp-core: protocol engine for the HTTP Keyserver Protocol (HKP)
//!
//! This crate holds everything the client and server agree on:
//! - the machine-readable index format (`info`/`pub`/`uid` lines)
//! - the `0x` key-ID search grammar
//! - the lookup request model and its query-string tokens
//! - the key-entity/armor capability that a caller plugs in
//!
//! OpenPGP parsing and armor are not implemented here. See [`Keyring`].

mod entity;
mod error;
mod index;
mod keyid;
mod lookup;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use entity::{EntityIdentity, KeyEntity, Keyring};
pub use error::{BoxError, DecodeError, Error};
pub use index::{
    decode_index, encode_index, read_index, write_index, IndexFlags, IndexIdentity, IndexKey,
    FINGERPRINT_LEN, INDEX_VERSION,
};
pub use keyid::{fingerprint_key_id, KeyIdSearch, KEY_ID_PREFIX};
pub use lookup::{
    LookupOp, LookupOptions, LookupRequest, OPTION_MACHINE_READABLE, OPTION_NO_MODIFICATION,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Base path of the HKP HTTP API
pub const BASE_PATH: &str = "/pks";

/// Lookup endpoint (`op=get|index|vindex`)
pub const LOOKUP_PATH: &str = "/pks/lookup";

/// Key submission endpoint
pub const ADD_PATH: &str = "/pks/add";

/// Media type of armored key responses
pub const CONTENT_TYPE_KEYS: &str = "application/pgp-keys";

/// Media type of index responses
pub const CONTENT_TYPE_INDEX: &str = "text/plain";

/// Form field carrying armored key text on submission
pub const KEYTEXT_FIELD: &str = "keytext";
