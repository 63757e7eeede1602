//! hkp: HTTP Keyserver Protocol client and server
//!
//! Re-exports the workspace crates:
//! - [`hkp_core`]: index format, key-ID search, lookup model
//! - [`hkp_server`]: axum handler over a pluggable key store
//! - [`hkp_client`]: reqwest client with SRV host discovery
//!
//! # Example
//!
//! ```no_run
//! # async fn run<K: hkp::Keyring>(keyring: K) -> Result<(), hkp::ClientError> {
//! use hkp::{ClientConfig, HkpClient, LookupRequest};
//!
//! let client = HkpClient::new(ClientConfig::new("https://keys.openpgp.org"), keyring)?;
//! let req = LookupRequest::new("0x2C6464AF2A8E4C02");
//! for key in client.index(&req).await? {
//!     println!("{}", key.fingerprint_hex());
//! }
//! let keys = client.get(&req).await?;
//! # let _ = keys;
//! # Ok(())
//! # }
//! ```

pub use hkp_client;
pub use hkp_core;
pub use hkp_server;

pub use hkp_client::{ClientConfig, ClientError, HkpClient};
pub use hkp_core::{
    decode_index, encode_index, IndexFlags, IndexIdentity, IndexKey, KeyEntity, KeyIdSearch,
    Keyring, LookupOptions, LookupRequest,
};
pub use hkp_server::{Adder, BackendError, HkpServer, Lookuper, ServerBuilder, ServerConfig};
