//! hkp-server: HKP request handler
//!
//! Routes `GET /pks/lookup` and `POST /pks/add` onto a caller-supplied key
//! store. The store plugs in through the [`Lookuper`] and [`Adder`] traits;
//! armored key text goes through the caller's [`hkp_core::Keyring`].

pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

pub use backend::{Adder, BackendError, Lookuper};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::ServerError;
pub use routes::{create_router, LookupParams};
pub use server::{HkpServer, ServerBuilder};
pub use state::{create_shared_state, HkpState, SharedState};
