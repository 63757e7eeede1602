//! hkp-client: HKP client
//!
//! Looks up, indexes and submits keys on an HKP keyserver. The keyserver is
//! given either as an absolute URL or as a bare hostname, in which case its
//! `_hkp._tcp` SRV record is consulted first.

pub mod client;
pub mod config;
pub mod error;
pub mod resolve;

pub use client::HkpClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use resolve::{HostTarget, SrvError, SrvRecord, SrvResolver, SystemResolver};
