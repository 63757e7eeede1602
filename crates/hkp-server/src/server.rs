//! HKP server implementation

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use hkp_core::Keyring;
use tokio::net::TcpListener;

use crate::backend::{Adder, Lookuper};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::routes::create_router;
use crate::state::{create_shared_state, HkpState, SharedState};

/// HKP server over a pluggable key store
pub struct HkpServer<K: Keyring> {
    state: SharedState<K>,
    addr: SocketAddr,
}

impl<K: Keyring> HkpServer<K> {
    pub fn new(state: HkpState<K>) -> Self {
        let addr = state.config.listen_addr;
        Self {
            state: create_shared_state(state),
            addr,
        }
    }

    /// Router serving `/pks/lookup` and `/pks/add`, for embedding in another app
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Run the server
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        tracing::info!("Starting HKP server on {}", self.addr);

        let listener = TcpListener::bind(self.addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState<K> {
        self.state.clone()
    }
}

/// Builder for HkpServer
pub struct ServerBuilder<K: Keyring> {
    keyring: K,
    config: ServerConfig,
    lookuper: Option<Arc<dyn Lookuper<K::Entity>>>,
    adder: Option<Arc<dyn Adder<K::Entity>>>,
}

impl<K: Keyring> ServerBuilder<K> {
    pub fn new(keyring: K) -> Self {
        Self {
            keyring,
            config: ServerConfig::default(),
            lookuper: None,
            adder: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.listen_addr = ([0, 0, 0, 0], port).into();
        self
    }

    pub fn lookuper(mut self, lookuper: impl Lookuper<K::Entity> + 'static) -> Self {
        self.lookuper = Some(Arc::new(lookuper));
        self
    }

    pub fn adder(mut self, adder: impl Adder<K::Entity> + 'static) -> Self {
        self.adder = Some(Arc::new(adder));
        self
    }

    pub fn build(self) -> HkpServer<K> {
        if self.lookuper.is_none() {
            tracing::warn!("No lookup backend configured, lookups will answer 501");
        }
        if self.adder.is_none() {
            tracing::debug!("No add backend configured, submissions will answer 501");
        }

        HkpServer::new(HkpState {
            keyring: self.keyring,
            lookuper: self.lookuper,
            adder: self.adder,
            config: self.config,
        })
    }
}
