//! Handler state: the keyring capability plus the injected backend

use std::sync::Arc;

use hkp_core::Keyring;

use crate::backend::{Adder, Lookuper};
use crate::config::ServerConfig;

/// Per-server handler state. Holds no mutable data; every request is independent.
pub struct HkpState<K: Keyring> {
    pub keyring: K,
    /// `None` answers the lookup path with 501
    pub lookuper: Option<Arc<dyn Lookuper<K::Entity>>>,
    /// `None` answers the add path with 501
    pub adder: Option<Arc<dyn Adder<K::Entity>>>,
    pub config: ServerConfig,
}

impl<K: Keyring> HkpState<K> {
    pub fn new(keyring: K, config: ServerConfig) -> Self {
        Self {
            keyring,
            lookuper: None,
            adder: None,
            config,
        }
    }

    pub fn with_lookuper(mut self, lookuper: impl Lookuper<K::Entity> + 'static) -> Self {
        self.lookuper = Some(Arc::new(lookuper));
        self
    }

    pub fn with_adder(mut self, adder: impl Adder<K::Entity> + 'static) -> Self {
        self.adder = Some(Arc::new(adder));
        self
    }
}

/// Shared handler state type
pub type SharedState<K> = Arc<HkpState<K>>;

/// Wrap handler state for the router
pub fn create_shared_state<K: Keyring>(state: HkpState<K>) -> SharedState<K> {
    Arc::new(state)
}
