//! Pluggable key store: the server only sees these two capabilities

use std::sync::Arc;

use hkp_core::{BoxError, IndexKey, LookupRequest};
use thiserror::Error;

/// Errors a key store reports back to the protocol handler
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Other(#[from] BoxError),
}

impl BackendError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        BackendError::Other(err.into())
    }
}

/// Key lookup capability
pub trait Lookuper<E>: Send + Sync {
    /// Keys matching the request. An empty result is answered as not found.
    fn get(&self, req: &LookupRequest) -> Result<Vec<E>, BackendError>;

    /// Index records matching the request
    fn index(&self, req: &LookupRequest) -> Result<Vec<IndexKey>, BackendError>;
}

/// Key submission capability
pub trait Adder<E>: Send + Sync {
    fn add(&self, entities: Vec<E>) -> Result<(), BackendError>;
}

impl<E, T: Lookuper<E> + ?Sized> Lookuper<E> for Arc<T> {
    fn get(&self, req: &LookupRequest) -> Result<Vec<E>, BackendError> {
        (**self).get(req)
    }

    fn index(&self, req: &LookupRequest) -> Result<Vec<IndexKey>, BackendError> {
        (**self).index(req)
    }
}

impl<E, T: Adder<E> + ?Sized> Adder<E> for Arc<T> {
    fn add(&self, entities: Vec<E>) -> Result<(), BackendError> {
        (**self).add(entities)
    }
}
