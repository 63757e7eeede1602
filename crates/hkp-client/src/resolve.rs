//! Keyserver host resolution: absolute URL, or bare hostname with SRV discovery

use std::future::Future;

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;
use url::Url;

/// SRV service name of HKP
pub const HKP_SERVICE: &str = "hkp";

/// Transport protocol of the SRV lookup
pub const HKP_PROTO: &str = "tcp";

/// One SRV answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    /// Target hostname, without trailing dot
    pub target: String,
}

/// SRV lookup failure, classified by the resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SrvError {
    /// The name publishes no SRV records
    #[error("no SRV records")]
    NoRecords,

    /// Retryable failure (timeout, network, server failure)
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

/// SRV discovery capability
pub trait SrvResolver: Send + Sync {
    /// Look up `_<service>._<proto>.<name>`
    fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<SrvRecord>, SrvError>> + Send;
}

/// Resolver using the system DNS configuration
#[derive(Clone)]
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    /// Read the system resolver configuration once; lookups share its cache
    pub fn new() -> Result<Self, SrvError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| SrvError::Permanent(e.to_string()))?;
        Ok(Self { resolver })
    }
}

impl SrvResolver for SystemResolver {
    async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<Vec<SrvRecord>, SrvError> {
        let query = format!("_{}._{}.{}", service, proto, name);
        let lookup = self
            .resolver
            .srv_lookup(query.as_str())
            .await
            .map_err(|e| classify(&e))?;

        let mut records: Vec<SrvRecord> = lookup
            .iter()
            .map(|srv| SrvRecord {
                priority: srv.priority(),
                weight: srv.weight(),
                port: srv.port(),
                target: srv.target().to_utf8().trim_end_matches('.').to_string(),
            })
            .collect();
        // Lowest priority first; stable, so answer order breaks ties
        records.sort_by_key(|r| r.priority);
        Ok(records)
    }
}

/// Map a resolver failure onto its SRV outcome.
///
/// hickory reports every negative answer as `NoRecordsFound`; only NXDOMAIN
/// and an empty NOERROR answer mean nothing is published.
fn classify(err: &ResolveError) -> SrvError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NoError | ResponseCode::NXDomain => SrvError::NoRecords,
            ResponseCode::ServFail => SrvError::Transient(err.to_string()),
            _ => SrvError::Permanent(err.to_string()),
        },
        ResolveErrorKind::Timeout
        | ResolveErrorKind::Io(_)
        | ResolveErrorKind::Proto(_)
        | ResolveErrorKind::NoConnections => SrvError::Transient(err.to_string()),
        _ => SrvError::Permanent(err.to_string()),
    }
}

/// How a configured host string is to be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// `scheme://authority[/path]`, used as-is
    Url(Url),
    /// Hostname needing SRV discovery
    Discover(String),
    /// `host:port`; already explicit, no discovery
    Direct(String),
}

impl HostTarget {
    pub fn parse(host: &str) -> Self {
        if let Ok(url) = Url::parse(host) {
            if url.has_host() && host.contains("://") {
                return HostTarget::Url(url);
            }
        }

        match host.rsplit_once(':') {
            Some((_, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                HostTarget::Direct(host.to_string())
            }
            _ => HostTarget::Discover(host.to_string()),
        }
    }
}
