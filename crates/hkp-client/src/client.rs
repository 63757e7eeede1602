//! HKP client implementation

use reqwest::{Client, Response, StatusCode};
use url::Url;

use hkp_core::{
    decode_index, IndexKey, Keyring, LookupOp, LookupRequest, ADD_PATH, KEYTEXT_FIELD, LOOKUP_PATH,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::resolve::{HostTarget, SrvError, SrvResolver, SystemResolver, HKP_PROTO, HKP_SERVICE};

/// HKP client for one keyserver
pub struct HkpClient<K: Keyring, R: SrvResolver = SystemResolver> {
    config: ClientConfig,
    keyring: K,
    resolver: R,
    http: Client,
}

impl<K: Keyring> HkpClient<K> {
    /// Create a client resolving bare hostnames through system DNS
    pub fn new(config: ClientConfig, keyring: K) -> Result<Self> {
        let resolver = SystemResolver::new().map_err(|e| ClientError::ResolveFailed(e.to_string()))?;
        Ok(Self::with_resolver(config, keyring, resolver))
    }
}

impl<K: Keyring, R: SrvResolver> HkpClient<K, R> {
    pub fn with_resolver(config: ClientConfig, keyring: K, resolver: R) -> Self {
        Self {
            config,
            keyring,
            resolver,
            http: Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots)
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn default_scheme(&self) -> &'static str {
        if self.config.insecure {
            "http"
        } else {
            "https"
        }
    }

    /// Resolve the configured host into the keyserver base URL
    pub async fn host_url(&self) -> Result<Url> {
        let authority = match HostTarget::parse(&self.config.host) {
            HostTarget::Url(url) => {
                if !self.config.insecure && url.scheme() != "https" {
                    return Err(ClientError::InsecureScheme {
                        scheme: url.scheme().to_string(),
                    });
                }
                return Ok(url);
            }
            HostTarget::Direct(authority) => authority,
            HostTarget::Discover(host) => self.discover(host).await?,
        };

        let raw = format!("{}://{}", self.default_scheme(), authority);
        Url::parse(&raw).map_err(|e| ClientError::InvalidHost(format!("{}: {}", raw, e)))
    }

    async fn discover(&self, host: String) -> Result<String> {
        match self.resolver.lookup_srv(HKP_SERVICE, HKP_PROTO, &host).await {
            Ok(records) => match records.first() {
                Some(record) => {
                    tracing::debug!(host = %host, target = %record.target, port = record.port, "SRV record found");
                    Ok(format!("{}:{}", record.target, record.port))
                }
                None => Ok(host),
            },
            Err(SrvError::NoRecords) => {
                tracing::debug!(host = %host, "No SRV record, using host directly");
                Ok(host)
            }
            Err(SrvError::Transient(e)) => Err(ClientError::ResolveTransient(e)),
            Err(SrvError::Permanent(e)) => Err(ClientError::ResolveFailed(e)),
        }
    }

    /// Base URL with `path` appended to any path prefix it already has
    async fn url(&self, path: &str) -> Result<Url> {
        let mut url = self.host_url().await?;
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        Ok(url)
    }

    async fn lookup(&self, op: LookupOp, req: &LookupRequest) -> Result<Response> {
        let url = self.url(LOOKUP_PATH).await?;

        let options = req.options.format();
        let mut query = vec![
            ("op", op.as_str()),
            ("search", req.search.as_str()),
            ("options", options.as_str()),
        ];
        if req.exact {
            query.push(("exact", "on"));
        }
        query.push(("fingerprint", "on"));

        tracing::debug!(url = %url, op = %op, search = %req.search, "HKP lookup");
        let resp = self.http.get(url).query(&query).send().await?;
        Ok(resp)
    }

    /// Fetch the machine-readable index of keys matching `req`
    pub async fn index(&self, req: &LookupRequest) -> Result<Vec<IndexKey>> {
        let resp = self.lookup(LookupOp::Index, req).await?;

        if resp.status() != StatusCode::OK {
            return Err(status_error(resp).await);
        }

        let body = resp.text().await?;
        Ok(decode_index(&body)?)
    }

    /// Fetch the keys matching `req`
    pub async fn get(&self, req: &LookupRequest) -> Result<Vec<K::Entity>> {
        let resp = self.lookup(LookupOp::Get, req).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        } else if resp.status() != StatusCode::OK {
            return Err(status_error(resp).await);
        }

        let body = resp.text().await?;
        self.keyring.read_armored(&body).map_err(ClientError::Armor)
    }

    /// Submit keys as a single armored block
    pub async fn add(&self, entities: &[K::Entity]) -> Result<()> {
        let url = self.url(ADD_PATH).await?;
        let armored = self
            .keyring
            .write_armored(entities)
            .map_err(ClientError::Armor)?;

        tracing::debug!(url = %url, keys = entities.len(), "HKP add");
        let resp = self
            .http
            .post(url)
            .form(&[(KEYTEXT_FIELD, armored.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(())
    }
}

async fn status_error(resp: Response) -> ClientError {
    ClientError::Status {
        status: resp.status().as_u16(),
        message: resp.text().await.unwrap_or_default(),
    }
}
