//! HTTP routes for the HKP server

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, RawQuery, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use hkp_core::{
    encode_index, Keyring, LookupOp, LookupOptions, LookupRequest, ADD_PATH, CONTENT_TYPE_INDEX,
    CONTENT_TYPE_KEYS, KEYTEXT_FIELD, LOOKUP_PATH,
};

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::state::{HkpState, SharedState};

/// Query parameters of the lookup path
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LookupParams {
    pub op: Option<String>,
    pub search: Option<String>,
    pub options: Option<String>,
    pub exact: Option<String>,
    /// Always `on` from compliant clients; fingerprints are always listed
    pub fingerprint: Option<String>,
}

impl LookupParams {
    /// Parse a raw query string. A repeated key keeps its first value.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match name.as_ref() {
                "op" => &mut params.op,
                "search" => &mut params.search,
                "options" => &mut params.options,
                "exact" => &mut params.exact,
                "fingerprint" => &mut params.fingerprint,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    pub fn op(&self) -> Option<LookupOp> {
        self.op.as_deref().and_then(LookupOp::parse)
    }

    pub fn to_request(&self) -> LookupRequest {
        LookupRequest {
            search: self.search.clone().unwrap_or_default(),
            options: LookupOptions::parse(self.options.as_deref().unwrap_or_default()),
            exact: self.exact.as_deref() == Some("on"),
        }
    }
}

/// Lookup endpoint: `op=get|index|vindex`
async fn lookup<K: Keyring>(
    State(state): State<SharedState<K>>,
    RawQuery(query): RawQuery,
) -> Response {
    let start = Instant::now();
    let params = LookupParams::parse(query.as_deref().unwrap_or_default());
    let op = params.op();

    let response = serve_lookup(&state, op, &params).into_response();

    let label = op.map(|op| op.as_str()).unwrap_or(metrics::OP_UNKNOWN);
    metrics::record_request(label, response.status(), start.elapsed());
    response
}

fn serve_lookup<K: Keyring>(
    state: &HkpState<K>,
    op: Option<LookupOp>,
    params: &LookupParams,
) -> Result<Response> {
    let lookuper = state
        .lookuper
        .as_ref()
        .ok_or_else(|| ServerError::NotImplemented("lookup".into()))?;

    let req = params.to_request();
    tracing::debug!(op = ?op, search = %req.search, exact = req.exact, "Lookup");

    match op {
        Some(LookupOp::Get) => {
            let entities = lookuper.get(&req)?;
            if entities.is_empty() {
                return Err(ServerError::NotFound);
            }

            let armored = state
                .keyring
                .write_armored(&entities)
                .map_err(ServerError::Armor)?;

            Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_KEYS)], armored).into_response())
        }
        Some(LookupOp::Index) | Some(LookupOp::Vindex) => {
            let keys = lookuper.index(&req)?;
            let body = encode_index(&keys);

            Ok(([(header::CONTENT_TYPE, CONTENT_TYPE_INDEX)], body).into_response())
        }
        None => Err(ServerError::NotImplemented(format!(
            "op {:?}",
            params.op.as_deref().unwrap_or_default()
        ))),
    }
}

/// Key submission endpoint
async fn add<K: Keyring>(State(state): State<SharedState<K>>, request: Request) -> Response {
    let start = Instant::now();

    let response = serve_add(&state, request).await.into_response();

    metrics::record_request(metrics::OP_ADD, response.status(), start.elapsed());
    response
}

async fn serve_add<K: Keyring>(state: &HkpState<K>, request: Request) -> Result<StatusCode> {
    let adder = state
        .adder
        .clone()
        .ok_or_else(|| ServerError::NotImplemented("add".into()))?;

    let keytext = read_keytext(request).await?.unwrap_or_default();
    if keytext.trim().is_empty() {
        if state.config.reject_empty_add {
            return Err(ServerError::InvalidRequest(format!("missing {}", KEYTEXT_FIELD)));
        }
        tracing::debug!("Empty key submission ignored");
        return Ok(StatusCode::OK);
    }

    let entities = state
        .keyring
        .read_armored(&keytext)
        .map_err(ServerError::Armor)?;

    tracing::debug!(keys = entities.len(), "Adding keys");
    adder.add(entities)?;

    Ok(StatusCode::OK)
}

/// Extract the first `keytext` field from a urlencoded or multipart form body
async fn read_keytext(request: Request) -> Result<Option<String>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ServerError::Body(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::Body(e.body_text()))?
        {
            if field.name() == Some(KEYTEXT_FIELD) {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Body(e.body_text()))?;
                return Ok(Some(text));
            }
        }
        return Ok(None);
    }

    let body = Bytes::from_request(request, &())
        .await
        .map_err(|e| ServerError::Body(e.body_text()))?;

    Ok(url::form_urlencoded::parse(&body)
        .find(|(name, _)| name == KEYTEXT_FIELD)
        .map(|(_, value)| value.into_owned()))
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}

async fn not_implemented() -> ServerError {
    ServerError::NotImplemented("path".into())
}

/// Create the router with both HKP endpoints
pub fn create_router<K: Keyring>(state: SharedState<K>) -> Router {
    Router::new()
        .route(LOOKUP_PATH, get(lookup::<K>).fallback(method_not_allowed))
        .route(ADD_PATH, post(add::<K>).fallback(method_not_allowed))
        .fallback(not_implemented)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use hkp_core::testing::{stallman_key, TestKey, TestKeyring, STALLMAN_FINGERPRINT};
    use hkp_core::{decode_index, IndexKey, Keyring};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::{Adder, BackendError, Lookuper};
    use crate::config::ServerConfig;
    use crate::state::create_shared_state;

    #[derive(Default)]
    struct MockBackend {
        added: Mutex<Vec<TestKey>>,
        requests: Mutex<Vec<LookupRequest>>,
    }

    impl Lookuper<TestKey> for MockBackend {
        fn get(&self, req: &LookupRequest) -> std::result::Result<Vec<TestKey>, BackendError> {
            self.requests.lock().unwrap().push(req.clone());
            match req.search.as_str() {
                "stallman" => Ok(vec![stallman_key()]),
                "secret" => Err(BackendError::Forbidden),
                "broken" => Err(BackendError::other("store unavailable")),
                "missing" => Err(BackendError::NotFound),
                _ => Ok(vec![]),
            }
        }

        fn index(&self, req: &LookupRequest) -> std::result::Result<Vec<IndexKey>, BackendError> {
            self.requests.lock().unwrap().push(req.clone());
            if req.search != "stallman" {
                return Ok(vec![]);
            }
            let key = IndexKey::from_entity(&stallman_key()).map_err(BackendError::other)?;
            Ok(vec![key])
        }
    }

    impl Adder<TestKey> for MockBackend {
        fn add(&self, entities: Vec<TestKey>) -> std::result::Result<(), BackendError> {
            if entities.iter().any(|k| k.fingerprint == [0xff; 20]) {
                return Err(BackendError::Forbidden);
            }
            self.added.lock().unwrap().extend(entities);
            Ok(())
        }
    }

    fn router_with(backend: Arc<MockBackend>, config: ServerConfig) -> Router {
        let state = HkpState::new(TestKeyring, config)
            .with_lookuper(backend.clone())
            .with_adder(backend);
        create_router(create_shared_state(state))
    }

    fn router(backend: Arc<MockBackend>) -> Router {
        router_with(backend, ServerConfig::default())
    }

    async fn send(router: Router, request: Request) -> (StatusCode, Option<String>, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_post(body: String) -> Request {
        Request::builder()
            .method("POST")
            .uri(ADD_PATH)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn keytext_form(keys: &[TestKey]) -> String {
        let armored = TestKeyring.write_armored(keys).unwrap();
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(KEYTEXT_FIELD, &armored)
            .finish()
    }

    #[tokio::test]
    async fn test_get_found() {
        let backend = Arc::new(MockBackend::default());
        let (status, ct, body) =
            send(router(backend), get_req("/pks/lookup?op=get&search=stallman")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ct.as_deref(), Some(CONTENT_TYPE_KEYS));
        assert_eq!(TestKeyring.read_armored(&body).unwrap(), vec![stallman_key()]);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) =
            send(router(backend.clone()), get_req("/pks/lookup?op=get&search=nobody")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) =
            send(router(backend), get_req("/pks/lookup?op=get&search=missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_backend_errors() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) =
            send(router(backend.clone()), get_req("/pks/lookup?op=get&search=secret")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, body) =
            send(router(backend), get_req("/pks/lookup?op=get&search=broken")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("store unavailable"));
    }

    #[tokio::test]
    async fn test_index_and_vindex() {
        for op in ["index", "vindex"] {
            let backend = Arc::new(MockBackend::default());
            let uri = format!("/pks/lookup?op={}&search=stallman&fingerprint=on", op);
            let (status, ct, body) = send(router(backend), get_req(&uri)).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(ct.as_deref(), Some(CONTENT_TYPE_INDEX));
            assert!(body.starts_with("info:1:1\n"));

            let keys = decode_index(&body).unwrap();
            assert_eq!(keys[0].fingerprint_hex(), STALLMAN_FINGERPRINT);
            assert_eq!(keys[0].identities[0].name, "Richard Stallman <rms@gnu.org>");
        }
    }

    #[tokio::test]
    async fn test_index_empty() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, body) =
            send(router(backend), get_req("/pks/lookup?op=index&search=nobody")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "info:1:0\n");
    }

    #[tokio::test]
    async fn test_lookup_request_decoding() {
        let backend = Arc::new(MockBackend::default());
        let uri = "/pks/lookup?op=index&search=0x2A8E4C02&options=mr,nm&exact=on";
        send(router(backend.clone()), get_req(uri)).await;

        let uri = "/pks/lookup?op=index&search=a%20b&options=mr&exact=yes";
        send(router(backend.clone()), get_req(uri)).await;

        let requests = backend.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            LookupRequest::new("0x2A8E4C02").exact(true).no_modification(true)
        );
        assert_eq!(requests[1], LookupRequest::new("a b"));
    }

    #[test]
    fn test_params_first_value_wins() {
        let params = LookupParams::parse("op=index&search=a&search=b&options=mr&options=nm&bogus=1");
        assert_eq!(params.op(), Some(LookupOp::Index));
        assert_eq!(params.search.as_deref(), Some("a"));
        assert_eq!(params.options.as_deref(), Some("mr"));
        assert_eq!(params.exact, None);
        assert_eq!(LookupParams::parse(""), LookupParams::default());
    }

    #[tokio::test]
    async fn test_repeated_query_keys() {
        let backend = Arc::new(MockBackend::default());
        let uri = "/pks/lookup?op=index&search=stallman&search=nobody&options=mr&options=nm";
        let (status, _, body) = send(router(backend.clone()), get_req(uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode_index(&body).unwrap().len(), 1);
        assert_eq!(backend.requests.lock().unwrap()[0], LookupRequest::new("stallman"));
    }

    #[tokio::test]
    async fn test_add_malformed_multipart() {
        let backend = Arc::new(MockBackend::default());
        let request = Request::builder()
            .method("POST")
            .uri(ADD_PATH)
            .header(header::CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("keytext=x"))
            .unwrap();

        let (status, _, _) = send(router(backend.clone()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(backend.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_op() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) =
            send(router(backend.clone()), get_req("/pks/lookup?op=stats")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let (status, _, _) = send(router(backend), get_req("/pks/lookup?search=x")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_method_mismatch() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) = send(router(backend.clone()), get_req(ADD_PATH)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let post = Request::builder()
            .method("POST")
            .uri("/pks/lookup?op=get&search=stallman")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(router(backend), post).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) = send(router(backend), get_req("/pks/stats")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_missing_capabilities() {
        let state = create_shared_state(HkpState::new(TestKeyring, ServerConfig::default()));
        let (status, _, _) = send(
            create_router(state.clone()),
            get_req("/pks/lookup?op=get&search=stallman"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let (status, _, _) = send(create_router(state), form_post(keytext_form(&[stallman_key()]))).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_add_form() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) =
            send(router(backend.clone()), form_post(keytext_form(&[stallman_key()]))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*backend.added.lock().unwrap(), vec![stallman_key()]);
    }

    #[tokio::test]
    async fn test_add_multipart() {
        let backend = Arc::new(MockBackend::default());
        let armored = TestKeyring.write_armored(&[stallman_key()]).unwrap();
        let body = format!(
            "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nignored\r\n\
             --XBOUNDARY\r\nContent-Disposition: form-data; name=\"keytext\"\r\n\r\n{}\r\n\
             --XBOUNDARY--\r\n",
            armored
        );
        let request = Request::builder()
            .method("POST")
            .uri(ADD_PATH)
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let (status, _, _) = send(router(backend.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(backend.added.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) = send(router(backend.clone()), form_post(String::new())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(router(backend.clone()), form_post("keytext=".into())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(backend.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_empty_rejected_when_configured() {
        let backend = Arc::new(MockBackend::default());
        let config = ServerConfig::default().with_reject_empty_add(true);
        let (status, _, _) = send(router_with(backend, config), form_post(String::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_errors() {
        let backend = Arc::new(MockBackend::default());
        let (status, _, _) =
            send(router(backend.clone()), form_post("keytext=not-armored".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = TestKey::new([0xff; 20], 1);
        let (status, _, _) = send(router(backend.clone()), form_post(keytext_form(&[rejected]))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(backend.added.lock().unwrap().is_empty());
    }
}
