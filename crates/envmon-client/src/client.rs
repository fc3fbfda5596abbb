//! Main client implementation and the authenticated request pipeline.
//!
//! Every authenticated call goes through [`EnvmonClient::send`]:
//!
//! 1. attach the current access token (if any) as a bearer credential
//! 2. dispatch the request unchanged
//! 3. on a 401, refresh the access token once (shared by all concurrent
//!    callers, skipped when the token already changed since the request was
//!    sent) and replay the request with the current token
//! 4. a second 401, or a failed refresh, ends the session: tokens are
//!    cleared and [`SessionEvent::Expired`] is broadcast

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::api::{
    AlertsApi, AuthApi, ReadingsApi, ReportsApi, RolesApi, SensorsApi, StationsApi, UsersApi,
    ZonesApi,
};
use crate::error::{Error, RefreshFailure, Result};
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::session::{SessionEvent, SessionStatus, SessionStore, SharedSessionStore};
use crate::types::{RefreshRequest, RefreshResponse};

/// Default API root for a local development backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

/// Default path of the token-refresh endpoint, relative to the API root.
pub const DEFAULT_REFRESH_PATH: &str = "auth/token/refresh/";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffered session events per subscriber.
const EVENT_CAPACITY: usize = 16;

/// envmon API client.
///
/// Cheap to clone; clones share the HTTP pool, the session store and the
/// pending-refresh slot.
///
/// # Example
///
/// ```no_run
/// use envmon_client::EnvmonClient;
///
/// # async fn example() -> envmon_client::Result<()> {
/// let client = EnvmonClient::builder()
///     .base_url("http://localhost:8000/api/")
///     .build()?;
///
/// client.auth().login("ana", "secret").await?;
/// let zones = client.zones().list().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EnvmonClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    refresh_url: Url,
    timeout: Duration,
    session: SharedSessionStore,
    refresh: RefreshGate,
    events: broadcast::Sender<SessionEvent>,
}

/// A logical API call, kept as data so it can be replayed after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Attach query parameters, replacing any already set.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(query)?;
        if encoded.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(&encoded));
        }
        Ok(self)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// A call in flight through the pipeline.
struct Call {
    request: ApiRequest,
    /// Set once the call has been replayed after a 401.
    retried: bool,
}

impl EnvmonClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for a local development backend with an in-memory session.
    pub fn localhost() -> Result<Self> {
        Self::builder().base_url(DEFAULT_BASE_URL).build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session store shared by this client.
    pub fn session(&self) -> &SharedSessionStore {
        &self.inner.session
    }

    /// Subscribe to session events.
    ///
    /// [`SessionEvent::Expired`] means the user must log in again.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Number of token refreshes this client has started.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh.started()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the zones API.
    pub fn zones(&self) -> ZonesApi {
        ZonesApi::new(self.clone())
    }

    /// Access the stations API.
    pub fn stations(&self) -> StationsApi {
        StationsApi::new(self.clone())
    }

    /// Access the sensors API.
    pub fn sensors(&self) -> SensorsApi {
        SensorsApi::new(self.clone())
    }

    /// Access the readings API.
    pub fn readings(&self) -> ReadingsApi {
        ReadingsApi::new(self.clone())
    }

    /// Access the alerts API.
    pub fn alerts(&self) -> AlertsApi {
        AlertsApi::new(self.clone())
    }

    /// Access the reports API.
    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.clone())
    }

    /// Access the users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    /// Access the roles API.
    pub fn roles(&self) -> RolesApi {
        RolesApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    ///
    /// Paths are relative to the base URL and always end with a slash.
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        if path.ends_with('/') {
            Ok(self.inner.base_url.join(path)?)
        } else {
            Ok(self.inner.base_url.join(&format!("{}/", path))?)
        }
    }

    /// Start describing a call to `path`.
    pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest> {
        Ok(ApiRequest {
            method,
            url: self.url(path)?,
            body: None,
        })
    }

    /// Send an authenticated call through the refresh/retry protocol.
    ///
    /// Returns the successful response. Error statuses come back as
    /// [`Error::Client`] / [`Error::Server`]; an unrecoverable 401 comes back
    /// as [`Error::SessionExpired`] after the session has been cleared.
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response> {
        let mut call = Call {
            request,
            retried: false,
        };

        loop {
            let sent_with = self.inner.session.access_token();
            let response = self.dispatch(&call.request, sent_with.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return check_status(response).await;
            }

            if call.retried {
                tracing::warn!(
                    method = %call.request.method,
                    url = %call.request.url,
                    "Request rejected again after token refresh"
                );
                return Err(self.expire_session(None));
            }
            call.retried = true;

            let refreshed = self
                .inner
                .refresh
                .refresh(&self.inner.session, sent_with.as_deref(), || {
                    self.refresh_task()
                })
                .await;
            if let Err(failure) = refreshed {
                return Err(Error::SessionExpired {
                    cause: Some(failure),
                });
            }
        }
    }

    /// Send a call without credentials and outside the refresh protocol.
    ///
    /// Used for login, registration and password recovery, where a 401 means
    /// the request itself was rejected.
    pub async fn send_public(&self, request: ApiRequest) -> Result<reqwest::Response> {
        let response = self.dispatch(&request, None).await?;
        check_status(response).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            authenticated = access_token.is_some(),
            "Dispatching request"
        );

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), request.url.clone())
            .timeout(self.inner.timeout);

        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Clear the session, tell subscribers, and produce the caller's error.
    fn expire_session(&self, cause: Option<RefreshFailure>) -> Error {
        let session = &self.inner.session;
        if session.status() != SessionStatus::Unauthenticated {
            session.clear();
            let _ = self.inner.events.send(SessionEvent::Expired);
        }
        Error::SessionExpired { cause }
    }

    /// The refresh operation, detached from the calling request.
    fn refresh_task(&self) -> impl Future<Output = RefreshOutcome> + Send + 'static {
        let http = self.inner.http.clone();
        let url = self.inner.refresh_url.clone();
        let timeout = self.inner.timeout;
        let session = self.inner.session.clone();
        let events = self.inner.events.clone();

        async move {
            let outcome = exchange_refresh_token(&http, url, timeout, &session).await;
            match &outcome {
                Ok(()) => {
                    tracing::info!("Access token refreshed");
                    let _ = events.send(SessionEvent::Refreshed);
                }
                Err(failure) => {
                    tracing::warn!("Token refresh failed, ending session: {}", failure);
                    session.clear();
                    let _ = events.send(SessionEvent::Expired);
                }
            }
            outcome
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Make a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        decode(self.send(request).await?).await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path)?.query(query)?;
        decode(self.send(request).await?).await
    }

    /// Make a GET request and return the raw body (file downloads).
    pub(crate) async fn get_bytes<Q>(&self, path: &str, query: &Q) -> Result<Vec<u8>>
    where
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path)?.query(query)?;
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Make a POST request.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body)?;
        decode(self.send(request).await?).await
    }

    /// Make a POST request and return the raw body (generated files).
    pub(crate) async fn post_bytes<B>(&self, path: &str, body: &B) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body)?;
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Make an unauthenticated POST request.
    pub(crate) async fn post_public<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body)?;
        decode(self.send_public(request).await?).await
    }

    /// Make a PUT request.
    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PUT, path)?.json(body)?;
        decode(self.send(request).await?).await
    }

    /// Make a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, path)?;
        self.send(request).await?;
        Ok(())
    }
}

/// Turn error statuses into errors, leaving successful responses untouched.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = error_body(response).await;
    if status.is_server_error() {
        Err(Error::Server {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(Error::Client {
            status: status.as_u16(),
            body,
        })
    }
}

/// Read the body of an error response. The status is what matters, so a
/// body that cannot be read is logged and replaced by an empty one.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(%status, "Failed to read error response body: {}", e);
            String::new()
        }
    }
}

/// Decode a JSON body. An empty body decodes as JSON `null`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        Ok(serde_json::from_slice(b"null")?)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Exchange the stored refresh token for a new access token and store it.
async fn exchange_refresh_token(
    http: &reqwest::Client,
    url: Url,
    timeout: Duration,
    session: &SessionStore,
) -> RefreshOutcome {
    let refresh = session
        .refresh_token()
        .ok_or(RefreshFailure::MissingRefreshToken)?;

    let response = http
        .post(url)
        .timeout(timeout)
        .json(&RefreshRequest { refresh })
        .send()
        .await
        .map_err(|e| RefreshFailure::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(response).await;
        return Err(RefreshFailure::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RefreshFailure::Network(e.to_string()))?;
    let tokens: RefreshResponse = serde_json::from_slice(&bytes)
        .map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))?;

    match tokens.refresh {
        Some(rotated) => session.set_tokens(tokens.access, rotated),
        None => session.set_access_token(tokens.access),
    }
    Ok(())
}

/// Builder for creating an [`EnvmonClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    refresh_path: String,
    timeout: Duration,
    user_agent: Option<String>,
    session: Option<SharedSessionStore>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            session: None,
        }
    }

    /// Set the API root URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the token-refresh endpoint path, relative to the API root.
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Set the per-request timeout (also bounds the refresh call).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use an existing session store. Defaults to an in-memory store.
    pub fn session(mut self, session: SharedSessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<EnvmonClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let refresh_url = base_url.join(self.refresh_path.trim_start_matches('/'))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("envmon-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let session = self
            .session
            .unwrap_or_else(|| Arc::new(SessionStore::in_memory()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(EnvmonClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                refresh_url,
                timeout: self.timeout,
                session,
                refresh: RefreshGate::new(),
                events,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
