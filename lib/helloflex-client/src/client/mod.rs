use std::sync::Arc;
use std::time::Duration;

use headers::{CacheControl, Connection, HeaderMapExt};
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderMap, HeaderValue, Method};
use reqwest::{Body, Request};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

mod auth;
use self::auth::{ClientCredentials, TokenResponse, bearer_header};
pub use self::auth::SecureString;

mod body;
pub use self::body::{BodyEncoding, CallBody};

mod builder;
pub use self::builder::{DEFAULT_TIMEOUT, HelloFlexClientBuilder};

mod call;
pub use self::call::ApiCall;

mod error;
pub use self::error::{CallbackError, HelloFlexError};

mod query;
pub use self::query::CallQuery;

mod token;
pub use self::token::Token;

/// Origin of the HelloFlex API.
pub const DEFAULT_BASE_URL: &str = "https://api.helloflex.com";

/// Endpoint issuing access tokens; requests to it are never authenticated.
pub const TOKEN_ENDPOINT: &str = "/oauth2/token";

/// Response header carrying the total number of items of a paginated resource.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

const BODY_MAX_LENGTH: usize = 1024;

/// Callback receiving every newly issued token, e.g. to persist it.
pub type UpdateTokenCallback = Arc<dyn Fn(&Token) -> Result<(), CallbackError> + Send + Sync>;

/// HTTP client for the HelloFlex API.
///
/// The client authenticates with the OAuth2 client-credentials grant. A token
/// is requested lazily, before the first call that needs one and whenever the
/// held token has expired. Persisting tokens is left to the caller: seed the
/// client with [`set_token`](Self::set_token) and receive new tokens through
/// [`set_update_token_callback`](Self::set_update_token_callback).
///
/// # Example
///
/// ```rust,no_run
/// use helloflex_client::{HelloFlexClient, Token};
///
/// # async fn example(stored: Option<Token>) -> Result<(), helloflex_client::HelloFlexError> {
/// let mut client = HelloFlexClient::new("client_id", "client_secret")?;
/// client.set_update_token_callback(|token: &Token| serde_json::to_string(token).map(drop));
/// if let Some(token) = stored {
///     client.set_token(token).await;
/// }
///
/// let jobs = client.get("/api/jobs").await?;
/// let total_count = client.get_total_count().await;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// Clones share the token and the total count. Token refresh is serialized:
/// concurrent calls that find no valid token trigger a single token request.
#[derive(Clone, derive_more::Debug)]
pub struct HelloFlexClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
    credentials: ClientCredentials,
    token: Arc<Mutex<Option<Token>>>,
    total_count: Arc<RwLock<Option<u64>>>,
    #[debug(ignore)]
    update_token_callback: Option<UpdateTokenCallback>,
}

// Create
impl HelloFlexClient {
    /// Creates a builder for a client with the given credentials.
    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
    ) -> HelloFlexClientBuilder {
        HelloFlexClientBuilder::new(client_id, client_secret)
    }

    /// Creates a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be created.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
    ) -> Result<Self, HelloFlexError> {
        Self::builder(client_id, client_secret).build()
    }
}

// Token
impl HelloFlexClient {
    /// Replaces the current token, e.g. with one loaded from storage.
    pub async fn set_token(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    /// Returns the current token, expired or not.
    pub async fn get_token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Registers the callback invoked with every newly issued token.
    ///
    /// Replaces any previously registered callback. An error returned by the
    /// callback fails the request that triggered the refresh.
    ///
    /// The callback runs while the client holds its token lock: it must not
    /// block on this client's token accessors (`get_token`, `set_token`, or
    /// any call that needs a token), or it deadlocks.
    pub fn set_update_token_callback<F, E>(&mut self, callback: F)
    where
        F: Fn(&Token) -> Result<(), E> + Send + Sync + 'static,
        E: Into<CallbackError>,
    {
        self.update_token_callback = Some(builder::boxed_callback(callback));
    }

    /// Requests a new access token from the token endpoint.
    ///
    /// The new token replaces the current one and is handed to the update
    /// callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails, if the response has no
    /// usable token, or if the update callback fails.
    pub async fn request_access_token(&self) -> Result<Token, HelloFlexError> {
        let mut slot = self.token.lock().await;
        self.refresh_token(&mut slot).await
    }

    async fn bearer_token(&self) -> Result<HeaderValue, HelloFlexError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|token| !token.is_expired()) {
            return bearer_header(token.access_token());
        }

        let token = self.refresh_token(&mut slot).await?;
        bearer_header(token.access_token())
    }

    // The caller holds the token lock for the whole refresh.
    async fn refresh_token(&self, slot: &mut Option<Token>) -> Result<Token, HelloFlexError> {
        debug!(client_id = %self.credentials.client_id, "requesting access token");

        let body = CallBody::form(&self.credentials.token_request())?;
        let response = self
            .execute(
                Method::POST,
                TOKEN_ENDPOINT,
                None,
                Some(body),
                &CallQuery::default(),
            )
            .await?
            .ok_or_else(|| HelloFlexError::InvalidTokenResponse {
                reason: "empty response body".to_string(),
            })?;

        let TokenResponse {
            access_token,
            expires_in,
        } = serde_json::from_value(response).map_err(|err| {
            HelloFlexError::InvalidTokenResponse {
                reason: err.to_string(),
            }
        })?;

        let token = Token::from_expires_in(access_token, expires_in)?;
        self.update_token(slot, token.clone())?;
        Ok(token)
    }

    fn update_token(&self, slot: &mut Option<Token>, token: Token) -> Result<(), HelloFlexError> {
        debug!(expires = %token.expires(), "access token updated");
        let token = slot.insert(token);

        if let Some(callback) = &self.update_token_callback {
            callback(token).map_err(|source| HelloFlexError::TokenCallbackFailed { source })?;
        }
        Ok(())
    }
}

// Calls
impl HelloFlexClient {
    /// Starts a call with any HTTP method.
    pub fn call(&self, method: Method, endpoint: impl Into<String>) -> ApiCall<'_> {
        ApiCall::build(self, method, endpoint)
    }

    /// Starts a `GET` call.
    pub fn get(&self, endpoint: impl Into<String>) -> ApiCall<'_> {
        self.call(Method::GET, endpoint)
    }

    /// Starts a `POST` call.
    pub fn post(&self, endpoint: impl Into<String>) -> ApiCall<'_> {
        self.call(Method::POST, endpoint)
    }

    /// Starts a `PUT` call.
    pub fn put(&self, endpoint: impl Into<String>) -> ApiCall<'_> {
        self.call(Method::PUT, endpoint)
    }

    /// Starts a `PATCH` call.
    pub fn patch(&self, endpoint: impl Into<String>) -> ApiCall<'_> {
        self.call(Method::PATCH, endpoint)
    }

    /// Starts a `DELETE` call.
    pub fn delete(&self, endpoint: impl Into<String>) -> ApiCall<'_> {
        self.call(Method::DELETE, endpoint)
    }

    /// Returns the `X-Total-Count` value of the most recently completed
    /// request, or `None` if that response did not carry the header.
    pub async fn get_total_count(&self) -> Option<u64> {
        *self.total_count.read().await
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// Requests to any endpoint other than [`TOKEN_ENDPOINT`] carry a bearer
    /// token, which is requested first when none is held or it has expired.
    /// The body is only sent for `POST`, `PUT` and `PATCH`, which send an
    /// empty JSON array when no body is given.
    ///
    /// Returns `Ok(None)` for an empty (or `null`) response body.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - obtaining a token fails
    /// - the HTTP request fails (network issues, timeouts, etc.)
    /// - the response status is not 2xx
    /// - a non-empty response body is not valid JSON
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<CallBody>,
        query: &CallQuery,
    ) -> Result<Option<Value>, HelloFlexError> {
        let authorization = if endpoint == TOKEN_ENDPOINT {
            None
        } else {
            Some(self.bearer_token().await?)
        };

        self.execute(method, endpoint, authorization, body, query)
            .await
    }

    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        authorization: Option<HeaderValue>,
        body: Option<CallBody>,
        query: &CallQuery,
    ) -> Result<Option<Value>, HelloFlexError> {
        let url = Self::build_url(&self.base_url, endpoint, query)?;
        let request = self.build_request(method, url, authorization, body);

        debug!(?request, "sending...");
        let response = self.client.execute(request).await?;
        debug!(?response, "...receiving");

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .map(truncate_body)
                .unwrap_or_else(|e| format!("<unable to read response body: {e}>"));
            return Err(HelloFlexError::UnexpectedStatusCode { status_code, body });
        }

        let total_count = total_count_of(response.headers());
        *self.total_count.write().await = total_count;

        let bytes = response.bytes().await?;
        decode_body(endpoint, &bytes)
    }

    pub(crate) fn build_url(
        base_url: &Url,
        endpoint: &str,
        query: &CallQuery,
    ) -> Result<Url, HelloFlexError> {
        let url = format!(
            "{}/{}",
            base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut url = url.parse::<Url>()?;

        if !query.is_empty() {
            let query_string = query.to_query_string()?;
            let query_string = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query_string}"),
                _ => query_string,
            };
            url.set_query(Some(&query_string));
        }

        Ok(url)
    }

    fn build_request(
        &self,
        method: Method,
        url: Url,
        authorization: Option<HeaderValue>,
        body: Option<CallBody>,
    ) -> Request {
        let sends_body = [Method::POST, Method::PUT, Method::PATCH].contains(&method);
        if body.is_some() && !sends_body {
            debug!(%method, "ignoring request body");
        }

        let mut request = Request::new(method, url);
        *request.timeout_mut() = self.timeout;

        let req_headers = request.headers_mut();
        req_headers.typed_insert(CacheControl::new().with_no_cache());
        req_headers.typed_insert(Connection::close());
        req_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(authorization) = authorization {
            req_headers.insert(AUTHORIZATION, authorization);
        }

        if sends_body {
            let body = body.unwrap_or_else(CallBody::empty);
            req_headers.typed_insert(body.content_type);
            *request.body_mut() = Some(Body::from(body.data));
        }

        request
    }
}

fn total_count_of(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(TOTAL_COUNT_HEADER)?;
    let count = value
        .to_str()
        .ok()
        .and_then(|text| text.trim().parse().ok());
    if count.is_none() {
        warn!(?value, "ignoring invalid X-Total-Count header");
    }
    count
}

fn decode_body(path: &str, bytes: &[u8]) -> Result<Option<Value>, HelloFlexError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|error| HelloFlexError::JsonError {
            path: path.to_string(),
            error,
            body: String::from_utf8_lossy(bytes).into_owned(),
        })?;
    Ok((!value.is_null()).then_some(value))
}

fn truncate_body(text: String) -> String {
    if text.chars().count() > BODY_MAX_LENGTH {
        let head: String = text.chars().take(BODY_MAX_LENGTH).collect();
        format!("{head}... (truncated)")
    } else {
        text
    }
}
