use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::auth::ClientCredentials;
use super::{
    CallbackError, DEFAULT_BASE_URL, HelloFlexClient, HelloFlexError, SecureString, Token,
    UpdateTokenCallback,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for creating [`HelloFlexClient`] instances.
///
/// # Default Configuration
///
/// - **Base URL**: `https://api.helloflex.com`
/// - **Timeout**: 30 seconds per request
/// - **Token**: none, one is requested on the first call
/// - **Update token callback**: none
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use helloflex_client::HelloFlexClient;
///
/// # fn example() -> Result<(), helloflex_client::HelloFlexError> {
/// let client = HelloFlexClient::builder("client_id", "client_secret")
///     .with_timeout(Duration::from_secs(10))
///     .with_update_token_callback(|token| {
///         tracing::info!(expires = %token.expires(), "new token");
///         Ok::<_, std::convert::Infallible>(())
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct HelloFlexClientBuilder {
    client: Option<reqwest::Client>,
    base_url: Option<Url>,
    timeout: Option<Duration>,
    credentials: ClientCredentials,
    token: Option<Token>,
    #[debug(ignore)]
    update_token_callback: Option<UpdateTokenCallback>,
}

impl HelloFlexClientBuilder {
    pub(super) fn new(client_id: impl Into<String>, client_secret: impl Into<SecureString>) -> Self {
        Self {
            client: None,
            base_url: None,
            timeout: Some(DEFAULT_TIMEOUT),
            credentials: ClientCredentials {
                client_id: client_id.into(),
                client_secret: client_secret.into(),
            },
            token: None,
            update_token_callback: None,
        }
    }

    /// Builds the final `HelloFlexClient`.
    ///
    /// # Errors
    ///
    /// Fails if the default HTTP client cannot be created (e.g. the TLS
    /// backend cannot be initialized).
    pub fn build(self) -> Result<HelloFlexClient, HelloFlexError> {
        let Self {
            client,
            base_url,
            timeout,
            credentials,
            token,
            update_token_callback,
        } = self;

        let client = match client {
            Some(client) => client,
            None => reqwest::Client::builder().build()?,
        };
        let base_url = match base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        Ok(HelloFlexClient {
            client,
            base_url,
            timeout,
            credentials,
            token: Arc::new(Mutex::new(token)),
            total_count: Arc::new(RwLock::new(None)),
            update_token_callback,
        })
    }

    /// Sets the API origin, mostly useful to target a test server.
    ///
    /// # Errors
    ///
    /// Returns [`HelloFlexError::InvalidBaseUrl`] if the URL cannot be parsed
    /// or is not an `http`/`https` URL.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, HelloFlexError> {
        let raw = base_url.as_ref();
        let url = Url::parse(raw).map_err(|err| HelloFlexError::InvalidBaseUrl {
            url: raw.to_string(),
            error: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HelloFlexError::InvalidBaseUrl {
                url: raw.to_string(),
                error: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Removes the per-request timeout, leaving it to the HTTP client's own setting.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Uses a preconfigured `reqwest::Client` (proxy, TLS roots, user agent...).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Seeds the client with a previously persisted token.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Registers the callback invoked with every newly issued token.
    ///
    /// See [`HelloFlexClient::set_update_token_callback`] for the locking rule.
    #[must_use]
    pub fn with_update_token_callback<F, E>(mut self, callback: F) -> Self
    where
        F: Fn(&Token) -> Result<(), E> + Send + Sync + 'static,
        E: Into<CallbackError>,
    {
        self.update_token_callback = Some(boxed_callback(callback));
        self
    }
}

pub(super) fn boxed_callback<F, E>(callback: F) -> UpdateTokenCallback
where
    F: Fn(&Token) -> Result<(), E> + Send + Sync + 'static,
    E: Into<CallbackError>,
{
    Arc::new(move |token: &Token| callback(token).map_err(Into::into))
}
