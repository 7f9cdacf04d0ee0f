//! # HelloFlex client
//!
//! Async client for the [HelloFlex](https://api.helloflex.com/docs/index) REST API.
//!
//! The client takes care of the OAuth2 client-credentials flow: an access
//! token is requested before the first call that needs one, reused while it is
//! valid, and requested again once it has expired. Every call returns the
//! decoded JSON body as a [`serde_json::Value`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use helloflex_client::HelloFlexClient;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HelloFlexClient::new("client_id", "client_secret")?;
//!
//! // GET /api/jobs, the token is requested first
//! let jobs = client.get("/api/jobs").await?;
//!
//! // Pagination metadata of the last call (X-Total-Count header)
//! let total_count = client.get_total_count().await;
//!
//! // Query parameters
//! let employers = client
//!     .get("/api/employers")
//!     .query(&json!({"skip": 0, "take": 10}))?
//!     .await?;
//!
//! // JSON body (default) or form-encoded body
//! let job = client.post("/api/jobs").json(&json!({"title": "Barista"}))?.await?;
//! let job = client.put("/api/jobs/42").form(&json!({"title": "Barista"}))?.await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Token persistence
//!
//! The client keeps its token in memory only. To reuse a token across
//! processes, register an update callback and seed new clients with the
//! stored [`Token`]:
//!
//! ```rust,no_run
//! use helloflex_client::{HelloFlexClient, Token};
//!
//! # async fn example(stored: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = HelloFlexClient::new("client_id", "client_secret")?;
//!
//! client.set_update_token_callback(|token: &Token| {
//!     let serialized = serde_json::to_string(token)?;
//!     // write `serialized` to your session store, database, ...
//!     # drop(serialized);
//!     Ok::<_, serde_json::Error>(())
//! });
//!
//! if let Some(stored) = stored {
//!     client.set_token(serde_json::from_str(&stored)?).await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Non-2xx responses are returned as [`HelloFlexError::UnexpectedStatusCode`];
//! nothing is retried. An empty response body decodes to `None`, a malformed
//! one to [`HelloFlexError::JsonError`].

mod client;

pub use self::client::{
    ApiCall, BodyEncoding, CallBody, CallQuery, CallbackError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
    HelloFlexClient, HelloFlexClientBuilder, HelloFlexError, SecureString, TOKEN_ENDPOINT,
    TOTAL_COUNT_HEADER, Token, UpdateTokenCallback,
};

// Re-export for convenience
pub use http::Method;
pub use serde_json::Value;
