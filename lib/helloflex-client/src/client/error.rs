use std::error::Error as StdError;

/// Boxed error returned by a failing update-token callback.
pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur when using the [`HelloFlexClient`](super::HelloFlexClient).
///
/// Covers transport failures, non-2xx responses, body encoding and decoding,
/// and failures while obtaining or handing over an access token.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum HelloFlexError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail, timeouts occur, or connection issues arise.
    ReqwestError(reqwest::Error),

    /// URL parsing error when constructing request URLs.
    UrlError(url::ParseError),

    /// JSON serialization error for request bodies.
    JsonValueError(serde_json::Error),

    /// Form or query string serialization error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The configured base URL cannot be used.
    #[display("Invalid base URL '{url}': {error}")]
    #[from(skip)]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        error: String,
    },

    /// Bearer token contains invalid characters for HTTP headers.
    #[display("Bearer token contains invalid characters: {message}")]
    #[from(skip)]
    InvalidBearerToken {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// A form body or query string was given a value it cannot encode.
    ///
    /// Only objects (maps, structs) can be turned into key/value pairs.
    #[display("Unsupported value for form or query encoding: {value}")]
    #[from(skip)]
    UnsupportedEncodingValue {
        /// The value that could not be encoded.
        value: serde_json::Value,
    },

    /// JSON response deserialization failure.
    ///
    /// Occurs when a non-empty response body is not valid JSON.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    JsonError {
        /// The request path where the error occurred.
        path: String,
        /// The underlying JSON parsing error.
        error: serde_json::Error,
        /// The response body that failed to parse.
        body: String,
    },

    /// Server returned a non-2xx HTTP status code.
    #[display("Unexpected status code {status_code}: {body}")]
    #[from(skip)]
    UnexpectedStatusCode {
        /// The HTTP status code received.
        status_code: u16,
        /// The response body for debugging.
        body: String,
    },

    /// The token endpoint answered without a usable token.
    #[display("Invalid OAuth2 token response: {reason}")]
    #[from(skip)]
    InvalidTokenResponse {
        /// Description of what was invalid.
        reason: String,
    },

    /// The registered update-token callback failed.
    ///
    /// The new token is stored on the client before the callback runs.
    #[display("Update token callback failed: {source}")]
    #[from(skip)]
    TokenCallbackFailed {
        /// The error returned by the callback.
        source: CallbackError,
    },
}
