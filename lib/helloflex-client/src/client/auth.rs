use std::fmt;

use http::HeaderValue;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::HelloFlexError;

/// Grant type sent to the token endpoint.
const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// The client secret, zeroed from memory when dropped.
///
/// `Debug` prints `[REDACTED]`. `Display` keeps only the first and last four
/// characters of secrets longer than eight characters, and `***` otherwise.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps a secret value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the secret in clear, for the token request body.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.chars().count();
        if len <= 8 {
            return f.write_str("***");
        }
        let head = self.0.chars().take(4);
        let tail = self.0.chars().skip(len - 4);
        write!(f, "{}...{}", head.collect::<String>(), tail.collect::<String>())
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The static client-credentials pair, set once at construction.
#[derive(Clone)]
pub(super) struct ClientCredentials {
    pub(super) client_id: String,
    pub(super) client_secret: SecureString,
}

impl ClientCredentials {
    /// Form payload for the client-credentials grant.
    pub(super) fn token_request(&self) -> TokenRequest<'_> {
        TokenRequest {
            client_id: &self.client_id,
            client_secret: self.client_secret.as_str(),
            grant_type: CLIENT_CREDENTIALS_GRANT,
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &format_args!("{}", self.client_secret))
            .finish()
    }
}

/// Body of `POST /oauth2/token`, field order is the wire order.
#[derive(Serialize)]
pub(super) struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

/// Successful answer of the token endpoint.
#[derive(Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: String,
    pub(super) expires_in: i64,
}

/// Builds the `Authorization: Bearer <token>` header value.
pub(super) fn bearer_header(access_token: &str) -> Result<HeaderValue, HelloFlexError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|e| {
        HelloFlexError::InvalidBearerToken {
            message: e.to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}
