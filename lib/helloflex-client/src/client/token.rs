//! HelloFlex access token with absolute expiry.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::HelloFlexError;

/// An OAuth2 access token issued by the HelloFlex token endpoint.
///
/// Tokens are immutable: the client replaces its token on refresh, it never
/// mutates one. The token serializes to `{"access_token": .., "expires": ..}`
/// (RFC 3339 timestamp) so it can be persisted by the caller and restored
/// later with [`HelloFlexClient::set_token`](crate::HelloFlexClient::set_token).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Token {
    access_token: String,
    #[zeroize(skip)]
    expires: Timestamp,
}

impl Token {
    /// Creates a token expiring at the given instant.
    pub fn new(access_token: impl Into<String>, expires: Timestamp) -> Self {
        Self {
            access_token: access_token.into(),
            expires,
        }
    }

    /// Creates a token expiring `expires_in` seconds from now.
    ///
    /// # Errors
    ///
    /// Returns [`HelloFlexError::InvalidTokenResponse`] if the resulting
    /// instant is out of the supported timestamp range.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        expires_in: i64,
    ) -> Result<Self, HelloFlexError> {
        Self::from_expires_in_at(access_token, expires_in, Timestamp::now())
    }

    pub(crate) fn from_expires_in_at(
        access_token: impl Into<String>,
        expires_in: i64,
        issued_at: Timestamp,
    ) -> Result<Self, HelloFlexError> {
        let expires = issued_at
            .checked_add(SignedDuration::from_secs(expires_in))
            .map_err(|e| HelloFlexError::InvalidTokenResponse {
                reason: format!("expires_in {expires_in} is out of range: {e}"),
            })?;
        Ok(Self::new(access_token, expires))
    }

    /// Returns the access token value.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the instant the token expires at.
    pub fn expires(&self) -> Timestamp {
        self.expires
    }

    /// Checks if the token is expired.
    ///
    /// A token is still valid at exactly its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Checks if the token is expired at the given instant.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}
