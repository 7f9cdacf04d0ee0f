use headers::ContentType;
use serde::Serialize;

use super::HelloFlexError;
use super::query::{encode_pairs, to_pairs};

/// How a request body is encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    /// `application/json`, the default for API calls.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`, used by the token endpoint.
    Form,
}

/// Represents the body of an HTTP request with its content type.
///
/// A body is only sent for `POST`, `PUT` and `PATCH` requests; those methods
/// send an empty JSON array (`[]`) when no body is given.
#[derive(Clone, derive_more::Debug)]
pub struct CallBody {
    pub(super) content_type: ContentType,
    #[debug(ignore)]
    pub(super) data: Vec<u8>,
}

impl CallBody {
    /// Creates a body with the given encoding.
    ///
    /// # Errors
    ///
    /// See [`CallBody::json`] and [`CallBody::form`].
    pub fn encode<T>(data: &T, encoding: BodyEncoding) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        match encoding {
            BodyEncoding::Json => Self::json(data),
            BodyEncoding::Form => Self::form(data),
        }
    }

    /// Creates a JSON body from a serializable type.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized to JSON.
    pub fn json<T>(data: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(data)?;
        Ok(Self {
            content_type: ContentType::json(),
            data,
        })
    }

    /// Creates a form-encoded body from a serializable map or struct.
    ///
    /// Nested values use the same bracket notation as [`CallQuery`](super::CallQuery).
    ///
    /// # Errors
    ///
    /// Returns [`HelloFlexError::UnsupportedEncodingValue`] if the data is not
    /// an object.
    pub fn form<T>(data: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(data)?;
        let data = encode_pairs(&to_pairs(&value)?)?.into_bytes();
        Ok(Self {
            content_type: ContentType::form_url_encoded(),
            data,
        })
    }

    /// Empty JSON array, sent by `POST`, `PUT` and `PATCH` calls without data.
    pub(super) fn empty() -> Self {
        Self {
            content_type: ContentType::json(),
            data: b"[]".to_vec(),
        }
    }

    /// Returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
