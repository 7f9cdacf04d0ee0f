use serde::Serialize;
use serde_json::Value;

use super::HelloFlexError;

/// Query parameters appended to the request URL.
///
/// Values are flattened into `key=value` pairs: nested objects become
/// `key[field]=value`, arrays become `key[0]=value`, booleans become `1` or
/// `0`, and `null` entries are skipped. The pairs keep the order they were added in.
///
/// # Example
///
/// ```rust
/// use helloflex_client::CallQuery;
///
/// let query = CallQuery::new()
///     .add_param("skip", 0)
///     .add_param("take", 10);
///
/// assert_eq!(query.to_query_string()?, "skip=0&take=10");
/// # Ok::<(), helloflex_client::HelloFlexError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallQuery {
    pairs: Vec<(String, String)>,
}

impl CallQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a query from any serializable map or struct.
    ///
    /// # Errors
    ///
    /// Returns [`HelloFlexError::UnsupportedEncodingValue`] when the value is
    /// not an object (or `null`, which yields an empty query).
    pub fn from_serializable<T>(value: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        let pairs = to_pairs(&value)?;
        Ok(Self { pairs })
    }

    /// Adds a parameter.
    #[must_use]
    pub fn add_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        push_pairs(name.into(), &value.into(), &mut self.pairs);
        self
    }

    /// Returns `true` when no parameter would be sent.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// URL-encodes the parameters, without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pairs cannot be url-encoded.
    pub fn to_query_string(&self) -> Result<String, HelloFlexError> {
        encode_pairs(&self.pairs)
    }
}

/// Flattens a JSON object into form pairs.
pub(super) fn to_pairs(value: &Value) -> Result<Vec<(String, String)>, HelloFlexError> {
    let mut pairs = Vec::new();
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(key.clone(), item, &mut pairs);
            }
        }
        _ => {
            return Err(HelloFlexError::UnsupportedEncodingValue {
                value: value.clone(),
            });
        }
    }
    Ok(pairs)
}

pub(super) fn encode_pairs(pairs: &[(String, String)]) -> Result<String, HelloFlexError> {
    Ok(serde_urlencoded::to_string(pairs)?)
}

fn push_pairs(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((key, u8::from(*flag).to_string())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                push_pairs(format!("{key}[{name}]"), item, pairs);
            }
        }
    }
}
