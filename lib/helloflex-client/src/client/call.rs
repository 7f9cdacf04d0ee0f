use std::future::{Future, IntoFuture};
use std::pin::Pin;

use http::Method;
use serde::Serialize;
use serde_json::Value;

use super::{BodyEncoding, CallBody, CallQuery, HelloFlexClient, HelloFlexError};

/// Builder for a single HelloFlex API call.
///
/// Created by the verb methods of [`HelloFlexClient`]. The request body and
/// query are optional; the call is sent when the builder is awaited.
///
/// # Example
///
/// ```rust,no_run
/// use helloflex_client::HelloFlexClient;
/// use serde_json::json;
///
/// # async fn example(client: &HelloFlexClient) -> Result<(), helloflex_client::HelloFlexError> {
/// // GET /api/employers?skip=0&take=10
/// let employers = client
///     .get("/api/employers")
///     .query(&json!({"skip": 0, "take": 10}))?
///     .await?;
///
/// // POST /api/jobs with a JSON body
/// let job = client.post("/api/jobs").json(&json!({"title": "x"}))?.await?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
#[must_use = "an ApiCall does nothing until awaited"]
pub struct ApiCall<'a> {
    #[debug(ignore)]
    client: &'a HelloFlexClient,
    method: Method,
    endpoint: String,
    query: CallQuery,
    body: Option<CallBody>,
}

impl<'a> ApiCall<'a> {
    pub(super) fn build(
        client: &'a HelloFlexClient,
        method: Method,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            method,
            endpoint: endpoint.into(),
            query: CallQuery::default(),
            body: None,
        }
    }

    /// Sets the query parameters.
    pub fn with_query(mut self, query: CallQuery) -> Self {
        self.query = query;
        self
    }

    /// Sets the query parameters from a serializable map or struct.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object.
    pub fn query<T>(self, query: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_query(CallQuery::from_serializable(query)?))
    }

    /// Sets an already encoded request body.
    pub fn with_body(mut self, body: CallBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the request body with the given encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be encoded.
    pub fn body<T>(self, data: &T, encoding: BodyEncoding) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_body(CallBody::encode(data, encoding)?))
    }

    /// Sets a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized.
    pub fn json<T>(self, data: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        self.body(data, BodyEncoding::Json)
    }

    /// Sets a form-encoded request body.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not an object.
    pub fn form<T>(self, data: &T) -> Result<Self, HelloFlexError>
    where
        T: Serialize + ?Sized,
    {
        self.body(data, BodyEncoding::Form)
    }

    async fn exchange(self) -> Result<Option<Value>, HelloFlexError> {
        let Self {
            client,
            method,
            endpoint,
            query,
            body,
        } = self;

        client.request(method, &endpoint, body, &query).await
    }
}

impl<'a> IntoFuture for ApiCall<'a> {
    type Output = Result<Option<Value>, HelloFlexError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.exchange())
    }
}
