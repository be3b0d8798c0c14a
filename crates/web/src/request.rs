//! The request as seen by interceptors and handlers.
//!
//! - [`Request`]: method, path, headers, query parameters, the decoded body, and after
//!   routing the matched [`PathMatcher`] with its path parameters
//! - [`PathParams`]: placeholder values extracted from the request path

use std::collections::HashMap;
use std::sync::Arc;

use http::request::Parts;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method};
use relay_http::protocol::{Body, DecodeError};
use serde::de::DeserializeOwned;

use crate::WebError;
use crate::router::PathMatcher;

/// A request travelling through the interceptor chain.
///
/// A request is moved from one interceptor to the next, so exactly one task owns it at
/// any time. Its body is decoded before the request is built and is never decoded again.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    raw_query: Option<String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Body,
    extensions: Extensions,
    matcher: Option<Arc<PathMatcher>>,
    params: PathParams,
}

impl Request {
    /// Creates a request without headers and with an empty body.
    ///
    /// `target` is a path with an optional query string, e.g. `/users?page=2`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self::from_raw(method, path.to_string(), raw_query.map(str::to_string), HeaderMap::new(), Body::empty(), Extensions::new())
    }

    /// Builds the request from the transport's request head and the decoded body.
    pub fn from_parts(parts: Parts, body: Body) -> Self {
        let path = parts.uri.path().to_string();
        let raw_query = parts.uri.query().map(str::to_string);
        Self::from_raw(parts.method, path, raw_query, parts.headers, body, parts.extensions)
    }

    fn from_raw(
        method: Method,
        path: String,
        raw_query: Option<String>,
        headers: HeaderMap,
        body: Body,
        extensions: Extensions,
    ) -> Self {
        let query = raw_query.as_deref().map(parse_query).unwrap_or_default();
        Self { method, path, raw_query, query, headers, body, extensions, matcher: None, params: PathParams::empty() }
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The value of a header, if it is present and valid text.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Query parameters; a repeated key keeps its last value.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Deserializes the query string into `T`, nested keys such as `a[b]=1` are supported.
    ///
    /// # Errors
    ///
    /// Returns the `serde_qs` error when the query does not fit `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_qs::Error> {
        serde_qs::from_str(self.raw_query.as_deref().unwrap_or_default())
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Deserializes a structured body into `T`.
    ///
    /// # Errors
    ///
    /// See [`Body::deserialize`].
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        self.body.deserialize()
    }

    /// Typed values attached by interceptors for handlers further down the chain.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The matcher the router selected, `None` before routing.
    pub fn matcher(&self) -> Option<&PathMatcher> {
        self.matcher.as_deref()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Shortcut for `params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// A request is routed at most once.
    pub(crate) fn bind(&mut self, matcher: Arc<PathMatcher>, params: PathParams) -> Result<(), WebError> {
        if let Some(bound) = &self.matcher {
            return Err(WebError::AlreadyRouted { template: bound.template().to_string() });
        }
        self.matcher = Some(matcher);
        self.params = params;
        Ok(())
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query).map(|pairs| pairs.into_iter().collect()).unwrap_or_default()
}

/// Path parameters in the order their placeholders appear in the route template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.inner.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<'a> IntoIterator for &'a PathParams {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
