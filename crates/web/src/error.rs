//! Error types of the web layer.
//!
//! - [`RouterError`]: raised while routes are registered
//! - [`WebError`]: raised while a request is served, mapped to a status code at the
//!   pipeline boundary by [`WebError::status_code`]

use http::{Method, Response, StatusCode};
use relay_http::protocol::DecodeError;
use std::error::Error;
use thiserror::Error;

use crate::ResponseBody;
use crate::responder::Responder;

/// Any error raised by user code (handlers and interceptors).
pub type BoxError = Box<dyn Error + Send + Sync>;

/// What handlers, interceptors and the router produce for one request.
pub type HandlerResult = Result<Response<ResponseBody>, WebError>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl RouterError {
    pub fn invalid_template<T: ToString, R: ToString>(template: T, reason: R) -> Self {
        Self::InvalidTemplate { template: template.to_string(), reason: reason.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum WebError {
    #[error("decode request body error: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("no route matched: {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("request is already bound to route {template}")]
    AlreadyRouted { template: String },

    #[error("handler error: {source}")]
    Handler { source: BoxError },
}

impl WebError {
    pub fn route_not_found<S: ToString>(method: Method, path: S) -> Self {
        Self::RouteNotFound { method, path: path.to_string() }
    }

    /// Wraps an error raised by a handler or interceptor.
    ///
    /// A boxed `WebError` is unwrapped rather than nested, so a route-not-found or
    /// decode failure keeps its class while travelling through user code.
    pub fn handler<E: Into<BoxError>>(error: E) -> Self {
        match error.into().downcast::<WebError>() {
            Ok(web_error) => *web_error,
            Err(source) => Self::Handler { source },
        }
    }

    /// The status code reported to the client for this failure.
    ///
    /// Malformed payloads map to `400`, payloads over a size limit to `413` (`431` for an
    /// oversized part header block), unknown routes to `404`, anything else to `500`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { source: DecodeError::HeaderTooLarge { .. } } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::Decode { source } if source.is_limit_exceeded() => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Decode { .. } => StatusCode::BAD_REQUEST,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyRouted { .. } | Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl Responder for WebError {
    fn response_to(self) -> Response<ResponseBody> {
        let status = self.status_code();
        let message = match &self {
            // user errors may carry internals, keep them out of the response
            Self::AlreadyRouted { .. } | Self::Handler { .. } => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, message).response_to()
    }
}

#[cfg(test)]
mod tests {
    use super::WebError;
    use http::{Method, StatusCode};
    use relay_http::protocol::DecodeError;
    use std::io;

    #[test]
    fn status_mapping() {
        assert_eq!(WebError::from(DecodeError::invalid_json("eof")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WebError::from(DecodeError::missing_boundary("multipart/form-data")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WebError::from(DecodeError::file_too_large("f", 2, 1)).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(WebError::from(DecodeError::too_many_parts(2, 1)).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            WebError::from(DecodeError::header_too_large(2, 1)).status_code(),
            StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
        );
        assert_eq!(WebError::route_not_found(Method::GET, "/x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(WebError::handler(io::Error::other("boom")).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(WebError::AlreadyRouted { template: "/x".into() }.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn boxed_web_error_keeps_its_class() {
        let boxed: super::BoxError = Box::new(WebError::route_not_found(Method::POST, "/users"));
        let error = WebError::handler(boxed);
        assert!(matches!(error, WebError::RouteNotFound { ref path, .. } if path == "/users"));
    }
}
