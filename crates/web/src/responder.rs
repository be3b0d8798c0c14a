//! Conversion of handler outputs into responses.
//!
//! Text is sent as `text/plain; charset=utf-8`, [`Json`] and [`serde_json::Value`] as
//! `application/json`, raw [`Bytes`] as `application/octet-stream`. `()` and `None`
//! produce an empty `200` response.

use crate::body::ResponseBody;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use serde::Serialize;
use tracing::error;

const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Turns a value into a response.
///
/// Types implementing this trait can be returned directly from handlers built with
/// [`handler_fn`](crate::handler_fn) and are converted into a response.
pub trait Responder {
    fn response_to(self) -> Response<ResponseBody>;
}

/// Wraps a serializable value to be sent as `application/json`.
///
/// # Example
/// ```
/// # use serde::Serialize;
/// # use relay_web::responder::Json;
/// #[derive(Serialize)]
/// struct User {
///     name: String,
/// }
///
/// async fn handle(_req: relay_web::Request) -> Json<User> {
///     Json(User { name: "juan".into() })
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn response_to(self) -> Response<ResponseBody> {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => with_content_type(ResponseBody::once(Bytes::from(bytes)), APPLICATION_JSON),
            Err(e) => {
                error!(cause = %e, "serialize json response error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").response_to()
            }
        }
    }
}

impl Responder for serde_json::Value {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self.to_string()), APPLICATION_JSON)
    }
}

impl<T: Responder> Responder for Option<T> {
    fn response_to(self) -> Response<ResponseBody> {
        match self {
            Some(t) => t.response_to(),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

/// Overrides the status of the inner response.
impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.response_to();
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self) -> Response<ResponseBody> {
        (*self).response_to()
    }
}

impl Responder for () {
    fn response_to(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), TEXT_PLAIN_UTF_8)
    }
}

impl Responder for String {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::from(self), TEXT_PLAIN_UTF_8)
    }
}

impl Responder for Bytes {
    fn response_to(self) -> Response<ResponseBody> {
        with_content_type(ResponseBody::once(self), mime::APPLICATION_OCTET_STREAM.as_ref())
    }
}

fn with_content_type(body: ResponseBody, content_type: &str) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
