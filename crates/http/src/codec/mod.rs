//! Content decoders turning buffered request bytes into a [`Body`].
//!
//! Every decoder answers two questions: does it understand a given `content-type`
//! header ([`ContentDecoder::can_decode`]), and what does a payload look like once
//! decoded ([`ContentDecoder::decode`]). The [`DecoderRegistry`] keeps an ordered set of
//! decoders and picks one per request.
//!
//! # Built-in decoders
//!
//! | decoder               | content type                          | body                  |
//! |-----------------------|---------------------------------------|-----------------------|
//! | [`JsonDecoder`]       | `application/json`                    | `Map` / `Json`        |
//! | [`FormDecoder`]       | `application/x-www-form-urlencoded`   | `Map`                 |
//! | [`MultipartDecoder`]  | `multipart/form-data`                 | `Multipart`           |
//! | [`TextDecoder`]       | `text/plain`                          | `Text`                |
//! | [`XmlDecoder`]        | `application/xml`, `text/xml`         | `Map`                 |
//!
//! All decoders are synchronous and operate over an already-buffered [`Bytes`].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use relay_http::codec::DecoderRegistry;
//!
//! let registry = DecoderRegistry::default();
//! let body = registry.decode(Bytes::from_static(br#"{"a":1}"#), Some("application/json")).unwrap();
//! assert_eq!(body.get("a"), Some(&serde_json::json!(1)));
//! ```

mod form;
mod json;
mod multipart;
mod registry;
mod text;
mod xml;

pub use form::FormDecoder;
pub use json::JsonDecoder;
pub use multipart::{MultipartConfig, MultipartDecoder};
pub use registry::DecoderRegistry;
pub use text::TextDecoder;
pub use xml::XmlDecoder;

use bytes::Bytes;

use crate::protocol::{Body, DecodeError};

/// A decoder for one family of content types.
///
/// Implementations must be pure functions of their input and their own read-only
/// configuration, so a single instance can serve concurrent requests.
#[cfg_attr(test, mockall::automock)]
pub trait ContentDecoder: Send + Sync {
    /// Whether this decoder accepts a payload with the given `content-type` header value.
    fn can_decode(&self, content_type: &str) -> bool;

    /// Decode the whole payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the payload is malformed or exceeds a configured limit.
    fn decode(&self, bytes: Bytes, content_type: &str) -> Result<Body, DecodeError>;
}

/// A decoder assembled from a predicate closure and a decode closure.
struct FnDecoder<P, D> {
    predicate: P,
    decode: D,
}

impl<P, D> ContentDecoder for FnDecoder<P, D>
where
    P: Fn(&str) -> bool + Send + Sync,
    D: Fn(Bytes, &str) -> Result<Body, DecodeError> + Send + Sync,
{
    fn can_decode(&self, content_type: &str) -> bool {
        (self.predicate)(content_type)
    }

    fn decode(&self, bytes: Bytes, content_type: &str) -> Result<Body, DecodeError> {
        (self.decode)(bytes, content_type)
    }
}

/// Creates a decoder from two closures.
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use relay_http::codec::{fn_decoder, DecoderRegistry};
/// use relay_http::protocol::Body;
///
/// let mut registry = DecoderRegistry::default();
/// registry.register(fn_decoder(
///     |content_type| content_type.contains("application/csv"),
///     |bytes, _| Ok(Body::Text(String::from_utf8_lossy(&bytes).to_uppercase())),
/// ));
///
/// let body = registry.decode(Bytes::from_static(b"a,b"), Some("application/csv")).unwrap();
/// assert_eq!(body.as_text(), Some("A,B"));
/// ```
pub fn fn_decoder<P, D>(predicate: P, decode: D) -> impl ContentDecoder
where
    P: Fn(&str) -> bool + Send + Sync,
    D: Fn(Bytes, &str) -> Result<Body, DecodeError> + Send + Sync,
{
    FnDecoder { predicate, decode }
}

/// Case-insensitive substring test used by the built-in decoder predicates.
pub(crate) fn content_type_contains(content_type: &str, needle: &str) -> bool {
    content_type.to_ascii_lowercase().contains(needle)
}
