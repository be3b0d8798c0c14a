//! The decoded request body.
//!
//! A [`Body`] is produced exactly once per request by the
//! [`DecoderRegistry`](crate::codec::DecoderRegistry) and is read-only from then on.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::{DecodeError, MultipartResult};

/// A request body after content decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// String-keyed mapping: json objects, url-encoded forms, xml documents and empty bodies.
    Map(Map<String, Value>),
    /// A json document whose top level is not an object.
    Json(Value),
    /// Raw bytes, used when no decoder accepts the content type.
    Bytes(Bytes),
    /// Plain text.
    Text(String),
    /// Fields and files of a `multipart/form-data` payload.
    Multipart(MultipartResult),
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body {
    /// The body of a request without payload: an empty mapping.
    pub fn empty() -> Self {
        Self::Map(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::Json(value) => value.is_null(),
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
            Self::Multipart(multipart) => multipart.is_empty(),
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_multipart(&self) -> Option<&MultipartResult> {
        match self {
            Self::Multipart(multipart) => Some(multipart),
            _ => None,
        }
    }

    /// Looks up a top-level key of a mapping body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Deserializes a structured body (mapping, json, or multipart fields) into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidBody`] when the body is raw bytes or text, or when
    /// its shape does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let value = match self {
            Self::Map(map) => Value::Object(map.clone()),
            Self::Json(value) => value.clone(),
            Self::Multipart(multipart) => {
                Value::Object(multipart.fields().iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
            }
            Self::Bytes(_) | Self::Text(_) => {
                return Err(DecodeError::invalid_body("body is not a structured document"));
            }
        };

        serde_json::from_value(value).map_err(DecodeError::invalid_body)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(map),
            value => Self::Json(value),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<MultipartResult> for Body {
    fn from(multipart: MultipartResult) -> Self {
        Self::Multipart(multipart)
    }
}
