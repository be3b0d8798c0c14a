use bytes::Bytes;
use serde_json::Value;

use crate::codec::{ContentDecoder, content_type_contains};
use crate::protocol::{Body, DecodeError};

/// Decodes `application/json` payloads.
///
/// Objects become [`Body::Map`], any other document becomes [`Body::Json`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl ContentDecoder for JsonDecoder {
    fn can_decode(&self, content_type: &str) -> bool {
        content_type_contains(content_type, mime::APPLICATION_JSON.essence_str())
    }

    fn decode(&self, bytes: Bytes, _content_type: &str) -> Result<Body, DecodeError> {
        let value = serde_json::from_slice::<Value>(&bytes).map_err(DecodeError::invalid_json)?;
        Ok(Body::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::JsonDecoder;
    use crate::codec::ContentDecoder;
    use crate::protocol::{Body, DecodeError};
    use bytes::Bytes;
    use serde_json::json;

    #[test]
    fn accepts_json_content_types() {
        assert!(JsonDecoder.can_decode("application/json"));
        assert!(JsonDecoder.can_decode("application/json; charset=utf-8"));
        assert!(JsonDecoder.can_decode("Application/JSON"));
        assert!(!JsonDecoder.can_decode("text/plain"));
    }

    #[test]
    fn decode_object() {
        let body = JsonDecoder.decode(Bytes::from_static(br#"{"a":1}"#), "application/json").unwrap();
        assert_eq!(body, Body::from(json!({"a": 1})));
        assert_eq!(body.get("a"), Some(&json!(1)));
    }

    #[test]
    fn decode_array() {
        let body = JsonDecoder.decode(Bytes::from_static(b"[1,2,3]"), "application/json").unwrap();
        assert_eq!(body, Body::Json(json!([1, 2, 3])));
    }

    #[test]
    fn decode_invalid() {
        let result = JsonDecoder.decode(Bytes::from_static(b"{invalid"), "application/json");
        assert!(matches!(result, Err(DecodeError::InvalidJson { .. })));
    }
}
