use bytes::Bytes;
use serde_json::{Map, Value};

use crate::codec::{ContentDecoder, content_type_contains};
use crate::protocol::{Body, DecodeError};

/// Decodes `application/x-www-form-urlencoded` payloads into a string-valued [`Body::Map`].
///
/// Pairs are split on `&` then on the first `=`, both sides are percent-decoded. A key
/// without `=` maps to the empty string, and a repeated key keeps its last value.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormDecoder;

impl ContentDecoder for FormDecoder {
    fn can_decode(&self, content_type: &str) -> bool {
        content_type_contains(content_type, mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
    }

    fn decode(&self, bytes: Bytes, _content_type: &str) -> Result<Body, DecodeError> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes).map_err(DecodeError::invalid_body)?;

        let map = pairs.into_iter().map(|(key, value)| (key, Value::String(value))).collect::<Map<_, _>>();
        Ok(Body::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::FormDecoder;
    use crate::codec::ContentDecoder;
    use bytes::Bytes;
    use serde_json::json;

    const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

    #[test]
    fn decode_pairs() {
        let body = FormDecoder.decode(Bytes::from_static(b"name=hello&zip=world"), CONTENT_TYPE).unwrap();
        assert_eq!(body.get("name"), Some(&json!("hello")));
        assert_eq!(body.get("zip"), Some(&json!("world")));
    }

    #[test]
    fn percent_decodes_both_sides() {
        let body = FormDecoder.decode(Bytes::from_static(b"first%20name=J%C3%BCrgen&a%26b=c%3Dd"), CONTENT_TYPE).unwrap();
        assert_eq!(body.get("first name"), Some(&json!("Jürgen")));
        assert_eq!(body.get("a&b"), Some(&json!("c=d")));
    }

    #[test]
    fn bare_key_maps_to_empty_string() {
        let body = FormDecoder.decode(Bytes::from_static(b"flag&name=x"), CONTENT_TYPE).unwrap();
        assert_eq!(body.get("flag"), Some(&json!("")));
        assert_eq!(body.get("name"), Some(&json!("x")));
    }

    #[test]
    fn repeated_key_keeps_last() {
        let body = FormDecoder.decode(Bytes::from_static(b"a=1&a=2"), CONTENT_TYPE).unwrap();
        assert_eq!(body.get("a"), Some(&json!("2")));
    }
}
