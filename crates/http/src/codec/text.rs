use bytes::Bytes;
use mime::Mime;

use crate::codec::{ContentDecoder, content_type_contains};
use crate::protocol::{Body, DecodeError};

/// Decodes `text/plain` payloads.
///
/// A `charset=iso-8859-1` (or `latin1`) parameter maps every byte to the code point of
/// the same value. Any other payload is read as UTF-8, invalid sequences become `U+FFFD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDecoder;

impl ContentDecoder for TextDecoder {
    fn can_decode(&self, content_type: &str) -> bool {
        content_type_contains(content_type, mime::TEXT_PLAIN.essence_str())
    }

    fn decode(&self, bytes: Bytes, content_type: &str) -> Result<Body, DecodeError> {
        let text = if is_latin1(content_type) {
            bytes.iter().copied().map(char::from).collect()
        } else {
            match String::from_utf8(bytes.into()) {
                Ok(text) => text,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            }
        };
        Ok(Body::Text(text))
    }
}

fn is_latin1(content_type: &str) -> bool {
    let Ok(parsed) = content_type.parse::<Mime>() else {
        return false;
    };
    parsed.get_param(mime::CHARSET)
        .is_some_and(|charset| ["iso-8859-1", "iso_8859-1", "latin1"].iter().any(|name| charset.as_str().eq_ignore_ascii_case(name)))
}
