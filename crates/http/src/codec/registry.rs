use bytes::Bytes;
use tracing::trace;

use crate::codec::{ContentDecoder, FormDecoder, JsonDecoder, MultipartConfig, MultipartDecoder, TextDecoder, XmlDecoder};
use crate::protocol::{Body, DecodeError};

/// An ordered set of [`ContentDecoder`]s.
///
/// Decoders are consulted from the most recently registered to the first one, so a
/// later registration overrides an earlier decoder for the content types both accept.
/// The registry is filled during startup and only read afterwards.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn ContentDecoder>>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry").field("decoders", &self.decoders.len()).finish()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults(MultipartConfig::default())
    }
}

impl DecoderRegistry {
    /// Creates a registry without any decoder: every payload is kept as raw bytes.
    pub fn new() -> Self {
        Self { decoders: vec![] }
    }

    /// Creates a registry with the json, url-encoded, multipart, text and xml decoders.
    pub fn with_defaults(multipart_config: MultipartConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(JsonDecoder)
            .register(FormDecoder)
            .register(MultipartDecoder::new(multipart_config))
            .register(TextDecoder)
            .register(XmlDecoder);
        registry
    }

    /// Adds a decoder that takes precedence over every decoder registered before it.
    pub fn register<D: ContentDecoder + 'static>(&mut self, decoder: D) -> &mut Self {
        self.decoders.push(Box::new(decoder));
        self
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decodes a buffered payload according to its `content-type` header.
    ///
    /// - an empty payload yields an empty [`Body::Map`] and no decoder is invoked
    /// - otherwise the first decoder (newest first) accepting the content type decodes it
    /// - without a matching decoder the bytes are returned unchanged as [`Body::Bytes`]
    ///
    /// # Errors
    ///
    /// Errors from the selected decoder are returned as-is.
    pub fn decode(&self, bytes: Bytes, content_type: Option<&str>) -> Result<Body, DecodeError> {
        if bytes.is_empty() {
            return Ok(Body::empty());
        }

        let content_type = content_type.unwrap_or_default();
        match self.decoders.iter().rev().find(|decoder| decoder.can_decode(content_type)) {
            Some(decoder) => {
                trace!(content_type, size = bytes.len(), "decode request body");
                decoder.decode(bytes, content_type)
            }
            None => {
                trace!(content_type, size = bytes.len(), "no decoder matched, keep raw body");
                Ok(Body::Bytes(bytes))
            }
        }
    }
}
