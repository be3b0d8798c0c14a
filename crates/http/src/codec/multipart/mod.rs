//! `multipart/form-data` decoding.
//!
//! The decoder works over the fully buffered payload and never copies part data:
//! every part body is a [`Bytes::slice`] of the input.
//!
//! # Stages
//!
//! 1. read the boundary parameter from the `content-type` header
//! 2. split the payload on `--boundary` at byte level, skipping empty slices and the
//!    terminal `--` marker, while counting parts against `max_parts`
//! 3. for every candidate part: separate the header block from the body at the first
//!    blank line, parse `content-disposition`, classify as field or file
//! 4. strip the single line break that belongs to the next delimiter, enforce sizes
//!
//! Parts without a header/body separator or without a field name are dropped silently,
//! a malformed part never fails the whole upload.

mod config;
mod headers;

pub use config::MultipartConfig;

use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use mime::Mime;
use tracing::trace;

use crate::codec::{ContentDecoder, content_type_contains};
use crate::protocol::{Body, DecodeError, MultipartFile, MultipartResult};
use crate::utils::ensure;
use headers::{ContentDisposition, PartHeaders};

/// Decoder for `multipart/form-data` payloads, see the [module docs](self).
#[derive(Debug, Default, Clone)]
pub struct MultipartDecoder {
    config: MultipartConfig,
}

impl MultipartDecoder {
    pub fn new(config: MultipartConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultipartConfig {
        &self.config
    }

    /// Decodes a complete multipart payload.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MissingBoundary`] if the header carries no boundary
    /// - [`DecodeError::TooManyParts`] if the payload has more than `max_parts` parts
    /// - [`DecodeError::HeaderTooLarge`] if a part header block exceeds `max_header_size`
    /// - [`DecodeError::FieldTooLarge`] / [`DecodeError::FileTooLarge`] if a part body
    ///   exceeds `max_field_size` / `max_file_size`
    pub fn decode_multipart(&self, bytes: &Bytes, content_type: &str) -> Result<MultipartResult, DecodeError> {
        let boundary = boundary(content_type).ok_or_else(|| DecodeError::missing_boundary(content_type))?;

        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());

        let parts = split_parts(bytes, &delimiter, self.config.max_parts())?;
        trace!(parts = parts.len(), "split multipart payload");

        let mut result = MultipartResult::new();
        for part in parts {
            self.decode_part(part, &mut result)?;
        }
        Ok(result)
    }

    fn decode_part(&self, part: Bytes, result: &mut MultipartResult) -> Result<(), DecodeError> {
        let part = strip_leading_line_break(part);

        let Some((header_end, body_start)) = header_separator(&part) else {
            trace!("discard multipart part without header separator");
            return Ok(());
        };

        ensure!(
            header_end <= self.config.max_header_size(),
            DecodeError::header_too_large(header_end, self.config.max_header_size())
        );

        let headers = PartHeaders::parse(&part[..body_start]);
        let disposition = headers.get(&CONTENT_DISPOSITION).map(|value| ContentDisposition::parse(&value)).unwrap_or_default();

        let Some(name) = disposition.name.filter(|name| !name.is_empty()) else {
            trace!("discard multipart part without field name");
            return Ok(());
        };

        let body = strip_trailing_line_break(part.slice(body_start..));

        match disposition.filename {
            Some(filename) => {
                let max_size = self.config.max_file_size();
                ensure!(body.len() <= max_size, DecodeError::file_too_large(&name, body.len(), max_size));

                let content_type = headers
                    .get(&CONTENT_TYPE)
                    .and_then(|value| value.parse::<Mime>().ok())
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);

                trace!(field = %name, filename = %filename, size = body.len(), "decoded multipart file");
                result.push_file(MultipartFile::new(name, filename, content_type, body));
            }
            None => {
                let max_size = self.config.max_field_size();
                ensure!(body.len() <= max_size, DecodeError::field_too_large(&name, body.len(), max_size));

                let value = String::from_utf8_lossy(&body).into_owned();
                result.insert_field(name, value);
            }
        }

        Ok(())
    }
}

impl ContentDecoder for MultipartDecoder {
    fn can_decode(&self, content_type: &str) -> bool {
        content_type_contains(content_type, mime::MULTIPART_FORM_DATA.essence_str())
    }

    fn decode(&self, bytes: Bytes, content_type: &str) -> Result<Body, DecodeError> {
        self.decode_multipart(&bytes, content_type).map(Body::Multipart)
    }
}

/// Reads the boundary parameter, accepting both `boundary="x"` and `boundary=x`.
fn boundary(content_type: &str) -> Option<String> {
    if let Ok(mime) = content_type.parse::<Mime>() {
        return mime
            .get_param(mime::BOUNDARY)
            .map(|name| name.as_str().trim_matches('"').to_string())
            .filter(|boundary| !boundary.is_empty());
    }

    // headers `mime` refuses to parse, e.g. with unusual characters in the boundary
    let lower = content_type.to_ascii_lowercase();
    let start = lower.find("boundary=")? + "boundary=".len();
    let raw = content_type[start..].split(';').next()?.trim();
    let boundary = raw.trim_matches('"');
    (!boundary.is_empty()).then(|| boundary.to_string())
}

/// Splits `bytes` on every occurrence of `delimiter`, keeping only candidate parts.
fn split_parts(bytes: &Bytes, delimiter: &[u8], max_parts: usize) -> Result<Vec<Bytes>, DecodeError> {
    let mut parts = Vec::new();
    let mut start = 0;

    loop {
        let end = find(&bytes[start..], delimiter).map(|offset| start + offset);
        let slice = bytes.slice(start..end.unwrap_or(bytes.len()));

        if is_candidate(&slice) {
            parts.push(slice);
            ensure!(parts.len() <= max_parts, DecodeError::too_many_parts(parts.len(), max_parts));
        }

        match end {
            Some(end) => start = end + delimiter.len(),
            None => break,
        }
    }

    Ok(parts)
}

/// Empty (whitespace only) slices and the closing `--` marker are not parts.
fn is_candidate(slice: &[u8]) -> bool {
    !slice.starts_with(b"--") && !slice.trim_ascii().is_empty()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Returns the end of the header block and the start of the body.
fn header_separator(part: &[u8]) -> Option<(usize, usize)> {
    let crlf = find(part, b"\r\n\r\n").map(|index| (index, index + 4));
    let lf = find(part, b"\n\n").map(|index| (index, index + 2));

    match (crlf, lf) {
        (Some(crlf), Some(lf)) => Some(if lf.0 < crlf.0 { lf } else { crlf }),
        (crlf, lf) => crlf.or(lf),
    }
}

fn strip_leading_line_break(part: Bytes) -> Bytes {
    if part.starts_with(b"\r\n") {
        part.slice(2..)
    } else if part.starts_with(b"\n") {
        part.slice(1..)
    } else {
        part
    }
}

/// Removes exactly one trailing line break, the rest of the payload is left untouched.
fn strip_trailing_line_break(body: Bytes) -> Bytes {
    if body.ends_with(b"\r\n") {
        body.slice(..body.len() - 2)
    } else if body.ends_with(b"\n") {
        body.slice(..body.len() - 1)
    } else {
        body
    }
}
