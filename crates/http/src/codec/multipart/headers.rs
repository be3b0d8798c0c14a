//! Header block parsing for a single multipart part.

use std::borrow::Cow;

use http::{HeaderMap, HeaderName, HeaderValue};
use httparse::Status;
use tracing::trace;

/// Blocks with more headers than this are read line by line.
const MAX_PART_HEADERS: usize = 16;

/// Headers of one part.
#[derive(Debug, Default)]
pub(super) struct PartHeaders {
    inner: HeaderMap,
}

impl PartHeaders {
    /// Parses a raw header block, terminating blank line included.
    ///
    /// Well formed blocks go through `httparse`. A block it rejects is read line by
    /// line instead: each line is split on its first colon, lines without a colon or
    /// with a name `http` refuses are skipped.
    pub(super) fn parse(block: &[u8]) -> Self {
        let mut inner = HeaderMap::new();
        if !parse_strict(block, &mut inner) {
            inner.clear();
            parse_lenient(block, &mut inner);
        }
        Self { inner }
    }

    /// Header values are not required to be ascii, `filename` often is not.
    pub(super) fn get(&self, name: &HeaderName) -> Option<Cow<'_, str>> {
        self.inner.get(name).map(|value| String::from_utf8_lossy(value.as_bytes()))
    }
}

fn parse_strict(block: &[u8], headers: &mut HeaderMap) -> bool {
    let mut parsed = [httparse::EMPTY_HEADER; MAX_PART_HEADERS];
    match httparse::parse_headers(block, &mut parsed) {
        Ok(Status::Complete((_, parsed))) => parsed.iter().all(|header| insert(headers, header.name.as_bytes(), header.value)),
        Ok(Status::Partial) => false,
        Err(e) => {
            trace!(cause = %e, "part headers fall back to line parsing");
            false
        }
    }
}

fn parse_lenient(block: &[u8], headers: &mut HeaderMap) {
    for line in block.split(|&byte| byte == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(colon) = line.iter().position(|&byte| byte == b':') else {
            continue;
        };
        if !insert(headers, &line[..colon], &line[colon + 1..]) {
            trace!("skip malformed part header line");
        }
    }
}

/// Later headers with the same name replace earlier ones.
fn insert(headers: &mut HeaderMap, name: &[u8], value: &[u8]) -> bool {
    let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.trim_ascii()), HeaderValue::from_bytes(value.trim_ascii())) else {
        return false;
    };
    headers.insert(name, value);
    true
}

/// The parameters of a `content-disposition` header that matter for form data.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct ContentDisposition {
    pub(super) name: Option<String>,
    pub(super) filename: Option<String>,
}

impl ContentDisposition {
    /// Parses `form-data; name="field"; filename="a.txt"`.
    ///
    /// Quoted and bare parameter values are both accepted. `filename*` (RFC 5987) is
    /// used when no plain `filename` is present.
    pub(super) fn parse(value: &str) -> Self {
        let mut disposition = Self::default();
        let mut extended_filename = None;

        for param in split_params(value).into_iter().skip(1) {
            let Some((key, raw)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = unquote(raw.trim());

            match key.as_str() {
                "name" => disposition.name = Some(value),
                "filename" => disposition.filename = Some(value),
                "filename*" => extended_filename = Some(decode_extended(&value)),
                _ => {}
            }
        }

        if disposition.filename.is_none() {
            disposition.filename = extended_filename;
        }
        disposition
    }
}

/// Splits on `;` outside of double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').map(|v| v.strip_suffix('"').unwrap_or(v)) else {
        return value.to_string();
    };

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

/// Decodes `charset'lang'percent-encoded` values, only utf-8 and ascii charsets are supported.
fn decode_extended(value: &str) -> String {
    let mut pieces = value.splitn(3, '\'');
    let (Some(_charset), Some(_language), Some(encoded)) = (pieces.next(), pieces.next(), pieces.next()) else {
        return value.to_string();
    };

    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%'
            && let Some(byte) = bytes.get(index + 1..index + 3).and_then(hex_byte)
        {
            decoded.push(byte);
            index += 3;
            continue;
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::{ContentDisposition, PartHeaders};
    use http::HeaderName;
    use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};

    #[test]
    fn headers_are_case_insensitive() {
        let headers = PartHeaders::parse(b"Content-Disposition: form-data; name=\"a\"\r\nCONTENT-TYPE: text/plain\r\n\r\n");
        assert_eq!(headers.get(&CONTENT_DISPOSITION).as_deref(), Some("form-data; name=\"a\""));
        assert_eq!(headers.get(&CONTENT_TYPE).as_deref(), Some("text/plain"));
        assert_eq!(headers.get(&HeaderName::from_static("x-missing")), None);
    }

    #[test]
    fn header_value_keeps_later_colons() {
        let headers = PartHeaders::parse(b"X-Url: http://example.com:8080/\r\n\r\n");
        assert_eq!(headers.get(&HeaderName::from_static("x-url")).as_deref(), Some("http://example.com:8080/"));
    }

    #[test]
    fn lines_without_colon_are_skipped() {
        let headers = PartHeaders::parse(b"no colon line\r\nContent-Type: text/plain\r\n\r\n");
        assert_eq!(headers.get(&CONTENT_TYPE).as_deref(), Some("text/plain"));
    }

    #[test]
    fn invalid_header_name_is_skipped() {
        let headers = PartHeaders::parse(b"Bad Name: x\r\nContent-Type: text/plain\r\n\r\n");
        assert_eq!(headers.get(&CONTENT_TYPE).as_deref(), Some("text/plain"));
        assert_eq!(headers.inner.len(), 1);
    }

    #[test]
    fn bare_line_feeds_and_utf8_values() {
        let headers = PartHeaders::parse("Content-Disposition: form-data; name=\"f\"; filename=\"ñandú.txt\"\n\n".as_bytes());
        assert_eq!(headers.get(&CONTENT_DISPOSITION).as_deref(), Some("form-data; name=\"f\"; filename=\"ñandú.txt\""));
    }

    #[test]
    fn disposition_quoted() {
        let disposition = ContentDisposition::parse(r#"form-data; name="file"; filename="a.txt""#);
        assert_eq!(disposition.name.as_deref(), Some("file"));
        assert_eq!(disposition.filename.as_deref(), Some("a.txt"));
    }

    #[test]
    fn disposition_bare_values() {
        let disposition = ContentDisposition::parse("form-data; name=comment");
        assert_eq!(disposition.name.as_deref(), Some("comment"));
        assert_eq!(disposition.filename, None);
    }

    #[test]
    fn disposition_semicolon_inside_quotes() {
        let disposition = ContentDisposition::parse(r#"form-data; name="a"; filename="x;y \"z\".txt""#);
        assert_eq!(disposition.filename.as_deref(), Some(r#"x;y "z".txt"#));
    }

    #[test]
    fn disposition_extended_filename() {
        let disposition = ContentDisposition::parse("form-data; name=doc; filename*=UTF-8''na%C3%AFve.txt");
        assert_eq!(disposition.filename.as_deref(), Some("naïve.txt"));

        let disposition = ContentDisposition::parse(r#"form-data; name=doc; filename="plain.txt"; filename*=UTF-8''other.txt"#);
        assert_eq!(disposition.filename.as_deref(), Some("plain.txt"));
    }

    #[test]
    fn disposition_without_name() {
        let disposition = ContentDisposition::parse("form-data; filename=\"a.txt\"");
        assert_eq!(disposition.name, None);
    }
}
