use serde::Deserialize;

const DEFAULT_MAX_PARTS: usize = 1000;
const DEFAULT_MAX_FIELD_SIZE: usize = 1024 * 1024;
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;

/// Limits enforced by the [`MultipartDecoder`](super::MultipartDecoder).
///
/// Sizes are in bytes. Missing keys fall back to the defaults when deserialized:
///
/// ```
/// use relay_http::codec::MultipartConfig;
///
/// let config: MultipartConfig = serde_json::from_str(r#"{"max_file_size": 1024}"#).unwrap();
/// assert_eq!(config.max_file_size(), 1024);
/// assert_eq!(config.max_parts(), MultipartConfig::default().max_parts());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MultipartConfig {
    max_parts: usize,
    max_field_size: usize,
    max_file_size: usize,
    max_header_size: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_parts: DEFAULT_MAX_PARTS,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

impl MultipartConfig {
    #[must_use]
    pub fn with_max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = max_parts;
        self
    }

    #[must_use]
    pub fn with_max_field_size(mut self, max_field_size: usize) -> Self {
        self.max_field_size = max_field_size;
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn with_max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    pub fn max_parts(&self) -> usize {
        self.max_parts
    }

    pub fn max_field_size(&self) -> usize {
        self.max_field_size
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }
}
