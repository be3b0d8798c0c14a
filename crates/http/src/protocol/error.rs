use thiserror::Error;

/// Errors raised while turning raw request bytes into a [`Body`](crate::protocol::Body).
///
/// Two families exist: content-parsing failures (the payload is malformed) and
/// limit failures (the payload is well formed but exceeds a configured bound).
/// Use [`DecodeError::is_limit_exceeded`] to tell them apart.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid json body: {reason}")]
    InvalidJson { reason: String },

    #[error("invalid xml body: {reason}")]
    InvalidXml { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("multipart boundary is missing from content-type: {content_type:?}")]
    MissingBoundary { content_type: String },

    #[error("multipart parts number {current} exceed the limit {max_parts}")]
    TooManyParts { current: usize, max_parts: usize },

    #[error("multipart header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("multipart field '{field}' size too large, current: {current_size} exceed the limit {max_size}")]
    FieldTooLarge { field: String, current_size: usize, max_size: usize },

    #[error("multipart file '{field}' size too large, current: {current_size} exceed the limit {max_size}")]
    FileTooLarge { field: String, current_size: usize, max_size: usize },
}

impl DecodeError {
    pub fn invalid_json<S: ToString>(str: S) -> Self {
        Self::InvalidJson { reason: str.to_string() }
    }

    pub fn invalid_xml<S: ToString>(str: S) -> Self {
        Self::InvalidXml { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn missing_boundary<S: ToString>(content_type: S) -> Self {
        Self::MissingBoundary { content_type: content_type.to_string() }
    }

    pub fn too_many_parts(current: usize, max_parts: usize) -> Self {
        Self::TooManyParts { current, max_parts }
    }

    pub fn header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn field_too_large<S: ToString>(field: S, current_size: usize, max_size: usize) -> Self {
        Self::FieldTooLarge { field: field.to_string(), current_size, max_size }
    }

    pub fn file_too_large<S: ToString>(field: S, current_size: usize, max_size: usize) -> Self {
        Self::FileTooLarge { field: field.to_string(), current_size, max_size }
    }

    /// Returns `true` when the payload was rejected because it exceeded a configured limit
    /// rather than because it was malformed.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            Self::TooManyParts { .. }
                | Self::HeaderTooLarge { .. }
                | Self::FieldTooLarge { .. }
                | Self::FileTooLarge { .. }
        )
    }

    /// The multipart field the failure is attributed to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::FieldTooLarge { field, .. } | Self::FileTooLarge { field, .. } => Some(field),
            _ => None,
        }
    }
}
