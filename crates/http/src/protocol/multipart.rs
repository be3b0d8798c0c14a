use std::collections::HashMap;

use bytes::Bytes;
use mime::Mime;

/// The outcome of decoding one `multipart/form-data` payload.
///
/// Text parts are collected into [`fields`](Self::fields) keyed by field name, file parts
/// are kept in [`files`](Self::files) in the order they appeared on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartResult {
    fields: HashMap<String, String>,
    files: Vec<MultipartFile>,
}

impl MultipartResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn files(&self) -> &[MultipartFile] {
        &self.files
    }

    /// The first file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&MultipartFile> {
        self.files.iter().find(|file| file.field_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    pub fn into_parts(self) -> (HashMap<String, String>, Vec<MultipartFile>) {
        (self.fields, self.files)
    }

    /// Records a text field; a later value for the same name replaces the earlier one.
    pub(crate) fn insert_field(&mut self, name: String, value: String) {
        self.fields.insert(name, value);
    }

    pub(crate) fn push_file(&mut self, file: MultipartFile) {
        self.files.push(file);
    }
}

/// A file part of a multipart payload.
///
/// `data` is a view into the original request buffer, no bytes are copied.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartFile {
    field_name: String,
    filename: String,
    content_type: Mime,
    data: Bytes,
}

impl MultipartFile {
    pub fn new(field_name: impl Into<String>, filename: impl Into<String>, content_type: Mime, data: Bytes) -> Self {
        Self { field_name: field_name.into(), filename: filename.into(), content_type, data }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
