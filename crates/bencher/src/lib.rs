//! Shared fixtures for the relay benchmarks.

/// Payloads of at most this many bytes are reported in the `small` group.
const SMALL_LIMIT: usize = 1024;

/// A request body fed to a decoder benchmark, with the `content-type` it is sent with.
#[derive(Debug, Copy, Clone)]
pub struct Payload {
    name: &'static str,
    content_type: &'static str,
    content: &'static [u8],
}

impl Payload {
    pub const fn new(name: &'static str, content_type: &'static str, content: &'static [u8]) -> Self {
        Self { name, content_type, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn size_class(&self) -> SizeClass {
        if self.len() <= SMALL_LIMIT { SizeClass::Small } else { SizeClass::Large }
    }

    /// Benchmark id, e.g. `small/form_small`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.size_class().as_str(), self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Large,
}

impl SizeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }
}
