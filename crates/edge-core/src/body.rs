//! Single-consumption message bodies.

use std::fmt;

/// Error produced when a body cannot be decoded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BodyError {
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// An owned HTTP message body.
///
/// A body can be read exactly once: every reader takes `self` by value.
/// Code that needs the same payload twice (hashing and forwarding, or
/// responding and caching) must call [`Body::tee`] before reading.
pub struct Body {
    bytes: Vec<u8>,
}

impl Body {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create a body from bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Whether the body has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Split into two independent readable copies of the same content.
    pub fn tee(self) -> (Body, Body) {
        let copy = Body {
            bytes: self.bytes.clone(),
        };
        (self, copy)
    }

    /// Consume the body, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Consume the body as UTF-8 text.
    pub fn text(self) -> Result<String, BodyError> {
        String::from_utf8(self.bytes).map_err(|e| BodyError::InvalidUtf8(e.to_string()))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("len", &self.bytes.len()).finish()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}
