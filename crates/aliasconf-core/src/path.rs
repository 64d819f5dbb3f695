//! Lookup paths
//!
//! A lookup path is an ordered sequence of segments, e.g. `["py", "run"]`.
//! Callers holding a dotted string go through [`ConfigPath::parse`].

use std::fmt;

use crate::error::{Error, Result};

/// An ordered sequence of lookup segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `python.run`.
    ///
    /// The empty string is the empty path. Empty segments (`a..b`, `.a`,
    /// `a.`) are rejected.
    pub fn parse(dotted: &str) -> Result<Self> {
        if dotted.is_empty() {
            return Ok(Self::default());
        }

        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        if let Some(pos) = segments.iter().position(String::is_empty) {
            return Err(Error::invalid_path(
                dotted,
                format!("empty segment at position {}", pos),
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl AsRef<[String]> for ConfigPath {
    fn as_ref(&self) -> &[String] {
        &self.segments
    }
}

impl std::str::FromStr for ConfigPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
