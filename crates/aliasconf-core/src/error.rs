//! Error types for aliasconf
//!
//! Errors are structured: a kind, the dotted config path where the error
//! occurred, an optional underlying cause and an actionable help message.

use std::fmt;

/// Result type alias for aliasconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for aliasconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "python.aliases")
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Top-level build input was not a mapping
    #[error("Configuration root must be a mapping, got {found}")]
    InvalidRoot { found: String },
    /// An `aliases` entry was not a sequence of strings
    #[error("Invalid aliases entry")]
    InvalidAliases,
    /// The same child was attached twice, or to two parents
    #[error("Duplicate edge: node {child} is already attached")]
    DuplicateEdge { child: usize },
    /// A lookup path could not be interpreted as an ordered sequence of segments
    #[error("Invalid lookup path: {path}")]
    InvalidPath { path: String },
    /// Nothing matched a lookup
    #[error("Not found")]
    NotFound,
    /// Type coercion failed
    #[error("Type coercion failed")]
    TypeCoercion,
    /// Error parsing YAML/JSON or a named token
    #[error("Parse error")]
    Parse,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            help: None,
            cause: None,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create an invalid root error for a non-mapping build input
    pub fn invalid_root(found: impl Into<String>) -> Self {
        Self {
            help: Some("Wrap the configuration in a top-level mapping".into()),
            ..Self::from_kind(ErrorKind::InvalidRoot {
                found: found.into(),
            })
        }
    }

    /// Create an invalid aliases error for the node at `path`
    pub fn invalid_aliases(path: impl Into<String>, got: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            help: Some("'aliases' must be a list of strings, e.g. aliases: [py, python3]".into()),
            cause: Some(format!("Got: {}", got.into())),
            ..Self::from_kind(ErrorKind::InvalidAliases)
        }
    }

    /// Create a duplicate edge error
    pub fn duplicate_edge(child: usize, path: Option<String>) -> Self {
        Self {
            path,
            help: Some("This is likely a bug in aliasconf. Please report it.".into()),
            ..Self::from_kind(ErrorKind::DuplicateEdge { child })
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            help: Some("Use dot-separated, non-empty segments such as 'python.run'".into()),
            cause: Some(reason.into()),
            ..Self::from_kind(ErrorKind::InvalidPath { path: path.into() })
        }
    }

    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            help: Some(format!(
                "Check that '{}' exists in the configuration or is declared as an alias",
                path_str
            )),
            path: Some(path_str),
            ..Self::from_kind(ErrorKind::NotFound)
        }
    }

    /// Create a type coercion error
    pub fn type_coercion(
        path: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self {
            path: Some(path.into()),
            help: Some(format!(
                "Ensure the value can be converted to {}",
                expected.into()
            )),
            cause: Some(format!("Got: {}", got.into())),
            ..Self::from_kind(ErrorKind::TypeCoercion)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this error only means "nothing matched"
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
