//! Error classification for retry decisions.
//!
//! The engine never inspects operation errors directly; it asks them for an
//! [`ErrorKind`] and matches that against the kinds configured on a policy.
//! Kinds form a hierarchy through dot-separated paths: `"io.timeout"` IS-A
//! `"io"`, so a policy that retries on `"io"` also retries on `"io.timeout"`.
//! The reverse never holds — a policy listing `"io.timeout"` says nothing
//! about a bare `"io"` error.

use std::borrow::Cow;
use std::fmt;

/// A hierarchical classifier identifying the category of an error.
///
/// An `ErrorKind` is a dot-separated path such as `"net"`, `"net.timeout"`,
/// or `"validation.schema"`. Matching is by whole path segments only:
/// `"io.time"` is **not** an ancestor of `"io.timeout"`.
///
/// # Examples
///
/// ```rust
/// use resurge::ErrorKind;
///
/// let timeout = ErrorKind::from_static("net.timeout");
/// let net = ErrorKind::from_static("net");
///
/// assert!(timeout.is_a(&net));
/// assert!(timeout.is_a(&timeout));
/// assert!(!net.is_a(&timeout));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorKind(Cow<'static, str>);

impl ErrorKind {
    /// Create a kind from a static path. Usable in `const` contexts.
    pub const fn from_static(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Create a kind from an owned or borrowed path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(Cow::Owned(path.into()))
    }

    /// The full dot-separated path of this kind.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this kind is `ancestor` or a descendant of it.
    ///
    /// Exact equality counts as a match, as does any whole-segment prefix:
    /// `"db.conn.reset"` IS-A `"db"` and IS-A `"db.conn"`.
    pub fn is_a(&self, ancestor: &ErrorKind) -> bool {
        let path = self.as_str();
        let prefix = ancestor.as_str();
        if path == prefix {
            return true;
        }
        path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.'
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ErrorKind {
    fn from(path: &'static str) -> Self {
        Self::from_static(path)
    }
}

impl From<String> for ErrorKind {
    fn from(path: String) -> Self {
        Self(Cow::Owned(path))
    }
}

/// Implemented by operation error types so the engine can decide
/// retryability.
///
/// An implementation should return a stable kind per error category; the
/// kind is the only thing the policy sees.
///
/// # Examples
///
/// ```rust
/// use resurge::{Classify, ErrorKind};
///
/// #[derive(Debug)]
/// enum StoreError {
///     ConnectionReset,
///     SchemaViolation,
/// }
///
/// impl Classify for StoreError {
///     fn kind(&self) -> ErrorKind {
///         match self {
///             StoreError::ConnectionReset => ErrorKind::from_static("db.conn"),
///             StoreError::SchemaViolation => ErrorKind::from_static("validation"),
///         }
///     }
/// }
/// ```
pub trait Classify {
    /// The classifier for this error.
    fn kind(&self) -> ErrorKind;
}
