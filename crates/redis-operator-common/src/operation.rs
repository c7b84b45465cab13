//! Verbs issued against the Kubernetes API server

use std::fmt;

/// Object name recorded for operations that have no single target (e.g. LIST)
pub const NOT_APPLICABLE: &str = "-";

/// An operation attempted against the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Fetch a single object
    Get,
    /// Create a new object
    Create,
    /// Replace an existing object (optimistic concurrency on resourceVersion)
    Update,
    /// Partially modify an existing object
    Patch,
    /// Delete an object
    Delete,
    /// Enumerate objects in a namespace
    List,
}

impl Verb {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::List => "LIST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
