//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::{borrow::Borrow, fmt};

use serde::Serialize;
use uuid::Uuid;

/// Server-assigned display identifier of a connected client.
///
/// Only the name allocator creates these, so the `u` + digits format holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a name produced by the allocator.
    pub(crate) fn generated(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for DisplayName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-connection identity assigned by the transport when a socket is upgraded.
///
/// Unique for the lifetime of the process, so a client reconnecting from the same
/// address never collides with its previous, possibly not yet removed, session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
