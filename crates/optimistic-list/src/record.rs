//! Record Contract
//!
//! Every list element has a server-assigned integer identity.
//! An id of 0 marks a record the server has not persisted yet.

use serde::{Deserialize, Serialize};

/// Server-assigned record identifier
pub type RecordId = u32;

/// Core trait for records held by a synchronized list
pub trait Record: Clone + PartialEq + std::fmt::Debug + 'static {
    /// Returns the record's identifier (0 = not yet persisted)
    fn id(&self) -> RecordId;

    /// Whether the server has assigned an identity
    fn is_persisted(&self) -> bool {
        self.id() != 0
    }
}

/// User data structure (matches the remote `users` collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
}

impl User {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    /// Unsaved user awaiting a server id
    pub fn draft(name: impl Into<String>) -> Self {
        Self::new(0, name)
    }
}

impl Record for User {
    fn id(&self) -> RecordId {
        self.id
    }
}
