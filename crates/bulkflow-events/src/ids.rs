//! Identifier newtypes shared by the workflow crates.
//!
//! # Design
//! - Item and action ids are opaque strings; integers are accepted and
//!   rendered in decimal so `2` and `"2"` name the same item.
//! - Ids order lexicographically, which keeps selection snapshots stable.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an item in the caller's collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Build an id from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for ItemId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

/// Stable identifier for a batch action (`archive`, `delete`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Build an action id from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier assigned to each batch job when it starts running.
pub type JobId = Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_string_ids_are_equal() {
        assert_eq!(ItemId::from(42_u64), ItemId::from("42"));
        assert_eq!(ItemId::new("sku-1").as_str(), "sku-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ItemId::from(7_u32)).unwrap();
        assert_eq!(json, "\"7\"");
        let action: ActionId = serde_json::from_str("\"archive\"").unwrap();
        assert_eq!(action.to_string(), "archive");
    }
}
