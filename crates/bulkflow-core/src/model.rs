//! Item snapshots and per-item outcomes shared by the workflow and its runners.

use bulkflow_events::ItemId;
use serde::{Deserialize, Serialize};

/// Display snapshot of one item in the caller's collection.
///
/// The workflow only reads `id`; the remaining fields exist for renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Optional stock-keeping unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Optional status label (`active`, `draft`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Item {
    /// Build an item with only an id and name.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: None,
            status: None,
        }
    }

    /// Attach a SKU.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Attach a status label.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Read the visible item ids in list order.
#[must_use]
pub fn visible_ids(items: &[Item]) -> Vec<ItemId> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// Result of processing a single item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The item was processed.
    Succeeded,
    /// The item could not be processed.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ItemOutcome {
    /// Convenience constructor for failures.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the item was processed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Item that failed during a batch job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Item identifier.
    pub id: ItemId,
    /// Failure reason reported by the operation.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_ids_preserve_list_order() {
        let items = vec![
            Item::new(3_u64, "gamma"),
            Item::new(1_u64, "alpha").with_sku("SKU-1"),
            Item::new(2_u64, "beta").with_status("draft"),
        ];
        let ids = visible_ids(&items);
        assert_eq!(
            ids,
            vec![ItemId::from("3"), ItemId::from("1"), ItemId::from("2")]
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(ItemOutcome::failed("locked")).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "locked");
        assert!(ItemOutcome::Succeeded.is_success());
    }
}
