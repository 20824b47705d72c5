//! Mock product list and action catalog used by the CLI.

use bulkflow_core::{Action, ActionCatalog, ActionVariant, CatalogError, ConfirmPrompt, Item};

/// Products shown in the demo list.
pub(crate) fn products() -> Vec<Item> {
    [
        (1_u64, "Linen shirt", "LIN-001", "active"),
        (2, "Canvas tote", "CAN-014", "active"),
        (3, "Wool scarf", "WOL-220", "draft"),
        (4, "Leather belt", "LEA-031", "active"),
        (5, "Cotton socks", "COT-105", "archived"),
        (6, "Denim jacket", "DEN-402", "draft"),
    ]
    .into_iter()
    .map(|(id, name, sku, status)| Item::new(id, name).with_sku(sku).with_status(status))
    .collect()
}

/// Bulk actions offered on the product list.
pub(crate) fn catalog() -> Result<ActionCatalog, CatalogError> {
    ActionCatalog::new(vec![
        Action::direct("publish", "Publish")
            .with_icon("upload")
            .with_variant(ActionVariant::Primary),
        Action::direct("unpublish", "Unpublish").with_icon("eye-off"),
        Action::confirmed(
            "archive",
            "Archive",
            ConfirmPrompt::new(
                "Archive products",
                "Archive {count} products? They will be hidden from the storefront.",
            )
            .with_confirm_label("Archive"),
        )
        .with_icon("archive"),
        Action::direct("assign_category", "Assign category").with_icon("tag"),
        Action::confirmed(
            "delete",
            "Delete",
            ConfirmPrompt::new(
                "Delete products",
                "Delete {count} products permanently? This cannot be undone.",
            )
            .with_confirm_label("Delete"),
        )
        .with_icon("trash")
        .with_variant(ActionVariant::Destructive),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkflow_core::ActionId;

    #[test]
    fn demo_catalog_is_valid() {
        let catalog = catalog().expect("catalog");
        assert_eq!(catalog.len(), 5);
        assert!(catalog.requires_confirmation(&ActionId::from("archive")));
        assert!(catalog.requires_confirmation(&ActionId::from("delete")));
        assert!(!catalog.requires_confirmation(&ActionId::from("publish")));
    }

    #[test]
    fn demo_products_have_unique_ids() {
        let items = products();
        let mut ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
    }
}
