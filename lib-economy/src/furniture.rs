//! Furniture catalog and purchase rules
//!
//! Prices are authoritative here; a client-supplied price is never trusted.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Placement class of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureKind {
    Furniture,
    Decoration,
    Flooring,
}

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureItem {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: FurnitureKind,
    pub price: u64,
}

pub const CATALOG: &[FurnitureItem] = &[
    FurnitureItem { id: "f1", name: "Wooden Chair", kind: FurnitureKind::Furniture, price: 5_000 },
    FurnitureItem { id: "f2", name: "Floral Sofa", kind: FurnitureKind::Furniture, price: 15_000 },
    FurnitureItem { id: "f3", name: "Bookshelf", kind: FurnitureKind::Furniture, price: 12_000 },
    FurnitureItem { id: "f4", name: "Potted Plant", kind: FurnitureKind::Decoration, price: 3_000 },
    FurnitureItem { id: "f5", name: "Table Lamp", kind: FurnitureKind::Decoration, price: 6_000 },
    FurnitureItem { id: "f6", name: "Picture Frame", kind: FurnitureKind::Decoration, price: 8_000 },
    FurnitureItem { id: "f7", name: "Rug", kind: FurnitureKind::Flooring, price: 10_000 },
    FurnitureItem { id: "f8", name: "Wall Clock", kind: FurnitureKind::Decoration, price: 10_000 },
    FurnitureItem { id: "f9", name: "Bed", kind: FurnitureKind::Furniture, price: 20_000 },
    FurnitureItem { id: "f10", name: "Desk", kind: FurnitureKind::Furniture, price: 18_000 },
    FurnitureItem { id: "f11", name: "Cactus", kind: FurnitureKind::Decoration, price: 4_000 },
    FurnitureItem { id: "f12", name: "Guitar", kind: FurnitureKind::Decoration, price: 12_000 },
];

/// Purchase rejection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("Unknown furniture item: {0}")]
    UnknownItem(String),

    #[error("Furniture item already owned: {0}")]
    AlreadyOwned(String),

    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: u64, available: u64 },
}

/// Look up a catalog item
pub fn item(id: &str) -> Option<&'static FurnitureItem> {
    CATALOG.iter().find(|i| i.id == id)
}

/// Outcome of a successful purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub item: &'static FurnitureItem,
    pub remaining_points: u64,
}

/// Check a purchase against a balance and inventory without mutating anything
pub fn check_purchase(
    points: u64,
    owned: &[String],
    item_id: &str,
) -> Result<Purchase, PurchaseError> {
    let item = item(item_id).ok_or_else(|| PurchaseError::UnknownItem(item_id.to_string()))?;
    if owned.iter().any(|o| o == item.id) {
        return Err(PurchaseError::AlreadyOwned(item.id.to_string()));
    }
    if points < item.price {
        return Err(PurchaseError::InsufficientPoints {
            required: item.price,
            available: points,
        });
    }
    Ok(Purchase {
        item,
        remaining_points: points - item.price,
    })
}

/// Deduct the price and append the item
pub fn purchase(
    points: &mut u64,
    owned: &mut Vec<String>,
    item_id: &str,
) -> Result<&'static FurnitureItem, PurchaseError> {
    let outcome = check_purchase(*points, owned, item_id)?;
    *points = outcome.remaining_points;
    owned.push(outcome.item.id.to_string());
    debug!(item = outcome.item.id, remaining = *points, "Furniture purchased");
    Ok(outcome.item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(CATALOG.len(), 12);
        assert!(CATALOG.iter().all(|i| (3_000..=20_000).contains(&i.price)));
        assert_eq!(item("f7").map(|i| i.kind), Some(FurnitureKind::Flooring));
    }

    #[test]
    fn test_purchase_deducts_and_appends() {
        let mut points = 7_000;
        let mut owned = Vec::new();
        let bought = purchase(&mut points, &mut owned, "f1").unwrap();
        assert_eq!(bought.price, 5_000);
        assert_eq!(points, 2_000);
        assert_eq!(owned, vec!["f1"]);
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let mut points = 3_000;
        let mut owned = Vec::new();
        purchase(&mut points, &mut owned, "f4").unwrap();
        assert_eq!(points, 0);
    }

    #[test]
    fn test_purchase_rejections_leave_state_untouched() {
        let mut points = 4_000;
        let mut owned = vec!["f11".to_string()];

        assert_eq!(
            purchase(&mut points, &mut owned, "f99").unwrap_err(),
            PurchaseError::UnknownItem("f99".to_string())
        );
        assert_eq!(
            purchase(&mut points, &mut owned, "f11").unwrap_err(),
            PurchaseError::AlreadyOwned("f11".to_string())
        );
        assert_eq!(
            purchase(&mut points, &mut owned, "f9").unwrap_err(),
            PurchaseError::InsufficientPoints {
                required: 20_000,
                available: 4_000
            }
        );
        assert_eq!(points, 4_000);
        assert_eq!(owned, vec!["f11"]);
    }
}
