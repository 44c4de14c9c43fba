//! Furniture purchases against the point balance

use lib_crypto::Address;
use lib_economy::{check_purchase, FurnitureItem, PurchaseError};
use lib_storage::{retry_cas, CasRetryable, StorageError, VillageStore};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Purchase failure
#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Rejected(#[from] PurchaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Too many concurrent updates, try again")]
    Contention,
}

impl CasRetryable for ShopError {
    fn is_cas_conflict(&self) -> bool {
        matches!(self, ShopError::Storage(StorageError::CasConflict))
    }
}

/// Result of a purchase, as served by `POST /buy-furniture`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub success: bool,
    pub item: FurnitureItem,
    pub remaining_points: u64,
    pub furniture: Vec<String>,
}

/// Buy a catalog item for `user_address`
///
/// The price comes from the catalog; balance and inventory are re-read on
/// every attempt.
pub async fn buy_furniture(
    store: &dyn VillageStore,
    user_address: &str,
    item_id: &str,
) -> Result<PurchaseReceipt, ShopError> {
    let address: Address = user_address
        .trim()
        .parse()
        .map_err(|_| ShopError::InvalidInput(format!("not an address: {}", user_address)))?;
    if item_id.trim().is_empty() {
        return Err(ShopError::InvalidInput("furnitureId is required".to_string()));
    }
    let address = &address;

    let receipt = retry_cas(|| async move {
        let mut user = store
            .get_user(address)
            .await?
            .ok_or_else(|| ShopError::UnknownUser(address.to_lowercase_hex()))?;
        let expected = user.version;

        let purchase = check_purchase(user.points, &user.furniture, item_id)?;
        user.points = purchase.remaining_points;
        user.furniture.push(purchase.item.id.to_string());

        let stored = store.compare_and_swap_user(expected, &user).await?;
        Ok::<_, ShopError>(PurchaseReceipt {
            success: true,
            item: *purchase.item,
            remaining_points: stored.points,
            furniture: stored.furniture,
        })
    })
    .await
    .map_err(|e| if e.is_cas_conflict() { ShopError::Contention } else { e })?;

    info!(
        address = %address,
        item = receipt.item.id,
        remaining = receipt.remaining_points,
        "Furniture purchased"
    );
    Ok(receipt)
}
