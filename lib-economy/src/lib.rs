//! Donation Village Economics
//!
//! Pure rules for the village economy: no storage, no network.
//!
//! - Points: donations earn 1 point per 0.001 ETH
//! - Campaign bookkeeping: wei converted to KRW at a fixed rate
//! - Badges: fixed table, awarded monotonically
//! - Furniture: fixed catalog bought with points

pub mod badges;
pub mod furniture;
pub mod points;
pub mod types;

pub use badges::{award_badges, badge, evaluate_badges, Badge, BadgeCondition, BADGES};
pub use furniture::{
    check_purchase, purchase, FurnitureItem, FurnitureKind, Purchase, PurchaseError, CATALOG,
};
pub use points::{format_ether, krw_to_wei, points_for_wei, wei_to_krw, KRW_PER_ETH, WEI_PER_ETH, WEI_PER_POINT};
pub use types::{Category, CategoryCounts, DonorStats};
