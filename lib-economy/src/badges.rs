//! Badge table and monotonic evaluation
//!
//! The table is fixed and ordered. Evaluation appends every badge whose
//! condition holds and which is not yet held; held badges are never removed,
//! even if a later purchase drops the point balance below the threshold.

use serde::Serialize;

use crate::types::{Category, DonorStats};

/// What unlocks a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum BadgeCondition {
    DonationCount(u64),
    Points(u64),
    CategoryCount(Category, u64),
}

impl BadgeCondition {
    pub fn holds(&self, stats: &DonorStats) -> bool {
        match *self {
            BadgeCondition::DonationCount(min) => stats.donation_count >= min,
            BadgeCondition::Points(min) => stats.points >= min,
            BadgeCondition::CategoryCount(category, min) => {
                stats.category_counts.get(category) >= min
            }
        }
    }
}

/// Badge definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub tier: &'static str,
    pub description: &'static str,
    pub criteria: &'static str,
    pub condition: BadgeCondition,
}

impl Badge {
    /// Image path relative to the asset base URL
    pub fn image_path(&self) -> String {
        format!("badges/{}.png", self.id)
    }
}

pub const BADGES: &[Badge] = &[
    Badge {
        id: "first_donation",
        name: "First Donation",
        tier: "basic",
        description: "Completed a first donation",
        criteria: "donation count >= 1",
        condition: BadgeCondition::DonationCount(1),
    },
    Badge {
        id: "bronze_donor",
        name: "Bronze Donor",
        tier: "bronze",
        description: "Earned 10,000 points",
        criteria: "points >= 10000",
        condition: BadgeCondition::Points(10_000),
    },
    Badge {
        id: "silver_donor",
        name: "Silver Donor",
        tier: "silver",
        description: "Earned 50,000 points",
        criteria: "points >= 50000",
        condition: BadgeCondition::Points(50_000),
    },
    Badge {
        id: "gold_donor",
        name: "Gold Donor",
        tier: "gold",
        description: "Earned 100,000 points",
        criteria: "points >= 100000",
        condition: BadgeCondition::Points(100_000),
    },
    Badge {
        id: "frequent_donor",
        name: "Frequent Donor",
        tier: "silver",
        description: "Donated 5 times",
        criteria: "donation count >= 5",
        condition: BadgeCondition::DonationCount(5),
    },
    Badge {
        id: "generous_donor",
        name: "Generous Donor",
        tier: "gold",
        description: "Donated 10 times",
        criteria: "donation count >= 10",
        condition: BadgeCondition::DonationCount(10),
    },
    Badge {
        id: "environment_guardian",
        name: "Environment Guardian",
        tier: "special",
        description: "Donated to environment campaigns 3 times",
        criteria: "environment donations >= 3",
        condition: BadgeCondition::CategoryCount(Category::Environment, 3),
    },
    Badge {
        id: "education_supporter",
        name: "Education Supporter",
        tier: "special",
        description: "Donated to education campaigns 5 times",
        criteria: "education donations >= 5",
        condition: BadgeCondition::CategoryCount(Category::Education, 5),
    },
    Badge {
        id: "animal_friend",
        name: "Animal Friend",
        tier: "special",
        description: "Donated to animal campaigns 5 times",
        criteria: "animal donations >= 5",
        condition: BadgeCondition::CategoryCount(Category::Animal, 5),
    },
];

/// Look up a badge by id
pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// Badges that `stats` unlocks and `held` does not contain, in table order
pub fn evaluate_badges(stats: &DonorStats, held: &[String]) -> Vec<&'static Badge> {
    BADGES
        .iter()
        .filter(|b| b.condition.holds(stats) && !held.iter().any(|h| h == b.id))
        .collect()
}

/// Append newly unlocked badges to `held` and return them
pub fn award_badges(stats: &DonorStats, held: &mut Vec<String>) -> Vec<&'static Badge> {
    let unlocked = evaluate_badges(stats, held);
    held.extend(unlocked.iter().map(|b| b.id.to_string()));
    unlocked
}
