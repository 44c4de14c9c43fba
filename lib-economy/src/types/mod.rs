//! Core economic types
//!
//! Campaign categories and the per-donor statistics that badge rules read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Campaign category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Animal,
    Environment,
    Education,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Animal, Category::Environment, Category::Education];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Animal => "animal",
            Category::Environment => "environment",
            Category::Education => "education",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "animal" => Ok(Category::Animal),
            "environment" => Ok(Category::Environment),
            "education" => Ok(Category::Education),
            other => Err(format!("Unknown campaign category: {}", other)),
        }
    }
}

/// Donation counts per category
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
    #[serde(default)]
    pub animal: u64,
    #[serde(default)]
    pub environment: u64,
    #[serde(default)]
    pub education: u64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Animal => self.animal,
            Category::Environment => self.environment,
            Category::Education => self.education,
        }
    }

    pub fn increment(&mut self, category: Category) {
        let slot = match category {
            Category::Animal => &mut self.animal,
            Category::Environment => &mut self.environment,
            Category::Education => &mut self.education,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Inputs to badge evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DonorStats {
    pub points: u64,
    pub donation_count: u64,
    pub category_counts: CategoryCounts,
}
