//! Persistent records

use chrono::{SecondsFormat, Utc};
use lib_crypto::Address;
use lib_economy::{Category, CategoryCounts, DonorStats};
use lib_identity::{UserProfile, VerifiableCredential, WalletType};
use serde::{Deserialize, Serialize};

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Addresses are stored lower-cased so equality filters match
pub(crate) mod address_lower {
    use lib_crypto::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_lowercase_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Wei amounts exceed JSON's safe integer range; stored as decimal strings
pub(crate) mod wei_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(wei: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&wei.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(u128::from(n)),
        }
    }
}

/// A village user, keyed by lower-cased wallet address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(with = "address_lower")]
    pub wallet_address: Address,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub did: String,
    pub wallet_type: WalletType,
    #[serde(default)]
    pub is_organization: bool,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub donation_count: u64,
    #[serde(default)]
    pub category_counts: CategoryCounts,
    /// Awarded badge ids, in award order
    #[serde(default)]
    pub badges: Vec<String>,
    /// Owned furniture ids, in purchase order
    #[serde(default)]
    pub furniture: Vec<String>,
    /// Lower-cased hashes of donations already counted in `points`
    #[serde(default)]
    pub credited_tx_hashes: Vec<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub created_at: String,
}

impl UserRecord {
    pub fn new(
        wallet_address: Address,
        email: String,
        name: Option<String>,
        did: String,
        wallet_type: WalletType,
        is_organization: bool,
    ) -> Self {
        Self {
            wallet_address,
            email,
            name,
            did,
            wallet_type,
            is_organization,
            points: 0,
            donation_count: 0,
            category_counts: CategoryCounts::default(),
            badges: Vec::new(),
            furniture: Vec::new(),
            credited_tx_hashes: Vec::new(),
            version: 0,
            created_at: now_rfc3339(),
        }
    }

    /// Fresh record for a logged-in profile
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self::new(
            profile.wallet_address,
            profile.email.clone(),
            profile.name.clone(),
            profile.did.clone(),
            profile.wallet_type,
            profile.is_organization,
        )
    }

    /// Storage key
    pub fn key(&self) -> String {
        self.wallet_address.to_lowercase_hex()
    }

    pub fn has_credited(&self, tx_hash: &str) -> bool {
        self.credited_tx_hashes.iter().any(|h| h.eq_ignore_ascii_case(tx_hash))
    }

    /// Badge evaluation inputs
    pub fn stats(&self) -> DonorStats {
        DonorStats {
            points: self.points,
            donation_count: self.donation_count,
            category_counts: self.category_counts,
        }
    }
}

/// Fundraising campaign; amounts are KRW
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Campaign {
    pub id: String,
    pub organization_name: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub goal_amount: u64,
    pub current_amount: u64,
    /// Amount set by the admin at creation, before any verified donation
    #[serde(default)]
    pub opening_amount: u64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub house_color: String,
    #[serde(default)]
    pub organization_address: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    /// Campaign id inside the donation contract
    #[serde(default)]
    pub onchain_id: Option<u64>,
    /// Lower-cased hashes of donations already added to `current_amount`
    #[serde(default)]
    pub credited_tx_hashes: Vec<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub created_at: String,
}

impl Campaign {
    /// Progress towards the goal in percent, capped at 100
    pub fn progress_percent(&self) -> u8 {
        if self.goal_amount == 0 {
            return 100;
        }
        let pct = u128::from(self.current_amount) * 100 / u128::from(self.goal_amount);
        pct.min(100) as u8
    }

    pub fn has_credited(&self, tx_hash: &str) -> bool {
        self.credited_tx_hashes.iter().any(|h| h.eq_ignore_ascii_case(tx_hash))
    }
}

/// Admin input for creating a campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCampaign {
    pub organization_name: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub goal_amount: u64,
    #[serde(default)]
    pub opening_amount: u64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub house_color: String,
    #[serde(default)]
    pub organization_address: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub onchain_id: Option<u64>,
}

impl NewCampaign {
    /// Materialize with a fresh id
    pub fn into_campaign(self) -> Campaign {
        Campaign {
            id: uuid::Uuid::new_v4().to_string(),
            organization_name: self.organization_name,
            title: self.title,
            description: self.description,
            category: self.category,
            goal_amount: self.goal_amount,
            current_amount: self.opening_amount,
            opening_amount: self.opening_amount,
            image_url: self.image_url,
            house_color: self.house_color,
            organization_address: self.organization_address,
            deadline: self.deadline,
            onchain_id: self.onchain_id,
            credited_tx_hashes: Vec::new(),
            version: 0,
            created_at: now_rfc3339(),
        }
    }
}

/// Admin edit; `None` leaves a field unchanged
///
/// The current amount is not editable: it only moves through verified
/// donations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CampaignUpdate {
    pub organization_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub goal_amount: Option<u64>,
    pub image_url: Option<String>,
    pub house_color: Option<String>,
    pub organization_address: Option<String>,
    pub deadline: Option<String>,
    pub onchain_id: Option<u64>,
}

impl CampaignUpdate {
    pub fn apply(&self, campaign: &mut Campaign) {
        if let Some(v) = &self.organization_name {
            campaign.organization_name = v.clone();
        }
        if let Some(v) = &self.title {
            campaign.title = v.clone();
        }
        if let Some(v) = &self.description {
            campaign.description = v.clone();
        }
        if let Some(v) = self.category {
            campaign.category = v;
        }
        if let Some(v) = self.goal_amount {
            campaign.goal_amount = v;
        }
        if let Some(v) = &self.image_url {
            campaign.image_url = v.clone();
        }
        if let Some(v) = &self.house_color {
            campaign.house_color = v.clone();
        }
        if let Some(v) = &self.organization_address {
            campaign.organization_address = Some(v.clone());
        }
        if let Some(v) = &self.deadline {
            campaign.deadline = Some(v.clone());
        }
        if let Some(v) = self.onchain_id {
            campaign.onchain_id = Some(v);
        }
    }
}

/// A verified donation
///
/// Written once per transaction hash. Only `credited` changes afterwards,
/// from `false` to `true`, once the donor's points and the campaign amount
/// both include it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Donation {
    pub id: String,
    pub campaign_id: String,
    #[serde(with = "address_lower")]
    pub donor_address: Address,
    /// Wei
    #[serde(with = "wei_string")]
    pub amount: u128,
    /// KRW credited to the campaign
    #[serde(default)]
    pub krw_amount: u64,
    #[serde(default)]
    pub message: String,
    /// Lower-cased `0x` transaction hash, unique
    pub tx_hash: String,
    #[serde(default)]
    pub onchain_donation_id: Option<String>,
    /// Category of the matched campaign; absent when the on-chain campaign is unknown here
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub certificate_url: Option<String>,
    pub created_at: String,
    /// Rows written before this column existed were credited in full
    #[serde(default = "credited_by_default")]
    pub credited: bool,
}

fn credited_by_default() -> bool {
    true
}

/// Stored credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRow {
    pub did: String,
    pub credential: VerifiableCredential,
    pub created_at: String,
}

/// Result of reconciling a campaign's amount with its donations
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CampaignAudit {
    pub campaign_id: String,
    pub opening_amount: u64,
    pub credited_amount: u64,
    pub current_amount: u64,
    pub donation_count: usize,
}

impl CampaignAudit {
    /// `current_amount` never exceeds what the recorded donations explain
    pub fn is_consistent(&self) -> bool {
        self.current_amount <= self.opening_amount.saturating_add(self.credited_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_uses_lowercase_address() {
        let address: Address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap();
        let user = UserRecord::new(
            address,
            "a@b.c".to_string(),
            None,
            "did:ethr:arbitrum-sepolia:0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            WalletType::Embedded,
            false,
        );
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["wallet_address"], "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert_eq!(json["wallet_type"], "embedded");
        assert_eq!(user.key(), "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
    }

    #[test]
    fn test_minimal_user_row_fills_defaults() {
        let json = serde_json::json!({
            "wallet_address": "0x0000000000000000000000000000000000000001",
            "email": "x@y.z",
            "did": "did:ethr:arbitrum-sepolia:0x0000000000000000000000000000000000000001",
            "wallet_type": "metamask"
        });
        let user: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(user.points, 0);
        assert!(user.badges.is_empty());
        assert_eq!(user.version, 0);
    }

    #[test]
    fn test_donation_amount_roundtrips_as_string() {
        let donation = Donation {
            id: "d1".to_string(),
            campaign_id: "c1".to_string(),
            donor_address: Address::ZERO,
            amount: 123_456_789_000_000_000_000_000,
            krw_amount: 0,
            message: String::new(),
            tx_hash: "0xab".to_string(),
            onchain_donation_id: None,
            category: Some(Category::Animal),
            certificate_url: None,
            created_at: now_rfc3339(),
            credited: false,
        };
        let json = serde_json::to_value(&donation).unwrap();
        assert_eq!(json["amount"], "123456789000000000000000");
        let back: Donation = serde_json::from_value(json).unwrap();
        assert_eq!(back.amount, donation.amount);
        assert!(!back.credited);
    }

    #[test]
    fn test_numeric_amount_is_accepted() {
        let json = serde_json::json!({
            "id": "d1", "campaign_id": "c1",
            "donor_address": "0x0000000000000000000000000000000000000000",
            "amount": 1000, "tx_hash": "0xab", "category": "education",
            "created_at": "2024-01-01T00:00:00.000Z"
        });
        let donation: Donation = serde_json::from_value(json).unwrap();
        assert_eq!(donation.amount, 1000);
        assert!(donation.credited);
    }

    #[test]
    fn test_credited_hash_lookup_ignores_case() {
        let mut user = UserRecord::new(
            Address([3; 20]),
            "c@d.e".to_string(),
            None,
            "did:ethr:arbitrum-sepolia:0x0303030303030303030303030303030303030303".to_string(),
            WalletType::Embedded,
            false,
        );
        assert!(!user.has_credited("0xabcd"));
        user.credited_tx_hashes.push("0xabcd".to_string());
        assert!(user.has_credited("0xABCD"));
    }

    #[test]
    fn test_campaign_update_skips_none() {
        let mut campaign = NewCampaign {
            organization_name: "Org".to_string(),
            title: "Old".to_string(),
            description: "d".to_string(),
            category: Category::Animal,
            goal_amount: 1_000_000,
            opening_amount: 5_000,
            image_url: String::new(),
            house_color: "#fff".to_string(),
            organization_address: None,
            deadline: None,
            onchain_id: None,
        }
        .into_campaign();
        assert_eq!(campaign.current_amount, 5_000);

        CampaignUpdate {
            title: Some("New".to_string()),
            goal_amount: Some(2_000_000),
            ..Default::default()
        }
        .apply(&mut campaign);
        assert_eq!(campaign.title, "New");
        assert_eq!(campaign.goal_amount, 2_000_000);
        assert_eq!(campaign.organization_name, "Org");
        assert_eq!(campaign.progress_percent(), 0);
    }

    #[test]
    fn test_audit_consistency() {
        let audit = CampaignAudit {
            campaign_id: "c".to_string(),
            opening_amount: 100,
            credited_amount: 50,
            current_amount: 150,
            donation_count: 1,
        };
        assert!(audit.is_consistent());
        assert!(!CampaignAudit { current_amount: 151, ..audit }.is_consistent());
    }
}
