//! Supabase (PostgREST) village store
//!
//! Rows map one-to-one onto the record structs. Conditional updates add a
//! `version=eq.N` filter and ask for `return=representation`: an empty result
//! means another writer got there first. Donation inserts use
//! `on_conflict=tx_hash` with `resolution=ignore-duplicates`, so only the first
//! insert of a transaction hash returns a row.

use std::time::Duration;

use async_trait::async_trait;
use lib_crypto::Address;
use lib_identity::VerifiableCredential;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::traits::VillageStore;
use crate::errors::{Result, StorageError};
use crate::types::records::now_rfc3339;
use crate::types::{Campaign, CredentialRow, Donation, UserRecord};

const USERS_TABLE: &str = "users";
const CAMPAIGNS_TABLE: &str = "campaigns";
const DONATIONS_TABLE: &str = "donations";
const CREDENTIALS_TABLE: &str = "credentials";

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=representation";

/// Store backed by a hosted Supabase project
#[derive(Clone, Debug)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
}

impl SupabaseStore {
    /// Build a client for `project_url` authenticated with the service-role key
    pub fn new(project_url: &str, service_role_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = project_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StorageError::Config("supabase_url is empty".to_string()));
        }
        if service_role_key.trim().is_empty() {
            return Err(StorageError::Config("service_role_key is empty".to_string()));
        }

        let key = HeaderValue::from_str(service_role_key.trim())
            .map_err(|e| StorageError::Config(format!("invalid service role key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_role_key.trim()))
            .map_err(|e| StorageError::Config(format!("invalid service role key: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// REST endpoint of a table
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client.request(method, self.table_url(table))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Supabase request failed");
        Err(StorageError::Remote {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        Self::rows(self.request(Method::GET, table).query(query)).await
    }

    async fn insert<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
        on_conflict: Option<&str>,
    ) -> Result<Vec<R>> {
        let mut request = self.request(Method::POST, table);
        request = match on_conflict {
            Some(column) => request
                .query(&[("on_conflict", column)])
                .header("Prefer", PREFER_IGNORE_DUPLICATES),
            None => request.header("Prefer", PREFER_REPRESENTATION),
        };
        Self::rows(request.json(row)).await
    }

    async fn conditional_update<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        expected_version: u64,
        next: &T,
    ) -> Result<T> {
        let request = self
            .request(Method::PATCH, table)
            .query(&[
                (key_column, format!("eq.{}", key)),
                ("version", format!("eq.{}", expected_version)),
            ])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(next);
        let mut updated: Vec<T> = Self::rows(request).await?;
        match updated.pop() {
            Some(row) => Ok(row),
            None => {
                debug!(table, key, expected_version, "Conditional update matched no row");
                Err(StorageError::CasConflict)
            }
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl VillageStore for SupabaseStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn get_user(&self, address: &Address) -> Result<Option<UserRecord>> {
        let mut rows: Vec<UserRecord> = self
            .select(
                USERS_TABLE,
                &[("wallet_address", eq(address.to_lowercase_hex())), ("select", "*".to_string())],
            )
            .await?;
        Ok(rows.pop())
    }

    async fn create_user_if_absent(&self, user: &UserRecord) -> Result<UserRecord> {
        let mut fresh = user.clone();
        fresh.version = 0;
        let mut inserted: Vec<UserRecord> = self
            .insert(USERS_TABLE, &[&fresh], Some("wallet_address"))
            .await?;
        if let Some(row) = inserted.pop() {
            return Ok(row);
        }
        self.get_user(&user.wallet_address)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                kind: "user",
                id: user.key(),
            })
    }

    async fn compare_and_swap_user(
        &self,
        expected_version: u64,
        updated: &UserRecord,
    ) -> Result<UserRecord> {
        let mut next = updated.clone();
        next.version = expected_version + 1;
        self.conditional_update(USERS_TABLE, "wallet_address", &next.key(), expected_version, &next)
            .await
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.select(
            CAMPAIGNS_TABLE,
            &[("select", "*".to_string()), ("order", "created_at.desc".to_string())],
        )
        .await
    }

    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let mut rows: Vec<Campaign> = self
            .select(CAMPAIGNS_TABLE, &[("id", eq(id)), ("select", "*".to_string())])
            .await?;
        Ok(rows.pop())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign> {
        let mut rows: Vec<Campaign> = self.insert(CAMPAIGNS_TABLE, &[campaign], None).await?;
        rows.pop().ok_or_else(|| {
            StorageError::WriteFailed(format!("campaign insert returned no row: {}", campaign.id))
        })
    }

    async fn compare_and_swap_campaign(
        &self,
        expected_version: u64,
        updated: &Campaign,
    ) -> Result<Campaign> {
        let mut next = updated.clone();
        next.version = expected_version + 1;
        self.conditional_update(CAMPAIGNS_TABLE, "id", &next.id, expected_version, &next)
            .await
    }

    async fn delete_campaign(&self, id: &str) -> Result<bool> {
        let request = self
            .request(Method::DELETE, CAMPAIGNS_TABLE)
            .query(&[("id", eq(id))])
            .header("Prefer", PREFER_REPRESENTATION);
        let deleted: Vec<serde_json::Value> = Self::rows(request).await?;
        Ok(!deleted.is_empty())
    }

    async fn insert_donation_if_absent(&self, donation: &Donation) -> Result<bool> {
        let mut row = donation.clone();
        row.tx_hash = row.tx_hash.to_lowercase();
        let inserted: Vec<serde_json::Value> =
            self.insert(DONATIONS_TABLE, &[&row], Some("tx_hash")).await?;
        Ok(!inserted.is_empty())
    }

    async fn get_donation_by_tx(&self, tx_hash: &str) -> Result<Option<Donation>> {
        let mut rows: Vec<Donation> = self
            .select(
                DONATIONS_TABLE,
                &[("tx_hash", eq(tx_hash.to_lowercase())), ("select", "*".to_string())],
            )
            .await?;
        Ok(rows.pop())
    }

    async fn mark_donation_credited(&self, tx_hash: &str) -> Result<bool> {
        let key = tx_hash.to_lowercase();
        let request = self
            .request(Method::PATCH, DONATIONS_TABLE)
            .query(&[("tx_hash", eq(&key)), ("credited", eq(false))])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&serde_json::json!({ "credited": true }));
        let flipped: Vec<serde_json::Value> = Self::rows(request).await?;
        if !flipped.is_empty() {
            return Ok(true);
        }
        match self.get_donation_by_tx(&key).await? {
            Some(_) => Ok(false),
            None => Err(StorageError::NotFound {
                kind: "donation",
                id: key,
            }),
        }
    }

    async fn list_donations_for_campaign(&self, campaign_id: &str) -> Result<Vec<Donation>> {
        self.select(
            DONATIONS_TABLE,
            &[
                ("campaign_id", eq(campaign_id)),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_donations_for_donor(&self, donor: &Address) -> Result<Vec<Donation>> {
        self.select(
            DONATIONS_TABLE,
            &[
                ("donor_address", eq(donor.to_lowercase_hex())),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn append_credential(&self, did: &str, credential: &VerifiableCredential) -> Result<()> {
        let row = CredentialRow {
            did: did.to_string(),
            credential: credential.clone(),
            created_at: now_rfc3339(),
        };
        let _: Vec<serde_json::Value> = self.insert(CREDENTIALS_TABLE, &[&row], None).await?;
        Ok(())
    }

    async fn list_credentials(&self, did: &str) -> Result<Vec<VerifiableCredential>> {
        let rows: Vec<CredentialRow> = self
            .select(
                CREDENTIALS_TABLE,
                &[
                    ("did", eq(did)),
                    ("select", "did,credential,created_at".to_string()),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.credential).collect())
    }
}
