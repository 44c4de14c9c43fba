//! HTTP request handlers
//!
//! Bodies are camelCase JSON. Errors are `{error, details?}` with the status
//! codes the hosted edge function used.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lib_crypto::Address;
use lib_economy::CATALOG;
use lib_identity::{
    create_did_document, parse_did, verify_credential_json, SessionRecord, UserProfile,
};
use lib_storage::{Campaign, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::accounts::{register_session, user_summary, UserSummary};
use crate::context::AppContext;
use crate::donation::{verify_donation, DonationError, VerificationResult};
use crate::shop::{buy_furniture, PurchaseReceipt, ShopError};

pub type SharedContext = Arc<AppContext>;

// ============================================================================
// Errors
// ============================================================================

/// Error response body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    fn internal(error: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_details(details.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        error!(error = %e, "Storage failure");
        ApiError::internal("Storage error", e)
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_address(raw: &str) -> ApiResult<Address> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid address").with_details(raw.to_string()))
}

// ============================================================================
// Health
// ============================================================================

pub async fn health_handler(State(ctx): State<SharedContext>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "contractAddress": ctx.contract().map(|c| c.to_checksum()).unwrap_or_default(),
        "network": network_name(ctx.chain_id()),
        "backend": ctx.store.backend_name(),
    }))
}

fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        lib_blockchain::ARBITRUM_SEPOLIA_CHAIN_ID => "Arbitrum Sepolia",
        lib_identity::constants::ARBITRUM_ONE_CHAIN_ID => "Arbitrum One",
        _ => "Arbitrum",
    }
}

// ============================================================================
// Donation verification
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDonationRequest {
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub user_address: Option<String>,
}

pub async fn verify_donation_handler(
    State(ctx): State<SharedContext>,
    Json(request): Json<VerifyDonationRequest>,
) -> ApiResult<Response> {
    let (Some(tx_hash), Some(user_address)) = (
        request.tx_hash.filter(|s| !s.is_empty()),
        request.user_address.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request("txHash and userAddress are required"));
    };

    let result = verify_donation(&ctx, &tx_hash, &user_address)
        .await
        .map_err(|e| match e {
            DonationError::InvalidInput(details) => {
                ApiError::bad_request("Invalid request").with_details(details)
            }
            DonationError::ContractNotDeployed => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Contract not deployed")
            }
            other => {
                error!(tx = %tx_hash, error = %other, "Donation verification failed");
                ApiError::internal("Verification failed", other)
            }
        })?;

    let response = match result {
        VerificationResult::Pending => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "pending",
                "message": "Transaction is still being processed"
            })),
        )
            .into_response(),
        VerificationResult::Failed => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "failed", "message": "Transaction failed" })),
        )
            .into_response(),
        VerificationResult::NoDonationEvent => {
            ApiError::bad_request("Donation event not found in transaction").into_response()
        }
        VerificationResult::Mismatch { claimed, actual } => {
            ApiError::bad_request("Donor address mismatch")
                .with_details(format!("claimed {}, event donor {}", claimed, actual))
                .into_response()
        }
        VerificationResult::AlreadyVerified => Json(json!({
            "status": "already_verified",
            "message": "This donation has already been credited"
        }))
        .into_response(),
        VerificationResult::Success(credit) => Json(json!({
            "status": "success",
            "points": credit.points,
            "totalPoints": credit.total_points,
            "donationCount": credit.donation_count,
            // Display names, as older clients read them; `newBadges` adds ids
            "badges": credit.new_badges.iter().map(|b| b.name.clone()).collect::<Vec<_>>(),
            "newBadges": credit.new_badges,
            "campaignId": credit.campaign_id,
            "krwAmount": credit.krw_amount,
            "explorerUrl": credit.explorer_url,
            "message": "Donation complete!"
        }))
        .into_response(),
    };
    Ok(response)
}

// ============================================================================
// Users and furniture
// ============================================================================

pub async fn user_handler(
    State(ctx): State<SharedContext>,
    Path(address): Path<String>,
) -> ApiResult<Json<UserSummary>> {
    let address = parse_address(&address)?;
    Ok(Json(user_summary(ctx.store.as_ref(), &address).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyFurnitureRequest {
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub furniture_id: Option<String>,
}

pub async fn buy_furniture_handler(
    State(ctx): State<SharedContext>,
    Json(request): Json<BuyFurnitureRequest>,
) -> ApiResult<Json<PurchaseReceipt>> {
    let (Some(user_address), Some(furniture_id)) = (request.user_address, request.furniture_id)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    buy_furniture(ctx.store.as_ref(), &user_address, &furniture_id)
        .await
        .map(Json)
        .map_err(|e| match e {
            ShopError::InvalidInput(details) => {
                ApiError::bad_request("Missing required fields").with_details(details)
            }
            ShopError::UnknownUser(address) => ApiError::not_found("Unknown user").with_details(address),
            ShopError::Rejected(reason) => ApiError::bad_request(reason.to_string()),
            ShopError::Storage(e) => e.into(),
            ShopError::Contention => ApiError::internal("Purchase failed", ShopError::Contention),
        })
}

pub async fn furniture_catalog_handler() -> Json<Value> {
    Json(json!({ "items": CATALOG }))
}

// ============================================================================
// Identity
// ============================================================================

pub async fn did_handler(
    State(ctx): State<SharedContext>,
    Path(address): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(contract) = ctx.contract() else {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Contract not deployed")
            .with_details("DID service is not available yet"));
    };
    let address = parse_address(&address)?;

    let donations = ctx.store.list_donations_for_donor(&address).await?;
    if donations.is_empty() {
        return Err(ApiError::not_found("No donation history found for this DID"));
    }
    let total_amount = donations
        .iter()
        .fold(0u128, |sum, d| sum.saturating_add(d.amount));

    let document = create_did_document(&address, &contract.to_checksum(), ctx.chain_id());
    Ok(Json(json!({
        "didDocument": document,
        "stats": {
            "totalAmount": total_amount.to_string(),
            "donationCount": donations.len(),
            "hasVerifiedDonations": true
        }
    })))
}

pub async fn credentials_handler(
    State(ctx): State<SharedContext>,
    Path(did): Path<String>,
) -> ApiResult<Json<Value>> {
    parse_did(&did).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let credentials = ctx.store.list_credentials(&did).await?;
    Ok(Json(json!({ "did": did, "credentials": credentials })))
}

/// Any JSON body is accepted; anything that is not an intact credential is
/// reported as invalid rather than rejected
pub async fn verify_credential_handler(Json(credential): Json<Value>) -> Json<Value> {
    Json(json!({
        "valid": verify_credential_json(&credential),
        "issuer": credential.get("issuer").cloned().unwrap_or(Value::Null),
        "subject": credential
            .pointer("/credentialSubject/id")
            .cloned()
            .unwrap_or(Value::Null),
    }))
}

// ============================================================================
// Campaigns
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub progress_percent: u8,
}

impl From<Campaign> for CampaignView {
    fn from(campaign: Campaign) -> Self {
        let progress_percent = campaign.progress_percent();
        Self {
            campaign,
            progress_percent,
        }
    }
}

pub async fn campaigns_handler(
    State(ctx): State<SharedContext>,
) -> ApiResult<Json<Vec<CampaignView>>> {
    let campaigns = ctx.store.list_campaigns().await?;
    Ok(Json(campaigns.into_iter().map(CampaignView::from).collect()))
}

pub async fn campaign_handler(
    State(ctx): State<SharedContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<CampaignView>> {
    ctx.store
        .get_campaign(&id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| ApiError::not_found("Campaign not found"))
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLoginRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_organization: bool,
    /// Set by the OAuth callback path
    #[serde(default)]
    pub google: bool,
}

#[derive(Debug, Deserialize)]
pub struct MetamaskLoginRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionRecord,
    pub profile: UserProfile,
    pub points: u64,
}

pub async fn email_login_handler(
    State(ctx): State<SharedContext>,
    Json(request): Json<EmailLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if request.email.trim().is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }
    let login = if request.google {
        ctx.auth.login_with_google(&request.email, request.name.as_deref())
    } else {
        ctx.auth
            .login_with_email(&request.email, request.name.as_deref(), request.is_organization)
    };
    let session =
        login.map_err(|e| ApiError::bad_request("Login failed").with_details(e.to_string()))?;

    let user = register_session(ctx.store.as_ref(), &session).await?;
    Ok(Json(SessionResponse {
        session: session.to_record(),
        profile: session.profile.clone(),
        points: user.points,
    }))
}

pub async fn metamask_login_handler(
    State(ctx): State<SharedContext>,
    Json(request): Json<MetamaskLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let address = parse_address(&request.address)?;
    let session = ctx.auth.login_with_metamask(&address, ctx.chain_id());
    let user = register_session(ctx.store.as_ref(), &session).await?;
    Ok(Json(SessionResponse {
        session: session.to_record(),
        profile: session.profile.clone(),
        points: user.points,
    }))
}
