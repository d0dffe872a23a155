// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, RawQuery, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use pixora_core::types::{ModelRecord, PendingOrder, UserProfile};
use pixora_core::{HealthStatus, PixoraError};
use pixora_credits::{CreditReason, find_pack};
use pixora_training::{
    GalleryImage, GenerationRequest, GenerationResult, ReconcileOutcome, TrainingEvent, TrainingSubmission,
    WebhookHeaders, extract,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::server::AppState;

/// Capture status that credits the purchased pack.
const ORDER_COMPLETED: &str = "COMPLETED";

const MAX_DISPLAY_NAME_LEN: usize = 100;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelRecord>,
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CartItem {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub status: String,
    pub credits: i64,
}

/// GET /health
///
/// Checks the datastore. Anything short of healthy answers 503.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = match state.storage.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    let (code, status, reason) = match health {
        HealthStatus::Healthy => (StatusCode::OK, "ok", None),
        HealthStatus::Degraded(reason) => {
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", Some(reason))
        }
        HealthStatus::Unhealthy(reason) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
    };
    if let Some(reason) = &reason {
        warn!(storage = state.storage.name(), %reason, "health check failed");
    }
    (
        code,
        Json(HealthResponse {
            status: status.into(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            reason,
        }),
    )
}

/// POST /api/train
pub async fn post_train(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<TrainingSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(submission) = payload?;
    state.submitter.submit(&user.id, &submission).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// POST /api/webhooks/training
///
/// Acknowledges every verified, well-formed event with `OK`, including
/// duplicates and out-of-order deliveries the reconciler chose not to apply.
pub async fn post_training_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let Some(verifier) = &state.verifier else {
        tracing::error!("webhook signing secret not configured, rejecting delivery");
        return Err(PixoraError::Unauthenticated("webhook verification unavailable".into()).into());
    };

    let webhook_headers = WebhookHeaders {
        id: header(&headers, "webhook-id"),
        timestamp: header(&headers, "webhook-timestamp"),
        signature: header(&headers, "webhook-signature"),
    };
    if let Err(e) = verifier.verify(&webhook_headers, &body) {
        warn!(webhook_id = %webhook_headers.id, error = %e, "rejected webhook delivery");
        return Err(e.into());
    }

    let params = extract(query.as_deref().unwrap_or_default());
    if let Some(signer) = &state.correlation_signer {
        signer.verify(&params, chrono::Utc::now().timestamp())?;
    }

    let event: TrainingEvent = serde_json::from_slice(&body)
        .map_err(|e| PixoraError::Internal(format!("malformed training event: {e}")))?;

    let correlation = &params.correlation;
    let outcome = state.reconciler.handle(correlation, &event).await?;
    match &outcome {
        ReconcileOutcome::Applied(status) => info!(
            user_id = %correlation.user_id,
            model_name = %correlation.model_name,
            %status,
            "training status applied"
        ),
        other => info!(
            user_id = %correlation.user_id,
            model_name = %correlation.model_name,
            outcome = ?other,
            "training event acknowledged without update"
        ),
    }
    Ok("OK")
}

/// POST /api/generate
pub async fn post_generate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.generator.generate(&user.id, &request).await?;
    Ok(Json(result))
}

/// GET /api/credits
pub async fn get_credits(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<CreditsResponse>, ApiError> {
    let credits = state.ledger.balance(&user.id).await?;
    Ok(Json(CreditsResponse { credits }))
}

/// GET /api/models
pub async fn get_models(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state.storage.list_models(&user.id).await?;
    Ok(Json(ModelsResponse { models }))
}

/// DELETE /api/models/{id}
pub async fn delete_model(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_model(&user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(PixoraError::NotFound(format!("model {id}")).into())
    }
}

/// GET /api/images
pub async fn get_images(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ImagesQuery>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let images = state.gallery.list(&user.id, query.limit).await?;
    Ok(Json(ImagesResponse { images }))
}

/// DELETE /api/images/{id}
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.gallery.delete(&user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/profile
pub async fn patch_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(update) = payload?;
    let full_name = update.full_name.trim();
    if full_name.is_empty() {
        return Err(PixoraError::Validation("fullName must not be empty".into()).into());
    }
    if full_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(PixoraError::Validation(format!(
            "fullName must be at most {MAX_DISPLAY_NAME_LEN} characters"
        ))
        .into());
    }
    let profile = state
        .storage
        .update_display_name(&user.id, full_name)
        .await?
        .ok_or_else(|| PixoraError::NotFound(format!("profile {}", user.id)))?;
    info!(user_id = %user.id, "display name updated");
    Ok(Json(profile))
}

/// POST /api/orders
///
/// Returns the provider's order document; the browser SDK needs its `id`.
pub async fn post_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload?;
    let payment = state
        .payment
        .as_ref()
        .ok_or_else(|| PixoraError::Config("payments are not configured".into()))?;

    let item = request
        .cart
        .first()
        .ok_or_else(|| PixoraError::Validation("cart is empty".into()))?;
    let pack = find_pack(&item.id)
        .ok_or_else(|| PixoraError::Validation(format!("unknown credit pack `{}`", item.id)))?;

    let order = payment.create_order(&pack.price_usd(), "USD").await?;
    state
        .storage
        .insert_order(&PendingOrder {
            order_id: order.id.clone(),
            user_id: user.id.clone(),
            pack_id: pack.id.to_string(),
            status: order.status.clone(),
            created_at: String::new(),
        })
        .await?;

    info!(user_id = %user.id, order_id = %order.id, pack = pack.id, "order created");
    Ok(Json(order.raw))
}

/// POST /api/orders/{order_id}/capture
pub async fn post_capture_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(order_id): Path<String>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let payment = state
        .payment
        .as_ref()
        .ok_or_else(|| PixoraError::Config("payments are not configured".into()))?;

    let order = state
        .storage
        .get_order(&order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| PixoraError::NotFound(format!("order {order_id}")))?;
    let pack = find_pack(&order.pack_id)
        .ok_or_else(|| PixoraError::Internal(format!("order references unknown pack `{}`", order.pack_id)))?;

    let captured = payment.capture_order(&order_id).await?;
    state
        .storage
        .update_order_status(&order_id, &captured.status)
        .await?;

    if captured.status != ORDER_COMPLETED {
        warn!(order_id = %order_id, status = %captured.status, "capture did not complete");
        return Err(PixoraError::Validation(format!(
            "payment not completed: {}",
            captured.status
        ))
        .into());
    }

    let credits = state
        .ledger
        .increment(&user.id, pack.credits, CreditReason::Purchase, Some(&order_id))
        .await?;
    info!(user_id = %user.id, order_id = %order_id, credits, "order captured");
    Ok(Json(CaptureResponse {
        status: captured.status,
        credits,
    }))
}
