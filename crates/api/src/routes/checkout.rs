//! Checkout endpoints: start, confirm, and status passthrough.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog::{InMemoryCatalog, InMemoryUserStore};
use checkout::{CheckoutOrchestrator, CheckoutState, CourseSummary};
use common::CourseId;
use gateway::IntentStatus;
use ledger::EnrollmentStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EnrollmentStore> {
    pub orchestrator: CheckoutOrchestrator<S, InMemoryCatalog, InMemoryUserStore>,
    pub catalog: InMemoryCatalog,
    pub users: InMemoryUserStore,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_intent_id: String,
    pub course_id: CourseId,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheckoutResponse {
    pub success: bool,
    pub client_secret: String,
    pub payment_intent_id: String,
    pub state: CheckoutState,
    pub course: CourseSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: String,
    pub state: CheckoutState,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: IntentStatus,
    pub amount: Decimal,
    pub currency: String,
}

// -- Handlers --

/// POST /checkout/{courseId} — start a checkout, returning the client
/// secret needed to complete payment against the provider.
#[tracing::instrument(skip(state))]
pub async fn start<S: EnrollmentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(course_id): Path<String>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<StartCheckoutResponse>, ApiError> {
    let course_id = parse_course_id(&course_id)?;

    let session = state.orchestrator.start_checkout(user_id, course_id).await?;

    Ok(Json(StartCheckoutResponse {
        success: true,
        client_secret: session.client_secret,
        payment_intent_id: session.intent_id,
        state: session.state,
        course: session.course,
    }))
}

/// POST /checkout/confirm — confirm a completed payment and commit the
/// enrollment. A duplicate confirmation reports success, never a
/// duplicate grant.
#[tracing::instrument(skip(state, req))]
pub async fn confirm<S: EnrollmentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .confirm_checkout(user_id, req.course_id, &req.payment_intent_id)
        .await?;

    Ok(Json(ConfirmResponse {
        success: true,
        message: outcome.message().to_string(),
        state: outcome.state(),
    }))
}

/// GET /checkout/status/{paymentIntentId} — read-only passthrough of
/// the provider's view of an intent.
#[tracing::instrument(skip(state))]
pub async fn status<S: EnrollmentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(payment_intent_id): Path<String>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<StatusResponse>, ApiError> {
    let view = state.orchestrator.payment_status(&payment_intent_id).await?;

    Ok(Json(StatusResponse {
        success: true,
        status: view.status,
        amount: view.amount,
        currency: view.currency,
    }))
}

pub(crate) fn parse_course_id(id: &str) -> Result<CourseId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid course ID: {e}")))?;
    Ok(CourseId::from_uuid(uuid))
}
