//! # Request Handlers
//!
//! Axum request handlers for the desk API.
//! Every workflow handler locks the session, runs one action, applies any
//! poll results that arrived meanwhile and answers with a fresh snapshot.

use crate::state::{AppState, SharedWorkflow};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use desk_core::{DeskError, ErrorKind, Invoice, RoomSummary, Step};
use desk_flow::{
    BookingWorkflow, CashForm, GuestForm, SearchCriteria, WorkflowSnapshot, WorkflowUpdate,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Select room request
#[derive(Debug, Deserialize)]
pub struct SelectRoomRequest {
    pub room_id: u64,
}

/// Mobile payment request
#[derive(Debug, Deserialize)]
pub struct MobilePaymentRequest {
    /// Payer's wallet number, national or international form
    pub payee: String,
}

/// Workflow response: poll results applied by this request plus the current view
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<WorkflowUpdate>,
    pub workflow: WorkflowSnapshot,
}

/// Room search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub rooms: Vec<RoomSummary>,
    #[serde(flatten)]
    pub workflow: WorkflowResponse,
}

/// Invoice response
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub invoice: Invoice,
    /// Receipt-printer rendering
    pub text: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    /// Step the front-end should show after a state loss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_at: Option<Step>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16, kind: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            kind,
            restart_at: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::Guard => "guard",
        ErrorKind::Transient => "transient",
        ErrorKind::Business => "business",
        ErrorKind::StateLoss => "state_lost",
        ErrorKind::Fatal => "fatal",
    }
}

pub(crate) fn desk_error_to_response(err: DeskError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code, kind_label(err.kind()));
    if let DeskError::StateLost { restart_at, .. } = &err {
        response.restart_at = Some(*restart_at);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn session_not_found(id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("Workflow not found: {}", id),
            404,
            "business",
        )),
    )
}

async fn session(state: &AppState, id: Uuid) -> Result<SharedWorkflow, ApiError> {
    state.session(id).await.ok_or_else(|| session_not_found(id))
}

fn respond(id: Uuid, workflow: &mut BookingWorkflow) -> WorkflowResponse {
    let updates = workflow.drain_updates();
    WorkflowResponse {
        id,
        updates,
        workflow: workflow.snapshot(),
    }
}

/// Map an action error, logging by severity
fn action_error(err: DeskError) -> ApiError {
    match err.kind() {
        ErrorKind::Fatal | ErrorKind::Transient => error!("Workflow action failed: {}", err),
        _ => warn!("Workflow action refused: {}", err),
    }
    desk_error_to_response(err)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hotel-desk",
        "version": env!("CARGO_PKG_VERSION"),
        "hotel": state.hotel.id,
        "sessions": state.session_count().await,
    }))
}

/// Open a workflow session at step 1
#[instrument(skip(state))]
pub async fn open_workflow(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    let (id, shared) = state.open_session().await.map_err(action_error)?;
    info!("Opened workflow session {}", id);

    let mut workflow = shared.lock().await;
    Ok((StatusCode::CREATED, Json(respond(id, &mut workflow))))
}

/// Current snapshot, after applying poll results received so far
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    Ok(Json(respond(id, &mut workflow)))
}

/// Abandon a session
#[instrument(skip(state))]
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.close_session(id).await {
        info!("Closed workflow session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

pub async fn back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.back().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Move forward with the data already held
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.advance().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

pub async fn restart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.restart();
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 1: search rooms free on every night
#[instrument(skip(state, criteria))]
pub async fn search_rooms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(criteria): Json<SearchCriteria>,
) -> ApiResult<SearchResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    let rooms = workflow.search_rooms(&criteria).await.map_err(action_error)?;
    Ok(Json(SearchResponse {
        rooms,
        workflow: respond(id, &mut workflow),
    }))
}

/// Step 1: pick a room from the latest search
pub async fn select_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectRoomRequest>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.select_room(request.room_id).map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 2: guest details; creates the booking or rewrites it on resubmit
#[instrument(skip(state, form))]
pub async fn submit_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GuestForm>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow
        .submit_guest_details(&form)
        .await
        .map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 3: restart the conversion poll
pub async fn retry_conversion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.retry_conversion().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 3 to 4
pub async fn proceed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    // Late conversion results may be waiting in the channel
    workflow.drain_updates();
    workflow.proceed_to_payment().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 4: start a mobile-money charge
#[instrument(skip(state, request))]
pub async fn initiate_mobile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MobilePaymentRequest>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow
        .initiate_mobile_payment(&request.payee)
        .await
        .map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 4: poll the booking now
pub async fn check_mobile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.check_payment_status().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

pub async fn reset_mobile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.reset_mobile_payment().map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 4: record cash received at the desk
#[instrument(skip(state, form))]
pub async fn confirm_cash(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CashForm>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow
        .submit_cash_payment(&form)
        .await
        .map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 5: mark the guest as arrived
#[instrument(skip(state))]
pub async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.check_in().await.map_err(action_error)?;
    Ok(Json(respond(id, &mut workflow)))
}

/// Step 5: invoice from held data
pub async fn invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceResponse> {
    let shared = session(&state, id).await?;
    let workflow = shared.lock().await;
    let invoice = workflow.invoice().map_err(action_error)?;
    let text = invoice.render_text();
    Ok(Json(InvoiceResponse { invoice, text }))
}

/// Step 5: clear the workflow for the next guest
pub async fn finish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkflowResponse> {
    let shared = session(&state, id).await?;
    let mut workflow = shared.lock().await;
    workflow.finish();
    Ok(Json(respond(id, &mut workflow)))
}
