//! # Routes
//!
//! Axum router configuration for the desk API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Sessions:
///   - POST   /api/v1/workflows - Open a workflow at step 1
///   - GET    /api/v1/workflows/{id} - Snapshot (applies pending poll results)
///   - DELETE /api/v1/workflows/{id} - Abandon the session
///
/// - Navigation:
///   - POST /api/v1/workflows/{id}/back
///   - POST /api/v1/workflows/{id}/advance - Forward with data already held
///   - POST /api/v1/workflows/{id}/restart
///
/// - Steps:
///   - POST /api/v1/workflows/{id}/search - Room search (1)
///   - POST /api/v1/workflows/{id}/select - Select room (1 to 2)
///   - POST /api/v1/workflows/{id}/guest - Guest details (2 to 3)
///   - POST /api/v1/workflows/{id}/conversion/retry - Restart conversion poll (3)
///   - POST /api/v1/workflows/{id}/proceed - Confirm (3 to 4)
///   - POST /api/v1/workflows/{id}/payment/mobile - Initiate mobile payment (4)
///   - POST /api/v1/workflows/{id}/payment/mobile/check - Poll now (4)
///   - POST /api/v1/workflows/{id}/payment/mobile/reset - Retry after failure (4)
///   - POST /api/v1/workflows/{id}/payment/cash - Record cash (4 to 5)
///   - POST /api/v1/workflows/{id}/check-in - Check in (5)
///   - GET  /api/v1/workflows/{id}/invoice - Invoice (5)
///   - POST /api/v1/workflows/{id}/finish - Clear state (5 to 1)
pub fn create_router(state: AppState) -> Router {
    // The desk front-end is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let workflow_routes = Router::new()
        .route("/", post(handlers::open_workflow))
        .route(
            "/{id}",
            get(handlers::get_workflow).delete(handlers::delete_workflow),
        )
        // Navigation
        .route("/{id}/back", post(handlers::back))
        .route("/{id}/advance", post(handlers::advance))
        .route("/{id}/restart", post(handlers::restart))
        // Step 1
        .route("/{id}/search", post(handlers::search_rooms))
        .route("/{id}/select", post(handlers::select_room))
        // Step 2
        .route("/{id}/guest", post(handlers::submit_guest))
        // Step 3
        .route("/{id}/conversion/retry", post(handlers::retry_conversion))
        .route("/{id}/proceed", post(handlers::proceed))
        // Step 4
        .route("/{id}/payment/mobile", post(handlers::initiate_mobile))
        .route("/{id}/payment/mobile/check", post(handlers::check_mobile))
        .route("/{id}/payment/mobile/reset", post(handlers::reset_mobile))
        .route("/{id}/payment/cash", post(handlers::confirm_cash))
        // Step 5
        .route("/{id}/check-in", post(handlers::check_in))
        .route("/{id}/invoice", get(handlers::invoice))
        .route("/{id}/finish", post(handlers::finish));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1/workflows", workflow_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
