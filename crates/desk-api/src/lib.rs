//! # desk-api
//!
//! HTTP API layer for hotel-desk-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - One booking workflow per desk session, addressed by id
//! - REST endpoints for every workflow action
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/workflows` | Open a session |
//! | GET | `/api/v1/workflows/{id}` | Snapshot |
//! | DELETE | `/api/v1/workflows/{id}` | Abandon a session |
//! | POST | `/api/v1/workflows/{id}/back` | Previous step |
//! | POST | `/api/v1/workflows/{id}/advance` | Next step with held data |
//! | POST | `/api/v1/workflows/{id}/restart` | Start over |
//! | POST | `/api/v1/workflows/{id}/search` | Room search |
//! | POST | `/api/v1/workflows/{id}/select` | Select room |
//! | POST | `/api/v1/workflows/{id}/guest` | Guest details |
//! | POST | `/api/v1/workflows/{id}/conversion/retry` | Retry conversion |
//! | POST | `/api/v1/workflows/{id}/proceed` | Go to payment |
//! | POST | `/api/v1/workflows/{id}/payment/mobile` | Mobile payment |
//! | POST | `/api/v1/workflows/{id}/payment/mobile/check` | Poll now |
//! | POST | `/api/v1/workflows/{id}/payment/mobile/reset` | Reset failed attempt |
//! | POST | `/api/v1/workflows/{id}/payment/cash` | Cash payment |
//! | POST | `/api/v1/workflows/{id}/check-in` | Check in |
//! | GET | `/api/v1/workflows/{id}/invoice` | Invoice |
//! | POST | `/api/v1/workflows/{id}/finish` | Finish |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
