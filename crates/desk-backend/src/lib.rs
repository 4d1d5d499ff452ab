//! # desk-backend
//!
//! HTTP clients for hotel-desk-rs.
//!
//! This crate provides:
//!
//! 1. **BackendClient** - the hotel REST backend
//!    - Room availability reports
//!    - Booking create / read / patch / check-in / check-out
//!    - Booking conversions (pricing in the reference currency)
//!
//! 2. **MobileMoneyGateway** - mobile-money collections
//!    - Prompts the payer's handset for the booking amount
//!    - Settlement is observed on the booking, not on the gateway
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use desk_backend::{BackendClient, MobileMoneyGateway};
//! use desk_core::Collaborators;
//!
//! let backend = Arc::new(BackendClient::from_env()?);
//! let gateway = Arc::new(MobileMoneyGateway::from_env()?);
//!
//! let collaborators = Collaborators::new(backend, gateway);
//! ```

pub mod client;
pub mod config;
pub mod mobile_money;
mod wire;

// Re-exports
pub use client::BackendClient;
pub use config::{BackendConfig, MobileMoneyConfig};
pub use mobile_money::MobileMoneyGateway;
