//! # desk-flow
//!
//! The five-step booking desk workflow for hotel-desk-rs.
//!
//! This crate provides:
//!
//! 1. **BookingWorkflow** - the step controller
//!    - Forward moves one step at a time, gated by per-step guards
//!    - Back navigation keeps collected data
//!    - Reconciliation routes back to the earliest step with missing data
//!
//! 2. **Step handlers** - room search, guest form, confirmation view,
//!    cash and mobile payment, invoice and check-in
//!
//! 3. **Polling** - step-scoped background polls for the authoritative
//!    conversion (step 3) and mobile payment settlement (step 4)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use desk_flow::{BookingWorkflow, FlowConfig, SearchCriteria};
//!
//! let config = FlowConfig::load()?;
//! let mut flow = BookingWorkflow::new(collaborators, hotel, config)?;
//!
//! let rooms = flow.search_rooms(&criteria).await?;
//! flow.select_room(rooms[0].id)?;
//! flow.submit_guest_details(&form).await?;
//!
//! // Step 3 polls until the payable amount is final
//! while let Some(update) = flow.next_update().await {
//!     println!("{:?}", update);
//! }
//! ```

pub mod config;
pub mod controller;
mod poll;
pub mod state;
pub mod steps;

// Re-exports
pub use config::{FlowConfig, PayeeConfig, PollingConfig};
pub use controller::{BookingWorkflow, WorkflowSnapshot, WorkflowUpdate};
pub use poll::StepCancellationToken;
pub use state::BookingWorkflowState;
pub use steps::{
    CashForm, ConfirmationView, ConversionStatus, GuestForm, MobilePaymentState, PayeeRule,
    PaymentBranch, PaymentView, RoomSearch, SearchCriteria,
};
