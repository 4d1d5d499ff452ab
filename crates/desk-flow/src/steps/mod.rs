//! Per-step handlers and view models.

pub mod check_in;
pub mod confirmation;
pub mod guest_details;
pub mod payment;
pub mod room_search;

pub use confirmation::{ConfirmationView, ConversionStatus};
pub use guest_details::GuestForm;
pub use payment::{CashForm, MobilePaymentState, PayeeRule, PaymentBranch, PaymentView};
pub use room_search::{RoomSearch, SearchCriteria};
