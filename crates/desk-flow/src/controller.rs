//! # Step Controller
//!
//! `BookingWorkflow` owns the workflow state and is the only thing that
//! mutates it. Every user action is a method; forward moves go one step at
//! a time and only when the guard of the step being left holds.
//!
//! ```text
//! SelectRoom(1) ─▶ GuestDetails(2) ─▶ ConfirmBooking(3) ─▶ Payment(4) ─▶ CheckIn(5)
//!      ▲  room + range     booking created     authoritative        cash recorded /
//!      │                                       conversion           mobile confirmed
//!      └──────────────── back: one step at a time, data kept ──────────────┘
//! ```
//!
//! Steps 3 and 4 poll in the background. Poll results are applied only
//! through [`BookingWorkflow::next_update`] or
//! [`BookingWorkflow::drain_updates`], and only while the step that started
//! the poll is still active.

use crate::config::FlowConfig;
use crate::poll::{PollEvent, PollMessage, PollOutcome, PollPlan, PollSender, PollTask};
use crate::state::BookingWorkflowState;
use crate::steps::check_in;
use crate::steps::confirmation::conversion_settled;
use crate::steps::guest_details;
use crate::steps::{
    CashForm, ConfirmationView, ConversionStatus, GuestForm, MobilePaymentState, PayeeRule,
    PaymentBranch, PaymentView, RoomSearch, SearchCriteria,
};
use desk_core::{
    Booking, BookingDetails, BookingPatch, Collaborators, Conversion, ConversionSnapshot,
    DeskError, DeskResult, Hotel, Invoice, Money, PaymentInitiation, PaymentInitiationResult,
    RoomSummary, Step,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Something a background poll changed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowUpdate {
    /// Conversion fetched, payable amount not final yet
    ConversionWaiting { attempt: u32 },
    /// Authoritative conversion captured
    ConversionReady { payable: Money },
    /// Conversion poll gave up
    ConversionFailed { message: String },
    /// Booking fetched, payment not settled yet
    PaymentWaiting { attempt: u32 },
    /// Paid and confirmed; the workflow moved to check-in
    PaymentConfirmed { attempt: u32 },
    /// Payment poll gave up
    PaymentFailed { message: String },
    /// A transport error that will be retried
    TransientError { attempt: u32, message: String },
}

/// Everything a front-end needs to render the current step
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub step: Step,
    pub state: BookingWorkflowState,
    pub search: RoomSearch,
    pub confirmation: ConfirmationView,
    pub payment: PaymentView,
    pub polling: bool,
}

/// The booking workflow for one desk session
pub struct BookingWorkflow {
    collaborators: Collaborators,
    hotel: Hotel,
    config: FlowConfig,
    payee_rule: PayeeRule,
    state: BookingWorkflowState,
    search: RoomSearch,
    conversion_status: ConversionStatus,
    mobile: MobilePaymentState,
    /// Bumped whenever polling stops; results from older epochs are stale
    epoch: u64,
    poll: Option<PollTask>,
    events_tx: PollSender,
    events_rx: mpsc::UnboundedReceiver<PollEvent>,
}

impl BookingWorkflow {
    /// Create a workflow at step 1
    pub fn new(collaborators: Collaborators, hotel: Hotel, config: FlowConfig) -> DeskResult<Self> {
        let payee_rule = PayeeRule::new(&config.payee)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            collaborators,
            hotel,
            config,
            payee_rule,
            state: BookingWorkflowState::new(),
            search: RoomSearch::default(),
            conversion_status: ConversionStatus::Idle,
            mobile: MobilePaymentState::Idle,
            epoch: 0,
            poll: None,
            events_tx,
            events_rx,
        })
    }

    pub fn state(&self) -> &BookingWorkflowState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step()
    }

    pub fn hotel(&self) -> &Hotel {
        &self.hotel
    }

    pub fn search(&self) -> &RoomSearch {
        &self.search
    }

    pub fn conversion_status(&self) -> &ConversionStatus {
        &self.conversion_status
    }

    pub fn mobile_payment(&self) -> &MobilePaymentState {
        &self.mobile
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            step: self.step(),
            state: self.state.clone(),
            search: self.search.clone(),
            confirmation: self.confirmation(),
            payment: self.payment_view(),
            polling: self.is_polling(),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go back exactly one step, keeping collected data
    pub fn back(&mut self) -> DeskResult<Step> {
        let current = self.step();
        let previous = current
            .previous()
            .ok_or_else(|| DeskError::guard(current, "already at the first step"))?;

        if current == Step::Payment && self.mobile.in_progress() {
            return Err(DeskError::guard(
                current,
                "a mobile payment is in progress; wait for its outcome",
            ));
        }

        self.transition(previous);
        Ok(previous)
    }

    /// Go forward one step using data already held, if the guard allows
    pub fn advance(&mut self) -> DeskResult<Step> {
        self.reconcile()?;
        self.forward()
    }

    /// Drop everything and start again at step 1
    pub fn restart(&mut self) {
        info!("Workflow restarted from step {}", self.step());
        self.clear();
    }

    /// Check that the current step has the data it depends on.
    ///
    /// When it does not, polling stops and the workflow is moved back to
    /// the earliest step whose data is missing.
    pub fn reconcile(&mut self) -> DeskResult<Step> {
        let Some(restart_at) = self.state.earliest_unmet_step() else {
            return Ok(self.step());
        };

        let lost_at = self.step();
        warn!(
            "Workflow data missing at step {}, restarting at step {}",
            lost_at, restart_at
        );
        self.stop_polling();
        self.state.set_step(restart_at);
        self.on_enter(restart_at);

        Err(DeskError::StateLost {
            restart_at,
            reason: format!("data required by step {} is missing", lost_at),
        })
    }

    // =========================================================================
    // Step 1: room search
    // =========================================================================

    /// Search for rooms free on every night of the range
    pub async fn search_rooms(&mut self, criteria: &SearchCriteria) -> DeskResult<Vec<RoomSummary>> {
        self.reconcile()?;
        self.require_step(Step::SelectRoom)?;

        let today = self.collaborators.clock.today();
        let offered = self
            .search
            .run(
                self.collaborators.inventory.as_ref(),
                self.hotel.id,
                criteria,
                today,
            )
            .await?;
        Ok(offered.to_vec())
    }

    /// Pick a room from the latest search and move to guest details
    pub fn select_room(&mut self, room_id: u64) -> DeskResult<Step> {
        self.reconcile()?;
        self.require_step(Step::SelectRoom)?;

        let (room, range) = self.search.pick(room_id)?;
        if self.state.payment_settled() && self.state.selection_differs(room.id, &range) {
            return Err(DeskError::guard(
                Step::SelectRoom,
                "payment is recorded for this booking; start over to book another stay",
            ));
        }
        info!("Selected room {} for {} night(s)", room.code, range.nights());
        self.state.select(room, range);
        self.forward()
    }

    // =========================================================================
    // Step 2: guest details
    // =========================================================================

    /// Form prefilled with what was submitted before, or blank
    pub fn guest_form(&self) -> GuestForm {
        self.state
            .guest_payload()
            .map(GuestForm::from)
            .unwrap_or_default()
    }

    /// Validate the guest form and write the booking.
    ///
    /// The first submit creates the booking. A later submit (after going
    /// back) rewrites the same booking instead of creating another one.
    /// Once payment is recorded the booking is locked; `advance` moves on
    /// with the details already held.
    pub async fn submit_guest_details(&mut self, form: &GuestForm) -> DeskResult<Booking> {
        self.reconcile()?;
        self.require_step(Step::GuestDetails)?;
        if self.state.payment_settled() {
            return Err(DeskError::guard(
                Step::GuestDetails,
                "payment is recorded for this booking; its details can no longer change",
            ));
        }

        let payload = form.validate()?;
        let (room, range) = match (self.state.selected_room(), self.state.date_range()) {
            (Some(room), Some(range)) => (room.clone(), *range),
            _ => return Err(self.lost(Step::SelectRoom, "no room selected")),
        };

        match self.state.booking_id() {
            Some(booking_id) => {
                let patch = guest_details::rewrite_patch(&room, range, payload.clone())?;
                let details = self
                    .collaborators
                    .bookings
                    .patch_booking(booking_id, &patch)
                    .await?;
                info!("Booking {} rewritten from resubmitted details", booking_id);
                self.state.booking_rewritten(details);
                self.mobile = MobilePaymentState::Idle;
            }
            None => {
                let request =
                    guest_details::new_booking(self.hotel.id, &room, range, payload.clone())?;
                let booking = self.collaborators.bookings.create_booking(&request).await?;
                info!(
                    "Booking {} created for {}",
                    booking.code,
                    request.amount_required
                );
                self.state.record_booking(booking)?;
            }
        }

        self.state.set_guest(payload);
        self.forward()?;

        self.state
            .created_booking()
            .cloned()
            .ok_or_else(|| DeskError::Internal("booking missing after submit".to_string()))
    }

    // =========================================================================
    // Step 3: confirmation
    // =========================================================================

    pub fn confirmation(&self) -> ConfirmationView {
        ConfirmationView::build(&self.state, &self.conversion_status)
    }

    /// Restart the conversion poll. A conversion already captured is kept
    /// whatever the new fetches return.
    pub fn retry_conversion(&mut self) -> DeskResult<()> {
        self.reconcile()?;
        self.require_step(Step::ConfirmBooking)?;

        info!("Conversion poll restarted by user");
        self.start_conversion_poll()
    }

    /// Move to payment once the payable amount is final
    pub fn proceed_to_payment(&mut self) -> DeskResult<PaymentView> {
        self.reconcile()?;
        self.require_step(Step::ConfirmBooking)?;

        self.forward()?;
        Ok(self.payment_view())
    }

    // =========================================================================
    // Step 4: payment
    // =========================================================================

    pub fn payment_branch(&self) -> Option<PaymentBranch> {
        self.state.payment_method().map(PaymentBranch::from)
    }

    pub fn payment_view(&self) -> PaymentView {
        match self.payment_branch() {
            None => PaymentView::AwaitingMethod,
            Some(PaymentBranch::Cash) => PaymentView::Cash {
                amount_due: self.local_amount_due(),
            },
            Some(PaymentBranch::Mobile) => PaymentView::Mobile {
                amount: self.state.conversion().map(Conversion::payable),
                state: self.mobile.clone(),
            },
        }
    }

    /// Ask the gateway to charge the payer's wallet the authoritative amount
    pub async fn initiate_mobile_payment(&mut self, payee: &str) -> DeskResult<MobilePaymentState> {
        self.reconcile()?;
        self.require_step(Step::Payment)?;
        self.require_branch(PaymentBranch::Mobile)?;

        if self.state.payment_settled() {
            return Err(DeskError::guard(Step::Payment, "payment is already recorded"));
        }
        if self.mobile != MobilePaymentState::Idle {
            return Err(DeskError::guard(
                Step::Payment,
                "finish or reset the current attempt first",
            ));
        }

        let payee = self.payee_rule.validate(payee)?;
        let amount = match self.state.conversion() {
            Some(conversion) => conversion.payable(),
            None => return Err(self.lost(Step::ConfirmBooking, "no payable amount")),
        };
        let booking_id = match self.state.booking_id() {
            Some(id) => id,
            None => return Err(self.lost(Step::GuestDetails, "no booking")),
        };
        let payment_reference = self
            .state
            .payment_reference()
            .ok_or_else(|| {
                DeskError::guard(Step::Payment, "the booking has no payment reference yet")
            })?
            .to_string();

        self.mobile = MobilePaymentState::Initiating;
        let request = PaymentInitiation {
            payee,
            payment_reference,
            amount,
        };

        self.mobile = match self.collaborators.payments.initiate(&request).await {
            Ok(PaymentInitiationResult::Accepted { transaction_id }) => {
                info!(
                    "Mobile payment {} initiated via {}",
                    transaction_id,
                    self.collaborators.payments.provider_name()
                );
                MobilePaymentState::Pending {
                    transaction_id,
                    polls: 0,
                    last_error: None,
                }
            }
            Ok(PaymentInitiationResult::Declined { message }) => {
                warn!("Mobile payment declined: {}", message);
                MobilePaymentState::FailedInitiation { message }
            }
            Err(e) => {
                error!("Mobile payment initiation failed: {}", e);
                MobilePaymentState::FailedInitiation {
                    message: e.to_string(),
                }
            }
        };

        if matches!(self.mobile, MobilePaymentState::Pending { .. }) {
            self.start_payment_poll(booking_id);
        }
        Ok(self.mobile.clone())
    }

    /// Poll the booking now instead of waiting for the next tick
    pub fn check_payment_status(&mut self) -> DeskResult<()> {
        self.require_step(Step::Payment)?;
        match (&self.mobile, &self.poll) {
            (MobilePaymentState::Pending { .. }, Some(poll)) => {
                debug!("Manual payment status check");
                poll.nudge();
                Ok(())
            }
            _ => Err(DeskError::guard(Step::Payment, "no mobile payment is pending")),
        }
    }

    /// Return a failed attempt to `Idle` so it can be initiated again
    pub fn reset_mobile_payment(&mut self) -> DeskResult<()> {
        self.require_step(Step::Payment)?;
        if !self.mobile.is_failed() {
            return Err(DeskError::guard(
                Step::Payment,
                "only a failed attempt can be reset",
            ));
        }
        self.mobile = MobilePaymentState::Idle;
        Ok(())
    }

    /// Record cash received at the desk and move to check-in
    pub async fn submit_cash_payment(&mut self, form: &CashForm) -> DeskResult<Step> {
        self.reconcile()?;
        self.require_step(Step::Payment)?;
        self.require_branch(PaymentBranch::Cash)?;

        if self.state.payment_settled() {
            return Err(DeskError::guard(Step::Payment, "payment is already recorded"));
        }

        let amount = form.validate(self.hotel.local_currency)?;
        let booking_id = match self.state.booking_id() {
            Some(id) => id,
            None => return Err(self.lost(Step::GuestDetails, "no booking")),
        };

        let details = self
            .collaborators
            .bookings
            .patch_booking(booking_id, &BookingPatch::cash_settlement(amount))
            .await?;
        info!("Cash payment of {} recorded for booking {}", amount, booking_id);

        self.state.set_details(details);
        self.state.mark_payment_confirmed();
        self.forward()
    }

    // =========================================================================
    // Step 5: check-in
    // =========================================================================

    /// Invoice from data already held; no network calls
    pub fn invoice(&self) -> DeskResult<Invoice> {
        self.require_step(Step::CheckIn)?;
        check_in::invoice(&self.hotel, &self.state)
    }

    /// Mark the guest as arrived; refused once the booking shows checked in
    pub async fn check_in(&mut self) -> DeskResult<BookingDetails> {
        self.reconcile()?;
        self.require_step(Step::CheckIn)?;

        let booking_id = check_in::check_in_allowed(&self.state)?;
        let details = self.collaborators.bookings.check_in(booking_id).await?;
        info!("Booking {} checked in", booking_id);

        self.state.set_details(details.clone());
        Ok(details)
    }

    /// Leave the workflow: all state is cleared and the next booking starts at step 1
    pub fn finish(&mut self) {
        info!("Workflow finished");
        self.clear();
    }

    // =========================================================================
    // Poll results
    // =========================================================================

    /// Wait for the next poll result that changes something.
    ///
    /// Returns `None` when nothing is polling.
    pub async fn next_update(&mut self) -> Option<WorkflowUpdate> {
        loop {
            if self.poll.is_none() {
                while self.events_rx.try_recv().is_ok() {}
                return None;
            }
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.apply(event) {
                return Some(update);
            }
        }
    }

    /// Apply every poll result already received, without waiting
    pub fn drain_updates(&mut self) -> Vec<WorkflowUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(update) = self.apply(event) {
                updates.push(update);
            }
        }
        updates
    }

    fn apply(&mut self, event: PollEvent) -> Option<WorkflowUpdate> {
        if event.epoch != self.epoch {
            warn!(
                stale = event.epoch,
                current = self.epoch,
                "Discarding poll result from a step that is no longer active"
            );
            return None;
        }
        match event.message {
            PollMessage::Conversion(outcome) => self.apply_conversion(outcome),
            PollMessage::Payment(outcome) => self.apply_payment(outcome),
        }
    }

    fn apply_conversion(&mut self, outcome: PollOutcome<ConversionSnapshot>) -> Option<WorkflowUpdate> {
        let attempt = outcome.attempt;
        match outcome.result {
            Ok(snapshot) => {
                let authoritative = snapshot.authoritative().cloned();
                self.state.set_details(snapshot.booking);
                if let Some(conversion) = authoritative {
                    self.state.set_conversion(conversion);
                }

                match self.state.conversion().map(Conversion::payable) {
                    Some(payable) => {
                        info!("Payable amount final after {} fetch(es): {}", attempt, payable);
                        self.stop_polling();
                        self.conversion_status = ConversionStatus::Ready;
                        Some(WorkflowUpdate::ConversionReady { payable })
                    }
                    None => {
                        debug!("Conversion not final yet (fetch {})", attempt);
                        self.conversion_status = ConversionStatus::Waiting {
                            attempts: attempt,
                            last_error: None,
                        };
                        Some(WorkflowUpdate::ConversionWaiting { attempt })
                    }
                }
            }
            Err(e) if self.state.conversion().is_some() => {
                warn!("Conversion refresh failed, keeping the captured amount: {}", e);
                self.stop_polling();
                None
            }
            Err(e) if outcome.finished => {
                error!("Conversion poll gave up after {} fetch(es): {}", attempt, e);
                self.stop_polling();
                let message = e.to_string();
                self.conversion_status = ConversionStatus::Failed {
                    message: message.clone(),
                };
                Some(WorkflowUpdate::ConversionFailed { message })
            }
            Err(e) => {
                warn!(
                    "Conversion fetch failed ({} in a row), retrying: {}",
                    outcome.consecutive_failures, e
                );
                let message = e.to_string();
                self.conversion_status = ConversionStatus::Waiting {
                    attempts: attempt,
                    last_error: Some(message.clone()),
                };
                Some(WorkflowUpdate::TransientError { attempt, message })
            }
        }
    }

    fn apply_payment(&mut self, outcome: PollOutcome<BookingDetails>) -> Option<WorkflowUpdate> {
        let MobilePaymentState::Pending { transaction_id, .. } = &self.mobile else {
            debug!("Payment poll result without a pending payment");
            return None;
        };
        let transaction_id = transaction_id.clone();
        let attempt = outcome.attempt;

        match outcome.result {
            Ok(details) => {
                let settled = details.booking.is_paid_and_confirmed();
                self.state.set_details(details);

                if !settled {
                    self.mobile = MobilePaymentState::Pending {
                        transaction_id,
                        polls: attempt,
                        last_error: None,
                    };
                    return Some(WorkflowUpdate::PaymentWaiting { attempt });
                }

                info!("Mobile payment {} confirmed on poll {}", transaction_id, attempt);
                self.stop_polling();
                self.mobile = MobilePaymentState::Success { transaction_id };
                self.state.mark_payment_confirmed();
                if let Err(e) = self.forward() {
                    error!("Payment confirmed but check-in unreachable: {}", e);
                }
                Some(WorkflowUpdate::PaymentConfirmed { attempt })
            }
            Err(e) if outcome.finished => {
                error!("Payment confirmation failed on poll {}: {}", attempt, e);
                self.stop_polling();
                let message = e.to_string();
                self.mobile = MobilePaymentState::FailedConfirmation {
                    message: message.clone(),
                };
                Some(WorkflowUpdate::PaymentFailed { message })
            }
            Err(e) => {
                warn!(
                    "Payment poll failed ({} in a row), retrying: {}",
                    outcome.consecutive_failures, e
                );
                let message = e.to_string();
                self.mobile = MobilePaymentState::Pending {
                    transaction_id,
                    polls: attempt,
                    last_error: Some(message.clone()),
                };
                Some(WorkflowUpdate::TransientError { attempt, message })
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_step(&self, expected: Step) -> DeskResult<()> {
        let current = self.step();
        if current != expected {
            return Err(DeskError::guard(
                current,
                format!("this action belongs to step {}", expected),
            ));
        }
        Ok(())
    }

    fn require_branch(&self, expected: PaymentBranch) -> DeskResult<()> {
        match self.payment_branch() {
            Some(branch) if branch == expected => Ok(()),
            Some(branch) => Err(DeskError::guard(
                Step::Payment,
                format!("this booking is paid by {:?}", branch),
            )),
            None => Err(DeskError::guard(
                Step::Payment,
                "the payment method is not known yet",
            )),
        }
    }

    fn lost(&self, restart_at: Step, reason: &str) -> DeskError {
        DeskError::StateLost {
            restart_at,
            reason: reason.to_string(),
        }
    }

    /// One step forward, if the guard of the current step holds
    fn forward(&mut self) -> DeskResult<Step> {
        let current = self.step();
        if let Err(reason) = self.state.guard_holds(current) {
            warn!("Guard blocked leaving step {}: {}", current, reason);
            return Err(DeskError::guard(current, reason));
        }
        let next = current
            .next()
            .ok_or_else(|| DeskError::guard(current, "check-in is the last step"))?;

        self.transition(next);
        Ok(next)
    }

    /// Move to an adjacent step, ending the polling of the step being left
    fn transition(&mut self, to: Step) {
        let from = self.step();
        debug_assert!(from.number().abs_diff(to.number()) == 1);

        self.stop_polling();
        if from == Step::ConfirmBooking && self.conversion_status != ConversionStatus::Ready {
            self.conversion_status = ConversionStatus::Idle;
        }

        self.state.set_step(to);
        info!("Step {} -> {}", from, to);
        self.on_enter(to);
    }

    fn on_enter(&mut self, step: Step) {
        match step {
            Step::ConfirmBooking => {
                if self.state.conversion().is_some() {
                    self.conversion_status = ConversionStatus::Ready;
                } else if let Err(e) = self.start_conversion_poll() {
                    error!("Cannot start conversion poll: {}", e);
                }
            }
            Step::Payment => {
                if self.mobile.is_failed() {
                    self.mobile = MobilePaymentState::Idle;
                }
            }
            Step::SelectRoom | Step::GuestDetails | Step::CheckIn => {}
        }
    }

    fn clear(&mut self) {
        self.stop_polling();
        self.state.reset();
        self.search.clear();
        self.conversion_status = ConversionStatus::Idle;
        self.mobile = MobilePaymentState::Idle;
    }

    fn stop_polling(&mut self) {
        if self.poll.take().is_some() {
            debug!("Polling stopped (epoch {})", self.epoch);
        }
        self.epoch += 1;
    }

    fn start_conversion_poll(&mut self) -> DeskResult<()> {
        let booking_id = self
            .state
            .booking_id()
            .ok_or_else(|| self.lost(Step::GuestDetails, "no booking to price"))?;

        self.stop_polling();
        let conversions = self.collaborators.conversions.clone();
        let plan = PollPlan {
            interval: self.config.polling.conversion_interval(),
            max_transient_retries: self.config.polling.max_transient_retries,
            is_terminal: conversion_settled,
            wrap: PollMessage::Conversion,
        };

        self.poll = Some(PollTask::spawn(
            self.epoch,
            plan,
            self.events_tx.clone(),
            move || {
                let conversions = conversions.clone();
                async move { conversions.fetch_conversions(booking_id).await }
            },
        ));
        self.conversion_status = if self.state.conversion().is_some() {
            ConversionStatus::Ready
        } else {
            ConversionStatus::Waiting {
                attempts: 0,
                last_error: None,
            }
        };
        debug!("Conversion poll started for booking {}", booking_id);
        Ok(())
    }

    fn start_payment_poll(&mut self, booking_id: u64) {
        self.stop_polling();
        let bookings = self.collaborators.bookings.clone();
        let plan = PollPlan {
            interval: self.config.polling.payment_interval(),
            max_transient_retries: self.config.polling.max_transient_retries,
            is_terminal: |details: &BookingDetails| details.booking.is_paid_and_confirmed(),
            wrap: PollMessage::Payment,
        };

        self.poll = Some(PollTask::spawn(
            self.epoch,
            plan,
            self.events_tx.clone(),
            move || {
                let bookings = bookings.clone();
                async move { bookings.get_booking(booking_id).await }
            },
        ));
        debug!("Payment poll started for booking {}", booking_id);
    }

    /// Amount due in the local currency for cash collection
    fn local_amount_due(&self) -> Option<Money> {
        let details = self.state.booking_details();
        details
            .and_then(|d| d.calculation_breakdown.as_ref())
            .map(|b| b.final_amount)
            .or_else(|| self.state.booking()?.billing.amount_required)
            .or_else(|| self.state.conversion().map(|c| c.original))
    }
}

impl std::fmt::Debug for BookingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingWorkflow")
            .field("hotel", &self.hotel.id)
            .field("step", &self.step())
            .field("epoch", &self.epoch)
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}
