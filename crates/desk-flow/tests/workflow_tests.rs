//! End-to-end workflow tests against in-memory collaborators.
//!
//! Polling tests run on a paused clock so intervals elapse instantly.

use async_trait::async_trait;
use chrono::NaiveDate;
use desk_core::{
    AvailabilityStatus, Billing, Booking, BookingDetails, BookingPatch, BookingService,
    BookingStatus, CalculationBreakdown, Collaborators, Conversion, ConversionService,
    ConversionSnapshot, ConversionType, Currency, DateRange, DayAvailability, DeskError,
    DeskResult, FixedClock, Hotel, InventoryService, Money, NewBooking, PaymentGateway,
    PaymentInitiation, PaymentInitiationResult, PaymentMethod, PaymentStatus, RoomAvailability,
    RoomSummary, Step,
};
use desk_flow::{
    BookingWorkflow, CashForm, ConversionStatus, FlowConfig, GuestForm, MobilePaymentState,
    PaymentView, SearchCriteria, WorkflowUpdate,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ===== Fixtures =====

const BOOKING_ID: u64 = 42;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn xaf(amount: i64) -> Money {
    Money::from_minor(amount, Currency::XAF)
}

fn room(id: u64) -> RoomSummary {
    RoomSummary {
        id,
        code: format!("R{}", id),
        room_type: "Standard".to_string(),
        nightly_rate: xaf(20000),
    }
}

/// Availability for nights `from..to`, booked on the listed days
fn report(id: u64, from: u32, to: u32, booked: &[u32]) -> RoomAvailability {
    RoomAvailability {
        room: room(id),
        days: (from..to)
            .map(|d| DayAvailability {
                date: day(d),
                status: if booked.contains(&d) {
                    AvailabilityStatus::Booked
                } else {
                    AvailabilityStatus::Available
                },
            })
            .collect(),
    }
}

fn details(status: BookingStatus, payment_status: PaymentStatus) -> BookingDetails {
    let mut details = BookingDetails::from_booking(Booking {
        id: BOOKING_ID,
        code: "BK-42".to_string(),
        status,
        payment_method: None,
        billing: Billing {
            amount_required: Some(xaf(40000)),
            payment_status,
            ..Billing::default()
        },
    });
    details.payment_reference = Some("REF-42".to_string());
    details.calculation_breakdown = Some(CalculationBreakdown {
        charges: BTreeMap::new(),
        tax: None,
        final_amount: xaf(40000),
    });
    details
}

fn unpaid() -> BookingDetails {
    details(BookingStatus::Processing, PaymentStatus::Pending)
}

fn paid() -> BookingDetails {
    details(BookingStatus::Confirmed, PaymentStatus::Paid)
}

fn snapshot(tags: &[&str]) -> ConversionSnapshot {
    ConversionSnapshot {
        booking: unpaid(),
        conversions: tags
            .iter()
            .map(|tag| Conversion {
                original: xaf(40000),
                converted: Money::from_minor(6600, Currency::USD),
                exchange_rate: 0.00165,
                conversion_type: ConversionType::from_tag(tag),
            })
            .collect(),
    }
}

fn pending_snapshot() -> DeskResult<ConversionSnapshot> {
    Ok(snapshot(&["amount_required"]))
}

fn ready_snapshot() -> DeskResult<ConversionSnapshot> {
    Ok(snapshot(&["amount_required", "amount_required_reference_currency"]))
}

fn offline() -> DeskError {
    DeskError::Network("connection reset".to_string())
}

fn guest(method: PaymentMethod) -> GuestForm {
    GuestForm {
        first_name: "Amina".to_string(),
        last_name: "Njoya".to_string(),
        email: "amina@example.com".to_string(),
        phone: "+237 670 000 001".to_string(),
        payment_method: Some(method),
        ..GuestForm::default()
    }
}

fn criteria(from: u32, to: u32) -> SearchCriteria {
    SearchCriteria {
        start_date: day(from),
        end_date: day(to),
        room_type_id: None,
    }
}

// ===== Fakes =====

/// Backend with scripted conversion and booking reads
#[derive(Default)]
struct FakeBackend {
    availability: Mutex<Vec<RoomAvailability>>,
    conversion_script: Mutex<VecDeque<DeskResult<ConversionSnapshot>>>,
    booking_script: Mutex<VecDeque<DeskResult<BookingDetails>>>,
    created: Mutex<Vec<NewBooking>>,
    patches: Mutex<Vec<BookingPatch>>,
    checked_in: AtomicBool,
    availability_calls: AtomicU32,
    conversion_calls: AtomicU32,
    booking_calls: AtomicU32,
    check_in_calls: AtomicU32,
}

impl FakeBackend {
    fn with_rooms(rooms: Vec<RoomAvailability>) -> Arc<Self> {
        let backend = Self::default();
        *backend.availability.lock().unwrap() = rooms;
        Arc::new(backend)
    }

    fn script_conversions(&self, results: Vec<DeskResult<ConversionSnapshot>>) {
        self.conversion_script.lock().unwrap().extend(results);
    }

    fn script_bookings(&self, results: Vec<DeskResult<BookingDetails>>) {
        self.booking_script.lock().unwrap().extend(results);
    }

    fn conversion_calls(&self) -> u32 {
        self.conversion_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryService for FakeBackend {
    async fn room_availability(
        &self,
        _hotel_id: u64,
        _range: &DateRange,
        _room_type_id: Option<u64>,
    ) -> DeskResult<Vec<RoomAvailability>> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.availability.lock().unwrap().clone())
    }
}

#[async_trait]
impl BookingService for FakeBackend {
    async fn create_booking(&self, booking: &NewBooking) -> DeskResult<Booking> {
        self.created.lock().unwrap().push(booking.clone());
        Ok(Booking {
            id: BOOKING_ID,
            code: "BK-42".to_string(),
            status: BookingStatus::Processing,
            payment_method: Some(booking.guest.payment_method),
            billing: Billing {
                amount_required: Some(booking.amount_required),
                ..Billing::default()
            },
        })
    }

    async fn get_booking(&self, _booking_id: u64) -> DeskResult<BookingDetails> {
        self.booking_calls.fetch_add(1, Ordering::SeqCst);
        self.booking_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(unpaid()))
    }

    async fn patch_booking(&self, _booking_id: u64, patch: &BookingPatch) -> DeskResult<BookingDetails> {
        self.patches.lock().unwrap().push(patch.clone());
        if patch.payment_status == Some(PaymentStatus::Paid) {
            Ok(paid())
        } else {
            Ok(unpaid())
        }
    }

    async fn check_in(&self, _booking_id: u64) -> DeskResult<BookingDetails> {
        self.check_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.checked_in.swap(true, Ordering::SeqCst) {
            return Err(DeskError::rejected("Booking already checked in"));
        }
        Ok(details(BookingStatus::CheckedIn, PaymentStatus::Paid))
    }

    async fn check_out(&self, _booking_id: u64) -> DeskResult<BookingDetails> {
        Ok(details(BookingStatus::CheckedOut, PaymentStatus::Paid))
    }
}

#[async_trait]
impl ConversionService for FakeBackend {
    async fn fetch_conversions(&self, _booking_id: u64) -> DeskResult<ConversionSnapshot> {
        self.conversion_calls.fetch_add(1, Ordering::SeqCst);
        self.conversion_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(pending_snapshot)
    }
}

/// Gateway answering every initiation the same way
struct FakeGateway {
    answer: DeskResult<PaymentInitiationResult>,
    requests: Mutex<Vec<PaymentInitiation>>,
}

impl FakeGateway {
    fn accepting() -> Arc<Self> {
        Self::answering(Ok(PaymentInitiationResult::Accepted {
            transaction_id: "TX-1".to_string(),
        }))
    }

    fn answering(answer: DeskResult<PaymentInitiationResult>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<PaymentInitiation> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initiate(&self, request: &PaymentInitiation) -> DeskResult<PaymentInitiationResult> {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone()
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

fn workflow(backend: &Arc<FakeBackend>, gateway: &Arc<FakeGateway>, config: FlowConfig) -> BookingWorkflow {
    let collaborators = Collaborators::new(backend.clone(), gateway.clone())
        .with_clock(Arc::new(FixedClock(day(1))));
    BookingWorkflow::new(collaborators, Hotel::new(7, "Hotel Test"), config).unwrap()
}

fn default_rooms() -> Vec<RoomAvailability> {
    vec![report(101, 10, 12, &[]), report(102, 10, 12, &[11])]
}

/// Workflow sitting at step 3 with the conversion poll running
async fn at_confirmation(
    method: PaymentMethod,
    conversions: Vec<DeskResult<ConversionSnapshot>>,
    config: FlowConfig,
) -> (Arc<FakeBackend>, Arc<FakeGateway>, BookingWorkflow) {
    let backend = FakeBackend::with_rooms(default_rooms());
    backend.script_conversions(conversions);
    let gateway = FakeGateway::accepting();
    let mut flow = workflow(&backend, &gateway, config);

    flow.search_rooms(&criteria(10, 12)).await.unwrap();
    flow.select_room(101).unwrap();
    flow.submit_guest_details(&guest(method)).await.unwrap();
    assert_eq!(flow.step(), Step::ConfirmBooking);

    (backend, gateway, flow)
}

/// Workflow sitting at step 4 with the authoritative conversion captured
async fn at_payment(method: PaymentMethod) -> (Arc<FakeBackend>, Arc<FakeGateway>, BookingWorkflow) {
    let (backend, gateway, mut flow) =
        at_confirmation(method, vec![ready_snapshot()], FlowConfig::default()).await;

    let update = flow.next_update().await.unwrap();
    assert!(matches!(update, WorkflowUpdate::ConversionReady { .. }));
    flow.proceed_to_payment().unwrap();
    assert_eq!(flow.step(), Step::Payment);

    (backend, gateway, flow)
}

// ===== Step 1 =====

#[tokio::test]
async fn test_search_offers_only_rooms_free_every_night() {
    let backend = FakeBackend::with_rooms(default_rooms());
    let gateway = FakeGateway::accepting();
    let mut flow = workflow(&backend, &gateway, FlowConfig::default());

    let rooms = flow.search_rooms(&criteria(10, 12)).await.unwrap();

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, 101);
    assert!(flow.select_room(102).is_err());
    assert_eq!(flow.step(), Step::SelectRoom);
}

#[tokio::test]
async fn test_invalid_range_never_reaches_inventory() {
    let backend = FakeBackend::with_rooms(default_rooms());
    let gateway = FakeGateway::accepting();
    let mut flow = workflow(&backend, &gateway, FlowConfig::default());

    let err = flow.search_rooms(&criteria(12, 10)).await.unwrap_err();

    assert!(matches!(err, DeskError::Validation { .. }));
    assert_eq!(backend.availability_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_night_stay_is_priced_for_one_night() {
    let backend = FakeBackend::with_rooms(vec![report(101, 10, 11, &[])]);
    let gateway = FakeGateway::accepting();
    let mut flow = workflow(&backend, &gateway, FlowConfig::default());

    flow.search_rooms(&criteria(10, 11)).await.unwrap();
    assert_eq!(flow.select_room(101).unwrap(), Step::GuestDetails);
    assert_eq!(flow.state().date_range().unwrap().nights(), 1);

    flow.submit_guest_details(&guest(PaymentMethod::Cash)).await.unwrap();
    let created = backend.created.lock().unwrap();
    assert_eq!(created[0].amount_required, xaf(20000));
}

// ===== Step 2 =====

#[tokio::test]
async fn test_invalid_guest_form_stays_on_step() {
    let backend = FakeBackend::with_rooms(default_rooms());
    let gateway = FakeGateway::accepting();
    let mut flow = workflow(&backend, &gateway, FlowConfig::default());
    flow.search_rooms(&criteria(10, 12)).await.unwrap();
    flow.select_room(101).unwrap();

    let mut form = guest(PaymentMethod::Cash);
    form.phone = "12".to_string();
    assert!(flow.submit_guest_details(&form).await.is_err());

    assert_eq!(flow.step(), Step::GuestDetails);
    assert!(backend.created.lock().unwrap().is_empty());
    assert!(flow.advance().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_back_keeps_data_and_resubmit_rewrites_booking() {
    let (backend, _gateway, mut flow) =
        at_confirmation(PaymentMethod::Cash, vec![], FlowConfig::default()).await;

    assert_eq!(flow.back().unwrap(), Step::GuestDetails);
    assert!(!flow.is_polling());

    let form = flow.guest_form();
    assert_eq!(form.first_name, "Amina");
    assert_eq!(form.payment_method, Some(PaymentMethod::Cash));

    let mut changed = form.clone();
    changed.adults = 2;
    flow.submit_guest_details(&changed).await.unwrap();

    assert_eq!(backend.created.lock().unwrap().len(), 1);
    let patches = backend.patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].guest.as_ref().unwrap().occupancy.adults, 2);
    assert_eq!(flow.state().booking_id(), Some(BOOKING_ID));
    assert_eq!(flow.step(), Step::ConfirmBooking);
}

#[tokio::test(start_paused = true)]
async fn test_changed_room_requires_resubmitted_details() {
    let (_backend, _gateway, mut flow) =
        at_confirmation(PaymentMethod::Cash, vec![], FlowConfig::default()).await;

    flow.back().unwrap();
    flow.back().unwrap();
    assert_eq!(flow.step(), Step::SelectRoom);

    flow.search_rooms(&criteria(10, 11)).await.unwrap();
    flow.select_room(101).unwrap();
    assert_eq!(flow.step(), Step::GuestDetails);

    let err = flow.advance().unwrap_err();
    assert!(matches!(err, DeskError::GuardFailed { step: Step::GuestDetails, .. }));
}

// ===== Step 3 =====

#[tokio::test(start_paused = true)]
async fn test_conversion_polls_until_authoritative() {
    let (backend, _gateway, mut flow) = at_confirmation(
        PaymentMethod::Mobile,
        vec![pending_snapshot(), pending_snapshot(), ready_snapshot()],
        FlowConfig::default(),
    )
    .await;
    let start = Instant::now();

    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionWaiting { attempt: 1 })
    );
    assert!(!flow.confirmation().can_proceed);
    assert!(flow.proceed_to_payment().is_err());
    assert_eq!(flow.step(), Step::ConfirmBooking);

    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionWaiting { attempt: 2 })
    );
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionReady {
            payable: Money::from_minor(6600, Currency::USD)
        })
    );
    assert_eq!(start.elapsed(), Duration::from_secs(6));
    assert_eq!(flow.step(), Step::ConfirmBooking);
    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);
    assert!(!flow.is_polling());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.conversion_calls(), 3);
    assert!(flow.next_update().await.is_none());

    let view = flow.proceed_to_payment().unwrap();
    assert_eq!(flow.step(), Step::Payment);
    assert!(matches!(view, PaymentView::Mobile { amount: Some(_), .. }));
}

#[tokio::test(start_paused = true)]
async fn test_conversion_survives_back_navigation() {
    let (backend, _gateway, mut flow) =
        at_confirmation(PaymentMethod::Cash, vec![ready_snapshot()], FlowConfig::default()).await;
    flow.next_update().await.unwrap();

    flow.back().unwrap();
    assert_eq!(flow.advance().unwrap(), Step::ConfirmBooking);

    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);
    assert!(flow.state().conversion().is_some());
    assert!(!flow.is_polling());
    assert_eq!(backend.conversion_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_conversion_gives_up_then_retries() {
    let (backend, _gateway, mut flow) = at_confirmation(
        PaymentMethod::Cash,
        vec![Err(offline()), Err(offline()), Err(offline())],
        FlowConfig::default().with_max_transient_retries(2),
    )
    .await;

    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::TransientError { attempt: 1, .. })
    ));
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::TransientError { attempt: 2, .. })
    ));
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionFailed { .. })
    ));
    assert!(!flow.is_polling());
    assert!(matches!(flow.conversion_status(), ConversionStatus::Failed { .. }));
    assert_eq!(flow.step(), Step::ConfirmBooking);

    backend.script_conversions(vec![ready_snapshot()]);
    flow.retry_conversion().unwrap();
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionReady { .. })
    ));
    assert_eq!(backend.conversion_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_result_from_left_step_is_discarded() {
    let (_backend, _gateway, mut flow) = at_confirmation(
        PaymentMethod::Cash,
        vec![ready_snapshot(), pending_snapshot()],
        FlowConfig::default(),
    )
    .await;

    // Let the first fetch land in the channel without applying it
    tokio::time::sleep(Duration::from_millis(10)).await;
    flow.back().unwrap();

    assert!(flow.drain_updates().is_empty());
    assert!(flow.state().conversion().is_none());
    assert_eq!(flow.conversion_status(), &ConversionStatus::Idle);

    flow.advance().unwrap();
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionWaiting { attempt: 1 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_ready_stays_ready() {
    let (backend, _gateway, mut flow) = at_confirmation(
        PaymentMethod::Mobile,
        vec![ready_snapshot(), ready_snapshot()],
        FlowConfig::default(),
    )
    .await;
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionReady { .. })
    ));

    flow.retry_conversion().unwrap();
    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);
    assert!(flow.confirmation().can_proceed);

    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionReady { .. })
    ));
    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);
    assert!(flow.confirmation().can_proceed);
    assert!(!flow.is_polling());
    assert_eq!(backend.conversion_calls(), 2);
    flow.proceed_to_payment().unwrap();
    assert_eq!(flow.step(), Step::Payment);
}

#[tokio::test(start_paused = true)]
async fn test_refetch_without_tag_keeps_captured_conversion() {
    let (backend, _gateway, mut flow) = at_confirmation(
        PaymentMethod::Cash,
        vec![ready_snapshot(), pending_snapshot(), Err(offline())],
        FlowConfig::default(),
    )
    .await;
    flow.next_update().await.unwrap();
    let captured = flow.state().conversion().cloned().unwrap();

    flow.proceed_to_payment().unwrap();
    assert_eq!(flow.back().unwrap(), Step::ConfirmBooking);

    // Only the untagged amount comes back
    flow.retry_conversion().unwrap();
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::ConversionReady {
            payable: captured.payable()
        })
    );
    assert_eq!(flow.state().conversion(), Some(&captured));
    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);

    // A failed refresh leaves it in place too
    flow.retry_conversion().unwrap();
    assert!(flow.next_update().await.is_none());
    assert_eq!(flow.state().conversion(), Some(&captured));
    assert_eq!(flow.conversion_status(), &ConversionStatus::Ready);
    assert_eq!(backend.conversion_calls(), 3);

    assert_eq!(flow.advance().unwrap(), Step::Payment);
}

// ===== Step 4 =====

#[tokio::test(start_paused = true)]
async fn test_mobile_payment_confirmed_on_third_poll() {
    let (backend, gateway, mut flow) = at_payment(PaymentMethod::Mobile).await;
    backend.script_bookings(vec![Ok(unpaid()), Ok(unpaid()), Ok(paid())]);

    let state = flow.initiate_mobile_payment("670 000 001").await.unwrap();
    assert!(matches!(state, MobilePaymentState::Pending { .. }));
    let start = Instant::now();

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, Money::from_minor(6600, Currency::USD));
    assert_eq!(requests[0].payee.e164(), "+237670000001");
    assert_eq!(requests[0].payment_reference, "REF-42");

    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentWaiting { attempt: 1 })
    );
    assert!(flow.back().is_err());
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentWaiting { attempt: 2 })
    );
    assert_eq!(flow.step(), Step::Payment);
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentConfirmed { attempt: 3 })
    );

    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert_eq!(flow.step(), Step::CheckIn);
    assert!(matches!(flow.mobile_payment(), MobilePaymentState::Success { .. }));
    assert!(!flow.is_polling());
    assert_eq!(backend.booking_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_check_status_fetches_immediately() {
    let (backend, _gateway, mut flow) = at_payment(PaymentMethod::Mobile).await;
    assert!(flow.check_payment_status().is_err());

    flow.initiate_mobile_payment("670000001").await.unwrap();
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentWaiting { attempt: 1 })
    );
    let start = Instant::now();

    flow.check_payment_status().unwrap();
    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentWaiting { attempt: 2 })
    );
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(backend.booking_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_payment_poll_gives_up_then_reinitiates() {
    let (backend, gateway, mut flow) = at_confirmation(
        PaymentMethod::Mobile,
        vec![ready_snapshot()],
        FlowConfig::default().with_max_transient_retries(1),
    )
    .await;
    flow.next_update().await.unwrap();
    flow.proceed_to_payment().unwrap();
    backend.script_bookings(vec![Err(offline()), Err(offline())]);

    flow.initiate_mobile_payment("670000001").await.unwrap();
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::TransientError { attempt: 1, .. })
    ));
    assert!(matches!(
        flow.mobile_payment(),
        MobilePaymentState::Pending { last_error: Some(_), .. }
    ));
    assert!(matches!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentFailed { .. })
    ));

    assert!(!flow.is_polling());
    assert!(matches!(
        flow.mobile_payment(),
        MobilePaymentState::FailedConfirmation { .. }
    ));
    assert_eq!(flow.step(), Step::Payment);
    assert!(flow.advance().is_err());
    assert!(flow.initiate_mobile_payment("670000001").await.is_err());
    assert_eq!(gateway.requests().len(), 1);

    flow.reset_mobile_payment().unwrap();
    backend.script_bookings(vec![Ok(paid())]);
    let state = flow.initiate_mobile_payment("670000001").await.unwrap();
    assert!(matches!(state, MobilePaymentState::Pending { .. }));
    assert_eq!(gateway.requests().len(), 2);

    assert_eq!(
        flow.next_update().await,
        Some(WorkflowUpdate::PaymentConfirmed { attempt: 1 })
    );
    assert_eq!(flow.step(), Step::CheckIn);
}

#[tokio::test(start_paused = true)]
async fn test_payee_outside_supported_country_is_refused() {
    let (_backend, gateway, mut flow) = at_payment(PaymentMethod::Mobile).await;

    let err = flow.initiate_mobile_payment("+234 803 000 0000").await.unwrap_err();

    assert!(matches!(err, DeskError::Validation { .. }));
    assert!(gateway.requests().is_empty());
    assert_eq!(flow.mobile_payment(), &MobilePaymentState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_declined_initiation_can_be_reset() {
    let backend = FakeBackend::with_rooms(default_rooms());
    backend.script_conversions(vec![ready_snapshot()]);
    let gateway = FakeGateway::answering(Ok(PaymentInitiationResult::Declined {
        message: "Insufficient balance".to_string(),
    }));
    let mut flow = workflow(&backend, &gateway, FlowConfig::default());
    flow.search_rooms(&criteria(10, 12)).await.unwrap();
    flow.select_room(101).unwrap();
    flow.submit_guest_details(&guest(PaymentMethod::Mobile)).await.unwrap();
    flow.next_update().await.unwrap();
    flow.proceed_to_payment().unwrap();

    let state = flow.initiate_mobile_payment("670000001").await.unwrap();
    assert_eq!(
        state,
        MobilePaymentState::FailedInitiation {
            message: "Insufficient balance".to_string()
        }
    );
    assert!(!flow.is_polling());
    assert_eq!(flow.step(), Step::Payment);

    flow.reset_mobile_payment().unwrap();
    assert_eq!(flow.mobile_payment(), &MobilePaymentState::Idle);
    assert!(flow.back().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cash_requires_matching_amounts_and_receipt() {
    let (backend, _gateway, mut flow) = at_payment(PaymentMethod::Cash).await;
    assert_eq!(
        flow.payment_view(),
        PaymentView::Cash {
            amount_due: Some(xaf(40000))
        }
    );

    let mismatched = CashForm {
        amount: "40000".to_string(),
        confirmation: "4000".to_string(),
        received: true,
    };
    assert!(flow.submit_cash_payment(&mismatched).await.is_err());

    let unticked = CashForm {
        received: false,
        confirmation: "40000".to_string(),
        ..mismatched.clone()
    };
    assert!(flow.submit_cash_payment(&unticked).await.is_err());
    assert!(backend.patches.lock().unwrap().is_empty());
    assert!(flow.advance().is_err());
    assert_eq!(flow.step(), Step::Payment);

    let valid = CashForm {
        received: true,
        ..unticked
    };
    assert_eq!(flow.submit_cash_payment(&valid).await.unwrap(), Step::CheckIn);

    let patches = backend.patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0], BookingPatch::cash_settlement(xaf(40000)));
}

#[tokio::test(start_paused = true)]
async fn test_mobile_actions_refused_on_cash_booking() {
    let (_backend, gateway, mut flow) = at_payment(PaymentMethod::Cash).await;

    assert!(flow.initiate_mobile_payment("670000001").await.is_err());
    assert!(gateway.requests().is_empty());
}

// ===== Step 5 =====

#[tokio::test(start_paused = true)]
async fn test_check_in_once_then_finish() {
    let (backend, _gateway, mut flow) = at_payment(PaymentMethod::Cash).await;
    let cash = CashForm {
        amount: "40 000".to_string(),
        confirmation: "40000".to_string(),
        received: true,
    };
    flow.submit_cash_payment(&cash).await.unwrap();

    let invoice = flow.invoice().unwrap();
    assert_eq!(invoice.booking_code, "BK-42");
    assert_eq!(invoice.total, xaf(40000));

    let checked_in = flow.check_in().await.unwrap();
    assert!(checked_in.booking.is_checked_in());

    let err = flow.check_in().await.unwrap_err();
    assert!(matches!(err, DeskError::GuardFailed { step: Step::CheckIn, .. }));
    assert_eq!(backend.check_in_calls.load(Ordering::SeqCst), 1);

    assert!(flow.advance().is_err());

    flow.finish();
    assert_eq!(flow.step(), Step::SelectRoom);
    assert!(flow.state().created_booking().is_none());
    assert!(flow.state().conversion().is_none());
    assert!(flow.search().offered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_paid_booking_is_locked_after_going_back() {
    let (backend, gateway, mut flow) = at_payment(PaymentMethod::Cash).await;
    let cash = CashForm {
        amount: "40000".to_string(),
        confirmation: "40000".to_string(),
        received: true,
    };
    flow.submit_cash_payment(&cash).await.unwrap();

    for _ in 0..3 {
        flow.back().unwrap();
    }
    assert_eq!(flow.step(), Step::GuestDetails);

    let err = flow
        .submit_guest_details(&guest(PaymentMethod::Mobile))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::GuardFailed { step: Step::GuestDetails, .. }));
    assert_eq!(flow.step(), Step::GuestDetails);

    flow.back().unwrap();
    flow.search_rooms(&criteria(10, 11)).await.unwrap();
    let err = flow.select_room(101).unwrap_err();
    assert!(matches!(err, DeskError::GuardFailed { step: Step::SelectRoom, .. }));
    assert_eq!(flow.state().date_range().unwrap().nights(), 2);

    flow.search_rooms(&criteria(10, 12)).await.unwrap();
    assert_eq!(flow.select_room(101).unwrap(), Step::GuestDetails);
    for _ in 0..3 {
        flow.advance().unwrap();
    }
    assert_eq!(flow.step(), Step::CheckIn);

    assert_eq!(backend.patches.lock().unwrap().len(), 1);
    assert_eq!(backend.created.lock().unwrap().len(), 1);
    assert!(gateway.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rewrite_before_payment_requires_payment() {
    let (backend, _gateway, mut flow) = at_payment(PaymentMethod::Cash).await;

    flow.back().unwrap();
    flow.back().unwrap();
    backend.script_conversions(vec![ready_snapshot()]);
    flow.submit_guest_details(&guest(PaymentMethod::Mobile))
        .await
        .unwrap();
    flow.next_update().await.unwrap();
    flow.proceed_to_payment().unwrap();

    assert!(matches!(flow.payment_view(), PaymentView::Mobile { .. }));
    assert_eq!(flow.mobile_payment(), &MobilePaymentState::Idle);
    let err = flow.advance().unwrap_err();
    assert!(matches!(err, DeskError::GuardFailed { step: Step::Payment, .. }));
    assert_eq!(flow.step(), Step::Payment);
}

#[tokio::test(start_paused = true)]
async fn test_restart_stops_polling() {
    let (_backend, _gateway, mut flow) =
        at_confirmation(PaymentMethod::Cash, vec![], FlowConfig::default()).await;
    assert!(flow.is_polling());

    flow.restart();

    assert!(!flow.is_polling());
    assert_eq!(flow.step(), Step::SelectRoom);
    assert!(flow.next_update().await.is_none());
}
