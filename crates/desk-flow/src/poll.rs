//! # Step-Scoped Polling
//!
//! A `PollTask` repeatedly probes one collaborator on behalf of the active
//! step and reports every round to the controller over a channel.
//!
//! ```text
//!   controller                          PollTask (tokio task)
//!   ──────────                          ─────────────────────
//!   start_poll(epoch = 7) ───spawn───▶  tick ─▶ probe ─▶ send(7, outcome)
//!                                       tick ─▶ probe ─▶ send(7, outcome)
//!   check_status() ──────────nudge───▶  probe ─▶ send(7, outcome)
//!   leave step: drop(task), epoch = 8   cancelled
//!   recv(7, late outcome) ─▶ discarded
//! ```
//!
//! - The first probe runs immediately, then one per interval.
//! - A round never starts before the previous probe has returned, and a
//!   slow probe delays the schedule instead of bursting to catch up.
//! - The task stops on its own once a probe reports a terminal value, or
//!   after a non-retryable error, or when consecutive transport failures
//!   exceed the retry bound.
//! - The task never reads or writes workflow state.

use desk_core::{BookingDetails, ConversionSnapshot, DeskError, DeskResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancellation handle scoped to one step visit
pub type StepCancellationToken = CancellationToken;

/// One probe round as seen by the controller
#[derive(Debug)]
pub(crate) struct PollOutcome<T> {
    /// 1-based round number within this task
    pub attempt: u32,
    /// Transport failures in a row, including this round
    pub consecutive_failures: u32,
    /// The task sent its last message
    pub finished: bool,
    pub result: DeskResult<T>,
}

#[derive(Debug)]
pub(crate) enum PollMessage {
    Conversion(PollOutcome<ConversionSnapshot>),
    Payment(PollOutcome<BookingDetails>),
}

/// A message tagged with the step epoch that started the task
#[derive(Debug)]
pub(crate) struct PollEvent {
    pub epoch: u64,
    pub message: PollMessage,
}

pub(crate) type PollSender = mpsc::UnboundedSender<PollEvent>;

/// How a task decides to stop and how it labels its messages
pub(crate) struct PollPlan<T> {
    pub interval: Duration,
    pub max_transient_retries: u32,
    pub is_terminal: fn(&T) -> bool,
    pub wrap: fn(PollOutcome<T>) -> PollMessage,
}

/// Handle to a running poll; dropping it cancels the task
pub(crate) struct PollTask {
    token: StepCancellationToken,
    nudge: Arc<Notify>,
}

impl PollTask {
    pub fn spawn<T, F, Fut>(epoch: u64, plan: PollPlan<T>, events: PollSender, probe: F) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = DeskResult<T>> + Send + 'static,
    {
        let token = StepCancellationToken::new();
        let nudge = Arc::new(Notify::new());

        tokio::spawn(run(
            epoch,
            plan,
            events,
            probe,
            token.clone(),
            nudge.clone(),
        ));

        Self { token, nudge }
    }

    /// Probe now instead of waiting for the next tick
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run<T, F, Fut>(
    epoch: u64,
    plan: PollPlan<T>,
    events: PollSender,
    mut probe: F,
    token: StepCancellationToken,
    nudge: Arc<Notify>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeskResult<T>>,
{
    let mut ticker = tokio::time::interval(plan.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempt = 0u32;
    let mut consecutive_failures = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
            _ = nudge.notified() => ticker.reset(),
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            result = probe() => result,
        };

        attempt += 1;
        let finished = match &result {
            Ok(value) => {
                consecutive_failures = 0;
                (plan.is_terminal)(value)
            }
            Err(error) => {
                consecutive_failures += 1;
                !retry_allowed(error, consecutive_failures, plan.max_transient_retries)
            }
        };

        debug!(epoch, attempt, finished, "Poll round complete");

        let outcome = PollOutcome {
            attempt,
            consecutive_failures,
            finished,
            result,
        };
        if events
            .send(PollEvent {
                epoch,
                message: (plan.wrap)(outcome),
            })
            .is_err()
            || finished
        {
            break;
        }
    }
}

/// Transport errors are retried while the consecutive count stays within the bound
pub(crate) fn retry_allowed(error: &DeskError, consecutive_failures: u32, max: u32) -> bool {
    error.is_retryable() && consecutive_failures <= max
}
