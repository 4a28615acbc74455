//! Background, non-blocking delivery.
//!
//! Each call schedules one batch on the worker pool. Within a batch listeners run
//! in registration order; batches of different dispatch calls may run
//! concurrently on different workers, so there is no ordering between them.
//!
//! # Failure Isolation
//!
//! No caller is waiting on the batch, so a failing listener must not cost the
//! others their delivery. Handler errors and panics are caught per listener and
//! reported to the [`FailureSink`]; the batch then moves on.

use std::{
    any,
    panic::{self, AssertUnwindSafe},
    sync::{Mutex, PoisonError},
};

use crate::{
    dispatch::{
        BatchReport,
        failure::{DeliveryFailure, FailureCause, FailureSink},
    },
    error::DispatchError,
    event::Event,
    registry::Listeners,
    tasks::{ExecutorHandle, TaskError, TaskFuture},
};

/// Schedules delivery of `event` to `listeners` and returns without waiting.
pub(crate) fn dispatch_to<E: Event>(
    event: E,
    listeners: Listeners<E>,
    executor: &ExecutorHandle,
    failures: &FailureSink,
) -> Result<Pending, DispatchError> {
    let failures = failures.clone();
    let future = executor
        .spawn(move || deliver(&event, &listeners, &failures))
        .map_err(|_| DispatchError::ExecutorClosed)?;

    Ok(Pending::new(any::type_name::<E>(), State::Scheduled(future)))
}

/// Runs one batch on the current thread, isolating every listener.
fn deliver<E: Event>(event: &E, listeners: &Listeners<E>, failures: &FailureSink) -> BatchReport {
    let mut report = BatchReport::default();

    for listener in listeners {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.handle(event)));
        let cause = match outcome {
            Ok(Ok(())) => {
                report.delivered += 1;
                continue;
            }
            Ok(Err(source)) => FailureCause::Error(source),
            Err(payload) => FailureCause::from_panic(payload),
        };

        report.failed += 1;
        failures.report(DeliveryFailure {
            event: any::type_name::<E>(),
            listener: listener.name(),
            cause,
        });
    }

    log::trace!(
        "async batch for {} done: {} delivered, {} failed",
        any::type_name::<E>(),
        report.delivered,
        report.failed
    );
    report
}

/// Handle to a batch scheduled by
/// [`Dispatcher::dispatch_async()`](crate::Dispatcher::dispatch_async).
///
/// Once the report has been observed it is kept, so polling again or waiting
/// afterwards returns the same report. Dropping the handle does not cancel the
/// batch.
pub struct Pending {
    event: &'static str,
    state: Mutex<State>,
}

enum State {
    /// Report already received, or nothing to deliver.
    Done(BatchReport),
    Scheduled(TaskFuture<BatchReport>),
}

impl Pending {
    fn new(event: &'static str, state: State) -> Self {
        Self {
            event,
            state: Mutex::new(state),
        }
    }

    pub(crate) fn done<E: Event>(report: BatchReport) -> Self {
        Self::new(any::type_name::<E>(), State::Done(report))
    }

    /// Blocks until the batch has run and returns its report.
    pub fn wait(self) -> Result<BatchReport, DispatchError> {
        let event = self.event;
        match self.state.into_inner().unwrap_or_else(PoisonError::into_inner) {
            State::Done(report) => Ok(report),
            State::Scheduled(future) => future
                .wait()
                .map_err(|_| DispatchError::BatchLost { event }),
        }
    }

    /// Returns the report if the batch already ran, without blocking.
    pub fn try_wait(&self) -> Result<Option<BatchReport>, DispatchError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let report = match &*state {
            State::Done(report) => return Ok(Some(*report)),
            State::Scheduled(future) => match future.try_wait() {
                Ok(Some(report)) => report,
                Ok(None) => return Ok(None),
                Err(TaskError::Closed) => return Err(DispatchError::ExecutorClosed),
                Err(TaskError::Failed) => {
                    return Err(DispatchError::BatchLost { event: self.event });
                }
            },
        };

        *state = State::Done(report);
        Ok(Some(report))
    }
}

impl std::fmt::Debug for Pending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Done(_) => "done",
            State::Scheduled(_) => "scheduled",
        };
        f.debug_struct("Pending")
            .field("event", &self.event)
            .field("state", &state)
            .finish()
    }
}
