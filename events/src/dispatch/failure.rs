//! Reporting channel for failures isolated during asynchronous delivery.
//!
//! Nobody waits on a background batch, so a failing listener cannot return its
//! error to the producer. Instead every failure is logged and, when the host
//! supplied one, forwarded to a [`FailureSink`] channel.

use std::{any::Any, fmt};

use crossbeam::channel::{Receiver, Sender, unbounded};
use thiserror::Error;

use crate::error::HandlerError;

/// Why a listener failed to handle an event.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("handler returned an error: {0}")]
    Error(#[source] HandlerError),
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl FailureCause {
    /// Builds a cause from a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        FailureCause::Panic(message)
    }
}

/// A listener that failed during an asynchronous batch.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub event: &'static str,
    pub listener: &'static str,
    pub cause: FailureCause,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listener {} failed to handle {}: {}",
            self.listener, self.event, self.cause
        )
    }
}

/// Host-supplied destination for [`DeliveryFailure`]s.
///
/// The default sink only logs.
#[derive(Clone, Default)]
pub struct FailureSink {
    sender: Option<Sender<DeliveryFailure>>,
}

impl FailureSink {
    pub fn new(sender: Sender<DeliveryFailure>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn with_receiver() -> (Self, Receiver<DeliveryFailure>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    /// A sink that only logs failures.
    pub fn discard() -> Self {
        Self { sender: None }
    }

    pub(crate) fn report(&self, failure: DeliveryFailure) {
        log::error!("{failure}");
        if let Some(sender) = &self.sender {
            // A receiver the host dropped is not our problem.
            let _ = sender.try_send(failure);
        }
    }
}

impl fmt::Debug for FailureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureSink")
            .field("forwarding", &self.sender.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    fn failure(cause: FailureCause) -> DeliveryFailure {
        DeliveryFailure {
            event: "Ping",
            listener: "audit",
            cause,
        }
    }

    #[test]
    fn report_forwards_to_receiver() {
        // Given
        let (sink, receiver) = FailureSink::with_receiver();

        // When
        sink.report(failure(FailureCause::Panic("boom".to_owned())));

        // Then
        let received = receiver.try_recv().unwrap();
        assert_eq!(received.listener, "audit");
        assert!(matches!(received.cause, FailureCause::Panic(ref m) if m == "boom"));
    }

    #[test]
    fn report_survives_dropped_receiver() {
        let (sink, receiver) = FailureSink::with_receiver();
        drop(receiver);

        sink.report(failure(FailureCause::Panic("boom".to_owned())));
    }

    #[test]
    fn discard_sink_does_not_forward() {
        let sink = FailureSink::discard();

        sink.report(failure(FailureCause::Error("nope".into())));

        assert!(format!("{sink:?}").contains("forwarding: false"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let str_payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        let string_payload = panic::catch_unwind(|| panic!("{} message", "formatted")).unwrap_err();

        assert!(matches!(
            FailureCause::from_panic(str_payload),
            FailureCause::Panic(ref m) if m == "static message"
        ));
        assert!(matches!(
            FailureCause::from_panic(string_payload),
            FailureCause::Panic(ref m) if m == "formatted message"
        ));
    }

    #[test]
    fn display_names_listener_event_and_cause() {
        let text = failure(FailureCause::Error("disk full".into())).to_string();

        assert_eq!(
            text,
            "listener audit failed to handle Ping: handler returned an error: disk full"
        );
    }
}
