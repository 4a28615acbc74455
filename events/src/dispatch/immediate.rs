//! Same-thread, blocking delivery.

use std::any;

use crate::{
    dispatch::BatchReport,
    error::DispatchError,
    event::Event,
    registry::Listeners,
};

/// Delivers `event` to every listener in order on the calling thread.
///
/// The first handler error stops the batch: later listeners are not invoked and
/// the error is returned. A panicking handler unwinds into the caller.
pub(crate) fn dispatch_to<E: Event>(
    event: &E,
    listeners: &Listeners<E>,
) -> Result<BatchReport, DispatchError> {
    for listener in listeners {
        listener
            .handle(event)
            .map_err(|source| DispatchError::Handler {
                event: any::type_name::<E>(),
                listener: listener.name(),
                source,
            })?;
    }

    Ok(BatchReport {
        delivered: listeners.len(),
        failed: 0,
    })
}
