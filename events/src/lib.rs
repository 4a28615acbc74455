//! Typed, in-process publish/subscribe.
//!
//! Producers create [`Event`] values, consumers register typed [`Listener`]s in a
//! [`Registry`], and a [`Dispatcher`] delivers each event to every listener
//! registered for its concrete type, either on the calling thread or on a
//! background worker pool.
//!
//! Delivery is local and best-effort: nothing is persisted, retried or sent
//! across processes.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod registry;
mod tasks;

pub use config::Config;
pub use dispatch::{
    BatchReport, DeliveryFailure, Dispatcher, FailureCause, FailureSink, Pending, Strategy,
};
pub use error::{DispatchError, HandlerError, HandlerResult};
pub use event::{Event, EventType};
pub use listener::{FnListener, Listener, ListenerExt, listener_fn};
pub use registry::{Listeners, Registry, SharedListener};
