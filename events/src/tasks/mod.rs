mod executor;

pub(crate) use executor::{Executor, ExecutorHandle, TaskError, TaskFuture};
