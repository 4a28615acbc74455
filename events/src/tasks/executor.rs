use crossbeam::channel::{Receiver, Sender, unbounded};
use std::{io, thread};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of named worker threads.
/// Tasks are submitted through an [`ExecutorHandle`] and run by the workers.
pub(crate) struct Executor {
    sender: Sender<Message>,
    workers: Vec<Worker>,
}

enum Message {
    Task(Task),
    Shutdown,
}

struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Executor {
    /// Creates a new executor with `size` worker threads named `{name}-{index}`.
    pub(crate) fn new(size: usize, name: &str) -> io::Result<Self> {
        if size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "thread pool size must be greater than 0",
            ));
        }

        let (sender, receiver) = unbounded();
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            workers.push(Worker::new(id, name, receiver.clone())?);
        }

        Ok(Executor { sender, workers })
    }

    /// Returns a handle that can be used to submit tasks from any thread.
    pub(crate) fn handle(&self) -> ExecutorHandle {
        ExecutorHandle {
            sender: self.sender.clone(),
        }
    }

    /// Returns the number of worker threads in the pool.
    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        // Shutdown messages queue behind every task already submitted.
        for _ in &self.workers {
            let _ = self.sender.send(Message::Shutdown);
        }

        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    log::warn!("dispatch worker {} panicked during shutdown", worker.id);
                }
            }
        }
    }
}

impl Worker {
    fn new(id: usize, name: &str, receiver: Receiver<Message>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("{name}-{id}"))
            .spawn(move || {
                loop {
                    match receiver.recv() {
                        Ok(Message::Task(task)) => {
                            task();
                        }
                        Ok(Message::Shutdown) => {
                            break;
                        }
                        Err(_) => {
                            // Channel disconnected, exit
                            break;
                        }
                    }
                }
            })?;

        Ok(Worker {
            id,
            handle: Some(handle),
        })
    }
}

/// A handle to submit tasks to an executor.
/// Tasks start in FIFO order, but completion order is non-deterministic.
#[derive(Clone)]
pub(crate) struct ExecutorHandle {
    sender: Sender<Message>,
}

impl ExecutorHandle {
    /// Spawns a task and returns a future that resolves to the task's result.
    pub(crate) fn spawn<F, T>(&self, f: F) -> Result<TaskFuture<T>, TaskError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = crossbeam::channel::bounded(1);

        let task: Task = Box::new(move || {
            let result = f();
            let _ = tx.send(result);
        });
        self.sender
            .send(Message::Task(task))
            .map_err(|_| TaskError::Closed)?;

        Ok(TaskFuture { receiver: rx })
    }
}

/// A future representing the result of a spawned task.
/// The result can be received once; callers that poll must keep it.
pub(crate) struct TaskFuture<T> {
    receiver: Receiver<T>,
}

impl<T> TaskFuture<T> {
    /// Waits for the task to complete and returns its result.
    /// This blocks the current thread until the task finishes execution.
    pub(crate) fn wait(self) -> Result<T, TaskError> {
        self.receiver.recv().map_err(|_| TaskError::Failed)
    }

    /// Attempts to get the result without blocking.
    /// Returns `Ok(Some(result))` if ready, `Ok(None)` if not ready yet,
    /// or `Err` if the task failed.
    pub(crate) fn try_wait(&self) -> Result<Option<T>, TaskError> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(crossbeam::channel::TryRecvError::Empty) => Ok(None),
            Err(crossbeam::channel::TryRecvError::Disconnected) => Err(TaskError::Failed),
        }
    }
}

/// Error type for task execution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TaskError {
    /// The executor no longer accepts tasks.
    #[error("executor is shut down")]
    Closed,
    /// The task failed to complete (executor was dropped or task panicked).
    #[error("task did not complete")]
    Failed,
}
