use super::{
    errors::PoolError,
    handle::Publisher,
    value::TypedValue,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};


/// Единица работы, тип результата стирается на границе пула
///
/// ```
/// use std::sync::Arc;
/// use taskpool::{Task, ThreadPool, TypedValue};
///
/// struct Sum(u64, u64);
///
/// impl Task for Sum {
///     fn run(&self) -> TypedValue {
///         TypedValue::new((self.0..=self.1).sum::<u64>())
///     }
/// }
///
/// let pool = ThreadPool::new();
/// pool.start(1).unwrap();
/// let handle = pool.submit(Arc::new(Sum(1, 100)));
/// assert_eq!(handle.get().extract::<u64>().unwrap(), 5050);
/// ```
pub trait Task: Send + Sync + 'static {
    fn run(&self) -> TypedValue;
}

impl<F> Task for F
where
    F: Fn() -> TypedValue + Send + Sync + 'static,
{
    #[inline]
    fn run(&self) -> TypedValue {
        self()
    }
}

pub(crate) type Work = Box<dyn FnOnce() -> TypedValue + Send + 'static>;

pub(crate) enum JobOutcome {
    Completed,
    Failed,
    Panicked(String),
}

/// Задача в очереди, связанная со своим handle.
///
/// `execute` принимает `self`, поэтому задача выполняется не более одного раза.
pub(crate) struct Job {
    work: Work,
    publisher: Publisher,
}

impl Job {
    pub(crate) fn new(work: Work, publisher: Publisher) -> Self {
        Self { work, publisher }
    }

    pub(crate) fn from_task(task: Arc<dyn Task>, publisher: Publisher) -> Self {
        Self::new(Box::new(move || task.run()), publisher)
    }

    /// Выполняет работу и всегда что-то публикует, даже при панике
    pub(crate) fn execute(self) -> JobOutcome {
        let Job { work, publisher } = self;
        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => {
                let outcome = if value.is_error() {
                    JobOutcome::Failed
                } else {
                    JobOutcome::Completed
                };
                publisher.publish(value);
                outcome
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                publisher.publish(TypedValue::from_error(PoolError::TaskPanicked(msg.clone())));
                JobOutcome::Panicked(msg)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
