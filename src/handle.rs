use super::{
    errors::{PoolError, PoolResult},
    value::TypedValue,
};
use std::{
    any::Any,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use futures::channel::oneshot;


/// Сторона производителя для [`ResultHandle`]. `publish` поглощает его,
/// повторная публикация невозможна
pub(crate) struct Publisher {
    tx: oneshot::Sender<TypedValue>,
}

impl Publisher {
    #[inline]
    pub(crate) fn publish(self, value: TypedValue) {
        // Потребитель мог уже бросить handle, это не ошибка
        let _ = self.tx.send(value);
    }
}

pub(crate) fn channel() -> (Publisher, ResultHandle) {
    let (tx, rx) = oneshot::channel();
    (
        Publisher { tx },
        ResultHandle {
            state: HandleState::Pending(rx),
        },
    )
}

enum HandleState {
    Pending(oneshot::Receiver<TypedValue>),
    Rejected { capacity: usize, timeout: Duration },
}

/// Одноразовый handle на результат отправленной [`Task`](crate::task::Task).
///
/// Handle отклонённой отправки невалиден: чтение сразу возвращает
/// [`TypedValue::empty`] без блокировки.
pub struct ResultHandle {
    state: HandleState,
}

impl ResultHandle {
    pub(crate) fn rejected(capacity: usize, timeout: Duration) -> Self {
        Self {
            state: HandleState::Rejected { capacity, timeout },
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self.state, HandleState::Pending(_))
    }

    /// Блокирует до публикации результата.
    ///
    /// Если задача брошена без выполнения, значение несёт [`PoolError::Abandoned`].
    pub fn get(self) -> TypedValue {
        match self.state {
            HandleState::Pending(rx) => {
                futures::executor::block_on(rx).unwrap_or_else(|_| abandoned())
            }
            HandleState::Rejected { .. } => TypedValue::empty(),
        }
    }

    fn rejection(&self) -> Option<PoolError> {
        match self.state {
            HandleState::Rejected { capacity, timeout } => {
                Some(PoolError::Rejected { capacity, timeout })
            }
            HandleState::Pending(_) => None,
        }
    }
}

#[inline]
fn abandoned() -> TypedValue {
    TypedValue::from_error(PoolError::Abandoned)
}

impl Future for ResultHandle {
    type Output = TypedValue;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            HandleState::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|res| res.unwrap_or_else(|_| abandoned())),
            HandleState::Rejected { .. } => Poll::Ready(TypedValue::empty()),
        }
    }
}


/// Типизированная обёртка над [`ResultHandle`], её возвращает
/// [`ThreadPool::submit_fn`](crate::pool::ThreadPool::submit_fn)
pub struct TaskHandle<T> {
    inner: ResultHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TaskHandle<T> {
    pub(crate) fn new(inner: ResultHandle) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// Блокирует до результата. Отклонённая отправка сразу даёт
    /// [`PoolError::Rejected`]
    pub fn get(self) -> PoolResult<T> {
        if let Some(err) = self.inner.rejection() {
            return Err(err);
        }
        self.inner.get().extract::<T>()
    }

    pub fn into_inner(self) -> ResultHandle {
        self.inner
    }
}

impl<T: Any> Future for TaskHandle<T> {
    type Output = PoolResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(err) = this.inner.rejection() {
            return Poll::Ready(Err(err));
        }
        Pin::new(&mut this.inner).poll(cx).map(TypedValue::extract::<T>)
    }
}
