use super::errors::{PoolError, PoolResult};
use std::{
    any::{type_name, Any},
    fmt,
};

enum Slot {
    Empty,
    Value {
        value: Box<dyn Any + Send>,
        type_name: &'static str,
    },
    Error(PoolError),
}

/// Контейнер со стёртым типом для результата задачи.
///
/// Тип проверяется при извлечении: `u64` нельзя прочитать как другой тип.
pub struct TypedValue {
    slot: Slot,
}

impl TypedValue {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            slot: Slot::Value {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        }
    }

    /// Значение, которое читается из handle отклонённой отправки
    pub fn empty() -> Self {
        Self { slot: Slot::Empty }
    }

    /// Задача сообщает об ошибке через handle вместо значения
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::from_error(PoolError::TaskFailed(msg.into()))
    }

    pub(crate) fn from_error(err: PoolError) -> Self {
        Self {
            slot: Slot::Error(err),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.slot, Slot::Error(_))
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        match &self.slot {
            Slot::Value { value, .. } => value.is::<T>(),
            _ => false,
        }
    }

    /// Имя хранимого типа
    pub fn type_name(&self) -> Option<&'static str> {
        match &self.slot {
            Slot::Value { type_name, .. } => Some(*type_name),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.slot {
            Slot::Value { value, .. } => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Извлекает значение как `T`.
    ///
    /// [`PoolError::TypeMismatch`] при другом типе, [`PoolError::Empty`] для
    /// пустого значения, сохранённая ошибка если задача упала.
    pub fn extract<T: Any>(self) -> PoolResult<T> {
        match self.slot {
            Slot::Value { value, type_name } => value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| PoolError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    found: type_name,
                }),
            Slot::Empty => Err(PoolError::Empty),
            Slot::Error(err) => Err(err),
        }
    }

    /// Как [`extract`](Self::extract), но пустое значение даёт `T::default()`
    pub fn extract_or_default<T: Any + Default>(self) -> PoolResult<T> {
        if self.is_empty() {
            return Ok(T::default());
        }
        self.extract()
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Empty => f.write_str("TypedValue(<empty>)"),
            Slot::Value { type_name, .. } => write!(f, "TypedValue(<{}>)", type_name),
            Slot::Error(err) => write!(f, "TypedValue(error: {})", err),
        }
    }
}
