use std::time::Duration;

use thiserror::Error;

/// Ошибки пула и извлечения результата
#[derive(Debug, Error)]
pub enum PoolError {
    /// Очередь оставалась полной весь таймаут приёма
    #[error("task queue is full ({capacity} pending), submission rejected after {timeout:?}")]
    Rejected { capacity: usize, timeout: Duration },

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Извлечение из пустого значения
    #[error("no value was published")]
    Empty,

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Задача брошена пулом без выполнения
    #[error("task was abandoned before it ran")]
    Abandoned,

    #[error("pool is already running")]
    AlreadyRunning,

    #[error("failed to spawn worker thread")]
    Spawn(#[from] std::io::Error),
}

impl PoolError {
    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, PoolError::Rejected { .. })
    }

    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, PoolError::TypeMismatch { .. })
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
