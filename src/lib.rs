//! Пул потоков ОС с ограниченной очередью задач и типизированными результатами
//!
//! # Features
//! - Фиксированный и эластичный режимы (рост под нагрузкой, сжатие при простое)
//! - Backpressure: `submit` ждёт место в очереди не дольше таймаута
//! - Результаты любого типа через единый интерфейс с проверкой типа при извлечении
//! - Паника в задаче не убивает воркер, ошибка доставляется в handle
//! - Drop пула блокируется до выхода всех воркеров

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod task;
pub mod value;
pub mod worker;

pub use errors::{PoolError, PoolResult};
pub use handle::{ResultHandle, TaskHandle};
pub use model::{PoolMetrics, PoolMode};
pub use pool::{Config, ThreadPool};
pub use task::Task;
pub use value::TypedValue;
pub use worker::WorkerId;
