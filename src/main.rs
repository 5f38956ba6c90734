use std::{sync::Arc, time::Instant};

use taskpool::{PoolMode, Task, ThreadPool, TypedValue};
use tracing_subscriber::EnvFilter;

struct RangeSum {
    begin: u64,
    end: u64,
}

impl Task for RangeSum {
    fn run(&self) -> TypedValue {
        TypedValue::new((self.begin..=self.end).sum::<u64>())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let now = Instant::now();
    let pool = ThreadPool::new();
    pool.set_mode(PoolMode::Fixed)?;
    pool.start(2)?;

    let handles: Vec<_> = (0..3)
        .map(|_| pool.submit(Arc::new(RangeSum { begin: 1, end: 10_000 })))
        .collect();

    let mut total = 0u64;
    for handle in handles {
        let sum = handle.get().extract::<u64>()?;
        tracing::info!(sum, "task finished");
        total += sum;
    }

    let product = pool.submit_fn(|| (1..=10u64).product::<u64>()).get()?;
    tracing::info!(total, product, "all tasks finished");

    drop(pool);
    tracing::info!(elapsed = ?now.elapsed(), "done");
    Ok(())
}
