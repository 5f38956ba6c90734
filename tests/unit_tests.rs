#[cfg(test)]
mod tests {
    use taskpool::{
        Config,
        PoolError,
        PoolMode,
        Task,
        ThreadPool,
        TypedValue,
    };
    use std::{
        panic::{self, PanicHookInfo},
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc, Mutex, MutexGuard,
        },
        thread,
        time::{Duration, Instant},
    };

    struct RangeSum {
        begin: u64,
        end: u64,
    }

    impl Task for RangeSum {
        fn run(&self) -> TypedValue {
            TypedValue::new((self.begin..=self.end).sum::<u64>())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Stats {
        min: i64,
        max: i64,
    }

    fn sum2(a: i32, b: i32) -> i32 {
        a + b
    }

    type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

    static HOOK_LOCK: Mutex<()> = Mutex::new(());

    /// Panic hook глобален для процесса: тесты, которые его меняют, идут по очереди
    fn hook_lock() -> MutexGuard<'static, ()> {
        HOOK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Подменяет panic hook и возвращает прежний при drop
    struct HookGuard {
        previous: Option<PanicHook>,
    }

    impl HookGuard {
        fn replace(hook: PanicHook) -> Self {
            let previous = panic::take_hook();
            panic::set_hook(hook);
            Self {
                previous: Some(previous),
            }
        }

        fn silence() -> Self {
            Self::replace(Box::new(|_| {}))
        }
    }

    impl Drop for HookGuard {
        fn drop(&mut self) {
            if let Some(previous) = self.previous.take() {
                panic::set_hook(previous);
            }
        }
    }

    /// Счётчики обновляются после публикации результата, поэтому ждём.
    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn stats(values: &[i64]) -> Stats {
        Stats {
            min: *values.iter().min().unwrap(),
            max: *values.iter().max().unwrap(),
        }
    }

    #[test]
    fn test_fifo_order() {
        println!("\n=== TEST: FIFO порядок ===");
        let pool = ThreadPool::new();
        pool.start(1).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let order = Arc::clone(&order);
                pool.submit_fn(move || order.lock().unwrap().push(i))
            })
            .collect();

        for handle in handles {
            handle.get().unwrap();
        }

        let order = order.lock().unwrap();
        assert_eq!(*order, (0..50).collect::<Vec<_>>(), "Задачи должны выполняться в порядке отправки");
    }

    #[test]
    fn test_backpressure() {
        println!("\n=== TEST: Backpressure ===");
        let pool = ThreadPool::with_config(Config {
            queue_capacity: 2,
            submit_timeout: Duration::from_millis(300),
            ..Config::default()
        });

        // Не стартуем пул: очередь никто не разбирает
        let first = pool.submit_fn(|| 1);
        let second = pool.submit_fn(|| 2);
        assert!(first.is_valid());
        assert!(second.is_valid());

        let now = Instant::now();
        let rejected = pool.submit(Arc::new(RangeSum { begin: 1, end: 10 }));
        let elapsed = now.elapsed();

        assert!(elapsed >= Duration::from_millis(300), "submit должен ждать таймаут: {:?}", elapsed);
        assert!(!rejected.is_valid());

        let now = Instant::now();
        let value = rejected.get();
        assert!(now.elapsed() < Duration::from_millis(100), "Невалидный handle не должен блокировать");
        assert!(value.is_empty());
        assert_eq!(value.extract_or_default::<u64>().unwrap(), 0);

        let metrics = pool.metrics();
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.queued_tasks, 2);

        // Без воркеров очередь не разобрать: задачи брошены, handle не зависает
        drop(pool);
        assert!(matches!(first.get(), Err(PoolError::Abandoned)));
        assert!(matches!(second.get(), Err(PoolError::Abandoned)));
    }

    #[test]
    fn test_typed_rejection() {
        println!("\n=== TEST: Отказ через типизированный handle ===");
        let pool = ThreadPool::with_config(Config {
            queue_capacity: 0,
            submit_timeout: Duration::from_millis(50),
            ..Config::default()
        });
        pool.start(1).unwrap();

        let handle = pool.submit_fn(|| "never");
        assert!(!handle.is_valid());
        match handle.get() {
            Err(PoolError::Rejected { capacity, timeout }) => {
                assert_eq!(capacity, 0);
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("Ожидали Rejected, получили {:?}", other),
        }
    }

    #[test]
    fn test_heterogeneous_results() {
        println!("\n=== TEST: Результаты разных типов ===");
        let pool = ThreadPool::new();
        pool.start(3).unwrap();

        let int = pool.submit_fn(|| sum2(20, 30));
        let record = pool.submit_fn(|| stats(&[4, -2, 9, 0]));
        let text = pool.submit_fn(|| format!("{}-{}", "task", 7));
        let erased = pool.submit(Arc::new(RangeSum { begin: 1, end: 100 }));
        let closure = pool.submit(Arc::new(|| TypedValue::new(vec![1u8, 2, 3])));

        assert_eq!(int.get().unwrap(), 50);
        assert_eq!(record.get().unwrap(), Stats { min: -2, max: 9 });
        assert_eq!(text.get().unwrap(), "task-7");
        assert_eq!(erased.get().extract::<u64>().unwrap(), 5050);
        assert_eq!(closure.get().extract::<Vec<u8>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_type_mismatch_is_local() {
        println!("\n=== TEST: Несовпадение типа ===");
        let pool = ThreadPool::new();
        pool.start(1).unwrap();

        let handle = pool.submit_fn(|| 7u8);
        let err = handle.into_inner().get().extract::<String>().unwrap_err();
        assert!(err.is_type_mismatch(), "Ожидали TypeMismatch, получили {:?}", err);

        // Пул продолжает работать
        assert_eq!(pool.submit_fn(|| 1 + 1).get().unwrap(), 2);
    }

    #[test]
    fn test_panic_is_contained() {
        println!("\n=== TEST: Паника в задаче ===");
        let _lock = hook_lock();
        let _silenced = HookGuard::silence();

        let pool = ThreadPool::new();
        pool.start(1).unwrap();

        let failing = pool.submit_fn(|| -> u32 { panic!("Test panic") });
        match failing.get() {
            Err(PoolError::TaskPanicked(msg)) => assert_eq!(msg, "Test panic"),
            other => panic!("Ожидали TaskPanicked, получили {:?}", other),
        }

        let explicit = pool.submit(Arc::new(|| TypedValue::failure("bad range")));
        assert!(matches!(
            explicit.get().extract::<u64>(),
            Err(PoolError::TaskFailed(_))
        ));

        // Единственный воркер жив
        assert_eq!(pool.submit_fn(|| 40 + 2).get().unwrap(), 42);

        assert!(wait_until(Duration::from_secs(1), || {
            let metrics = pool.metrics();
            metrics.failed == 2 && metrics.completed == 1
        }));
        assert_eq!(pool.metrics().current_workers, 1);
    }

    #[test]
    fn test_silenced_hook_is_restored() {
        println!("\n=== TEST: Восстановление panic hook ===");
        static REPORTED: AtomicBool = AtomicBool::new(false);

        let _lock = hook_lock();
        let _marker = HookGuard::replace(Box::new(|_| REPORTED.store(true, Ordering::SeqCst)));

        {
            let _silenced = HookGuard::silence();
            let _ = panic::catch_unwind(|| panic!("silenced"));
            assert!(!REPORTED.load(Ordering::SeqCst), "Заглушка не сработала");
        }

        let _ = panic::catch_unwind(|| panic!("reported"));
        assert!(REPORTED.load(Ordering::SeqCst), "Прежний hook не восстановлен");
    }

    #[test]
    fn test_configuration_after_start() {
        println!("\n=== TEST: Конфигурация после старта ===");
        let pool = ThreadPool::new();
        pool.configure(PoolMode::Elastic, 16, 8).unwrap();
        pool.set_keep_alive(Duration::from_secs(5)).unwrap();
        pool.start(2).unwrap();

        assert!(matches!(pool.set_mode(PoolMode::Fixed), Err(PoolError::AlreadyRunning)));
        assert!(matches!(pool.set_queue_capacity(1), Err(PoolError::AlreadyRunning)));
        assert!(matches!(pool.set_max_workers(100), Err(PoolError::AlreadyRunning)));
        assert!(matches!(pool.start(4), Err(PoolError::AlreadyRunning)));

        let metrics = pool.metrics();
        assert_eq!(metrics.mode, PoolMode::Elastic);
        assert_eq!(metrics.queue_capacity, 16);
        assert_eq!(metrics.max_workers, 8);
        assert_eq!(metrics.initial_workers, 2);
        assert_eq!(metrics.current_workers, 2);
    }

    #[test]
    fn test_worker_identities() {
        println!("\n=== TEST: Идентификаторы воркеров ===");
        let pool = ThreadPool::new();
        assert!(pool.worker_ids().is_empty());
        pool.start(3).unwrap();
        assert_eq!(pool.worker_ids(), vec![0, 1, 2]);
        assert!(pool.is_running());
    }

    #[test]
    fn test_sum_scenario() {
        println!("\n=== TEST: Три суммы 1..10000 на двух воркерах ===");
        let pool = ThreadPool::new();
        pool.set_mode(PoolMode::Fixed).unwrap();
        pool.start(2).unwrap();

        let handles: Vec<_> = (0..3)
            .map(|_| pool.submit(Arc::new(RangeSum { begin: 1, end: 10_000 })))
            .collect();

        for handle in handles {
            assert_eq!(handle.get().extract::<u64>().unwrap(), 50_005_000);
        }

        let now = Instant::now();
        drop(pool);
        assert!(now.elapsed() < Duration::from_secs(1), "Drop должен завершиться быстро");
    }

    #[test]
    fn test_shutdown_waits_for_running_tasks() {
        println!("\n=== TEST: Drop ждёт выполняющиеся задачи ===");
        let pool = ThreadPool::new();
        pool.start(2).unwrap();

        let finished = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let finished = Arc::clone(&finished);
                pool.submit_fn(move || {
                    thread::sleep(Duration::from_millis(200));
                    finished.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        // Дать воркерам взять первые задачи
        thread::sleep(Duration::from_millis(20));

        let now = Instant::now();
        drop(pool);
        assert!(now.elapsed() >= Duration::from_millis(150), "Drop вернулся до завершения задач");
        assert_eq!(finished.load(Ordering::SeqCst), 4, "Очередь должна быть разобрана до выхода воркеров");

        for handle in handles {
            assert!(handle.get().is_ok());
        }
    }

    #[test]
    fn test_handle_outlives_pool() {
        println!("\n=== TEST: Handle переживает пул ===");
        let handle = {
            let pool = ThreadPool::new();
            pool.start(1).unwrap();
            pool.submit_fn(|| String::from("kept"))
        };
        assert_eq!(handle.get().unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_await_handles() {
        println!("\n=== TEST: Ожидание handle из async ===");
        let pool = ThreadPool::new();
        pool.start(2).unwrap();

        let typed = pool.submit_fn(|| {
            thread::sleep(Duration::from_millis(20));
            21 * 2
        });
        let erased = pool.submit(Arc::new(RangeSum { begin: 1, end: 10 }));

        assert_eq!(typed.await.unwrap(), 42);
        assert_eq!(erased.await.extract::<u64>().unwrap(), 55);
    }
}
