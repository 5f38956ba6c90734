use super::{
    errors::{PoolError, PoolResult},
    handle::{self, Publisher, ResultHandle, TaskHandle},
    model::{PoolMetrics, PoolMode},
    task::{Job, JobOutcome, Task, Work},
    value::TypedValue,
    worker::{LoopBody, Worker, WorkerId},
};
use std::{
    any::Any,
    collections::{HashMap, VecDeque},
    sync::{Arc, Weak},
    time::{Duration, Instant},
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};


const TASK_MAX_THRESHOLD: usize = i32::MAX as usize;
const THREAD_MAX_THRESHOLD: usize = 100;
const THREAD_MAX_IDLE_TIME: Duration = Duration::from_secs(10);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(1);
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Конфигурация пула. Фиксируется после `start`.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: PoolMode,
    /// Максимум задач в очереди
    pub queue_capacity: usize,
    /// Потолок воркеров в [`PoolMode::Elastic`]
    pub max_workers: usize,
    /// Сколько лишний воркер может простаивать до выхода
    pub keep_alive: Duration,
    /// Интервал ожидания между проверками простоя
    pub poll_interval: Duration,
    /// Сколько `submit` ждёт места в очереди до отказа
    pub submit_timeout: Duration,
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: PoolMode::Fixed,
            queue_capacity: TASK_MAX_THRESHOLD,
            max_workers: THREAD_MAX_THRESHOLD,
            keep_alive: THREAD_MAX_IDLE_TIME,
            poll_interval: IDLE_POLL_INTERVAL,
            submit_timeout: SUBMIT_TIMEOUT,
            thread_name: "taskpool-worker".to_owned(),
        }
    }
}

impl Config {
    pub fn fixed() -> Self {
        Self::default()
    }

    pub fn elastic() -> Self {
        Self {
            mode: PoolMode::Elastic,
            max_workers: (num_cpus::get() * 4).max(4),
            ..Default::default()
        }
    }

    pub fn cpu_bound() -> Self {
        Self {
            mode: PoolMode::Fixed,
            queue_capacity: num_cpus::get() * 64,
            ..Default::default()
        }
    }
}


struct State {
    config: Config,
    queue: VecDeque<Job>,
    workers: HashMap<WorkerId, Worker>,
    next_worker_id: WorkerId,
    initial_workers: usize,
    current_workers: usize,
    idle_workers: usize,
    running: bool,
    submitted: usize,
    completed: usize,
    failed: usize,
    rejected: usize,
}

impl State {
    /// Снимает воркер с учёта. Ожидающий воркер всегда числится простаивающим
    fn deregister(&mut self, id: WorkerId) {
        if self.workers.remove(&id).is_some() {
            self.current_workers -= 1;
            self.idle_workers -= 1;
        }
    }
}

/// Состояние под единственным мьютексом пула и три условные переменные
struct Shared {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    exited: Condvar,
}

impl Shared {
    fn enqueue(self: &Arc<Self>, make_job: impl FnOnce(Publisher) -> Job) -> ResultHandle {
        let mut state = self.state.lock();

        let timeout = state.config.submit_timeout;
        self.not_full.wait_while_for(
            &mut state,
            |s| s.queue.len() >= s.config.queue_capacity,
            timeout,
        );

        if state.queue.len() >= state.config.queue_capacity {
            let capacity = state.config.queue_capacity;
            state.rejected += 1;
            warn!(capacity, ?timeout, "task queue is full, submission rejected");
            return ResultHandle::rejected(capacity, timeout);
        }

        let (publisher, handle) = handle::channel();
        state.queue.push_back(make_job(publisher));
        state.submitted += 1;
        self.not_empty.notify_all();

        if state.running
            && state.config.mode == PoolMode::Elastic
            && state.queue.len() > state.idle_workers
            && state.current_workers < state.config.max_workers
        {
            match self.spawn_worker(&mut state) {
                Ok(id) => debug!(
                    worker = id,
                    current = state.current_workers,
                    queued = state.queue.len(),
                    "spawned elastic worker"
                ),
                Err(err) => warn!(error = %err, "failed to spawn elastic worker"),
            }
        }

        handle
    }

    /// Регистрирует и запускает воркер. Счётчики растут только после
    /// создания потока
    fn spawn_worker(self: &Arc<Self>, state: &mut State) -> PoolResult<WorkerId> {
        let id = state.next_worker_id;
        state.next_worker_id += 1;

        let shared: Weak<Shared> = Arc::downgrade(self);
        let body: LoopBody = Arc::new(move |id: WorkerId| {
            if let Some(shared) = shared.upgrade() {
                shared.run_worker(id);
            }
        });

        let worker = Worker::new(id, body);
        worker.start(&state.config.thread_name)?;
        state.workers.insert(worker.id(), worker);
        state.current_workers += 1;
        state.idle_workers += 1;
        Ok(id)
    }

    fn run_worker(&self, id: WorkerId) {
        debug!(worker = id, "worker started");
        let mut last_active = Instant::now();

        loop {
            let job = {
                let mut state = self.state.lock();

                while state.queue.is_empty() {
                    if !state.running {
                        state.deregister(id);
                        self.exited.notify_all();
                        debug!(worker = id, "worker exited on shutdown");
                        return;
                    }

                    let mode = state.config.mode;
                    match mode {
                        PoolMode::Fixed => self.not_empty.wait(&mut state),
                        PoolMode::Elastic => {
                            let poll = state.config.poll_interval;
                            let timed_out = self.not_empty.wait_for(&mut state, poll).timed_out();
                            if timed_out
                                && state.queue.is_empty()
                                && last_active.elapsed() >= state.config.keep_alive
                                && state.current_workers > state.initial_workers
                            {
                                state.deregister(id);
                                self.exited.notify_all();
                                debug!(
                                    worker = id,
                                    current = state.current_workers,
                                    "idle worker reclaimed"
                                );
                                return;
                            }
                        }
                    }
                }

                let Some(job) = state.queue.pop_front() else {
                    continue;
                };
                state.idle_workers -= 1;
                if !state.queue.is_empty() {
                    self.not_empty.notify_all();
                }
                self.not_full.notify_all();
                job
            };

            // Выполняем без блокировки пула
            let outcome = job.execute();

            let mut state = self.state.lock();
            state.idle_workers += 1;
            match outcome {
                JobOutcome::Completed => state.completed += 1,
                JobOutcome::Failed => state.failed += 1,
                JobOutcome::Panicked(msg) => {
                    state.failed += 1;
                    error!(worker = id, panic = %msg, "task panicked");
                }
            }
            drop(state);
            last_active = Instant::now();
        }
    }

    /// Останавливает пул и ждёт выхода всех воркеров. Повторный вызов безопасен
    fn shutdown(&self) {
        let mut state = self.state.lock();
        state.running = false;
        self.not_empty.notify_all();
        self.exited.wait_while(&mut state, |s| !s.workers.is_empty());

        // Воркеров уже нет; drop задачи завершает её handle как Abandoned
        let abandoned: Vec<Job> = state.queue.drain(..).collect();
        let completed = state.completed;
        drop(state);

        info!(completed, abandoned = abandoned.len(), "thread pool shut down");
        drop(abandoned);
    }
}


/// Пул потоков ОС с ограниченной очередью задач со стёртым типом результата.
///
/// Drop останавливает пул: воркеры разбирают очередь и выходят, drop
/// возвращается только после выхода всех воркеров. Нельзя дропать пул
/// изнутри его собственной задачи.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadPool {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let state = State {
            config,
            queue: VecDeque::new(),
            workers: HashMap::new(),
            next_worker_id: 0,
            initial_workers: 0,
            current_workers: 0,
            idle_workers: 0,
            running: false,
            submitted: 0,
            completed: 0,
            failed: 0,
            rejected: 0,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                exited: Condvar::new(),
            }),
        }
    }

    fn update_config(&self, field: &'static str, f: impl FnOnce(&mut Config)) -> PoolResult<()> {
        let mut state = self.shared.state.lock();
        if state.running {
            warn!(field, "pool is running, configuration change ignored");
            return Err(PoolError::AlreadyRunning);
        }
        f(&mut state.config);
        Ok(())
    }

    pub fn configure(
        &self,
        mode: PoolMode,
        queue_capacity: usize,
        max_workers: usize,
    ) -> PoolResult<()> {
        self.update_config("all", |config| {
            config.mode = mode;
            config.queue_capacity = queue_capacity;
            config.max_workers = max_workers;
        })
    }

    pub fn set_mode(&self, mode: PoolMode) -> PoolResult<()> {
        self.update_config("mode", |config| config.mode = mode)
    }

    pub fn set_queue_capacity(&self, capacity: usize) -> PoolResult<()> {
        self.update_config("queue_capacity", |config| config.queue_capacity = capacity)
    }

    /// Используется только в [`PoolMode::Elastic`]
    pub fn set_max_workers(&self, max_workers: usize) -> PoolResult<()> {
        self.update_config("max_workers", |config| config.max_workers = max_workers)
    }

    pub fn set_keep_alive(&self, keep_alive: Duration) -> PoolResult<()> {
        self.update_config("keep_alive", |config| config.keep_alive = keep_alive)
    }

    /// Запускает `initial_workers` воркеров. Ниже этого числа пул не сжимается
    pub fn start(&self, initial_workers: usize) -> PoolResult<()> {
        let mut state = self.shared.state.lock();
        if state.running {
            warn!("start called on a running pool");
            return Err(PoolError::AlreadyRunning);
        }

        state.running = true;
        state.initial_workers = initial_workers;
        for _ in 0..initial_workers {
            if let Err(err) = self.shared.spawn_worker(&mut state) {
                state.initial_workers = state.current_workers;
                error!(
                    error = %err,
                    started = state.current_workers,
                    requested = initial_workers,
                    "failed to start worker"
                );
                return Err(err);
            }
        }

        info!(
            mode = ?state.config.mode,
            workers = initial_workers,
            capacity = state.config.queue_capacity,
            max_workers = state.config.max_workers,
            "thread pool started"
        );
        Ok(())
    }

    pub fn start_with_available_parallelism(&self) -> PoolResult<()> {
        self.start(num_cpus::get())
    }

    /// Ставит `task` в очередь, ожидая место не дольше таймаута.
    ///
    /// По таймауту задача отбрасывается, а handle невалиден.
    pub fn submit(&self, task: Arc<dyn Task>) -> ResultHandle {
        self.shared
            .enqueue(|publisher| Job::from_task(task, publisher))
    }

    /// Ставит замыкание в очередь, handle типизирован его результатом
    pub fn submit_fn<F, R>(&self, f: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Any + Send,
    {
        let work: Work = Box::new(move || TypedValue::new(f()));
        TaskHandle::new(self.shared.enqueue(|publisher| Job::new(work, publisher)))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn metrics(&self) -> PoolMetrics {
        let state = self.shared.state.lock();
        PoolMetrics {
            mode: state.config.mode,
            running: state.running,
            initial_workers: state.initial_workers,
            current_workers: state.current_workers,
            idle_workers: state.idle_workers,
            queued_tasks: state.queue.len(),
            queue_capacity: state.config.queue_capacity,
            max_workers: state.config.max_workers,
            submitted: state.submitted,
            completed: state.completed,
            failed: state.failed,
            rejected: state.rejected,
        }
    }

    /// Идентификаторы зарегистрированных воркеров по возрастанию
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        let state = self.shared.state.lock();
        let mut ids: Vec<_> = state.workers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}
