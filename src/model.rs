/// Режим управления числом воркеров
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolMode {
    /// Ровно столько воркеров, сколько передано в `start`
    #[default]
    Fixed,
    /// Растёт под нагрузкой до `max_workers` и сжимается до начального
    /// числа после простоя дольше `keep_alive`
    Elastic,
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub mode: PoolMode,
    pub running: bool,
    pub initial_workers: usize,
    pub current_workers: usize,
    pub idle_workers: usize,
    pub queued_tasks: usize,
    pub queue_capacity: usize,
    pub max_workers: usize,
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    pub rejected: usize,
}

impl PoolMetrics {
    /// Доля воркеров, занятых задачей
    pub fn utilization(&self) -> f64 {
        if self.current_workers == 0 {
            return 0.0;
        }
        let busy = self.current_workers.saturating_sub(self.idle_workers);
        busy as f64 / self.current_workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.completed as f64 / total as f64
    }
}
