use std::{
    io,
    sync::Arc,
    thread,
};

/// Идентификатор воркера в пределах пула, не переиспользуется
pub type WorkerId = usize;

pub(crate) type LoopBody = Arc<dyn Fn(WorkerId) + Send + Sync + 'static>;

/// Идентификатор и цикл воркера. Состояния задач не хранит
pub(crate) struct Worker {
    id: WorkerId,
    body: LoopBody,
}

impl Worker {
    pub(crate) fn new(id: WorkerId, body: LoopBody) -> Self {
        Self { id, body }
    }

    #[inline]
    pub(crate) fn id(&self) -> WorkerId {
        self.id
    }

    /// Запускает цикл в отсоединённом потоке ОС. Поток завершается только
    /// возвратом из цикла
    pub(crate) fn start(&self, name_prefix: &str) -> io::Result<()> {
        let body = Arc::clone(&self.body);
        let id = self.id;
        thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || body(id))
            .map(drop)
    }
}
