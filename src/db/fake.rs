//! In-memory driver for tests. Counts connection lifecycle events and answers
//! statements from a script.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;

use crate::db::{
    driver::{DbDriver, DbSession, StatementOutput, Target},
    error::{DbError, ErrorKind},
    value::Param,
};

pub type Script = Arc<dyn Fn(&str, &[Param]) -> Result<StatementOutput, DbError> + Send + Sync>;

#[derive(Debug, Default)]
pub struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct FakeDriver {
    counters: Arc<Counters>,
    script: Script,
    refuse: Option<ErrorKind>,
    server_version: i32,
}

impl FakeDriver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &[Param]) -> Result<StatementOutput, DbError> + Send + Sync + 'static,
    {
        Self::scripted(Arc::new(f))
    }

    pub fn scripted(script: Script) -> Self {
        Self {
            counters: Arc::default(),
            script,
            refuse: None,
            server_version: 150_004,
        }
    }

    /// Every connect attempt fails with `kind`.
    pub fn refusing(kind: ErrorKind) -> Self {
        let mut driver = Self::new(|_, _| Ok(StatementOutput::Affected(0)));
        driver.refuse = Some(kind);
        driver
    }

    pub fn with_server_version(mut self, version: i32) -> Self {
        self.server_version = version;
        self
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

#[async_trait]
impl DbDriver for FakeDriver {
    async fn connect(&self, _target: Target) -> Result<Box<dyn DbSession>, DbError> {
        if let Some(kind) = self.refuse {
            return Err(DbError::new(kind, format!("fake driver refused: {kind}")));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            counters: self.counters.clone(),
            script: self.script.clone(),
            server_version: self.server_version,
        }))
    }
}

struct FakeSession {
    counters: Arc<Counters>,
    script: Script,
    server_version: i32,
}

#[async_trait]
impl DbSession for FakeSession {
    async fn begin(&mut self) -> Result<(), DbError> {
        self.counters.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn run(
        &mut self,
        sql: &str,
        params: &[Param],
        _fetch: bool,
    ) -> Result<StatementOutput, DbError> {
        (self.script)(sql.trim(), params)
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn server_version(&mut self) -> Result<i32, DbError> {
        Ok(self.server_version)
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}
