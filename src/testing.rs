//! Scripted fake driver and recording tracer/logger for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Options;
use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, Connector, Driver, ExecResult, Execer, ExecerContext,
    NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Rows, Stmt, StmtExecContext,
    StmtQueryContext, Tx, TxOptions, Value,
};
use crate::error::{Error, Result};
use crate::log::LogRecord;
use crate::ops::OpKind;
use crate::trace::Span;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Recording tracer and logger

#[derive(Debug, Clone)]
pub(crate) struct SpanRecord {
    pub op: OpKind,
    pub labels: Vec<(String, String)>,
    pub error: Option<String>,
    /// Whether the outcome was recorded at all, success included.
    pub status_set: bool,
    pub finished: bool,
}

impl SpanRecord {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LogEntry {
    pub op: OpKind,
    pub query: Option<String>,
    pub args: Option<String>,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Collects every span and log record produced through its [`Options`].
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> Options {
        let logs = self.logs.clone();
        Options::new()
            .with_tracer(RecordingTracer {
                spans: self.spans.clone(),
            })
            .with_logger(move |_: &Context, op: OpKind, record: &LogRecord<'_>| {
                lock(&logs).push(LogEntry {
                    op,
                    query: record.query.map(str::to_string),
                    args: record.args.map(str::to_string),
                    error: record.error.map(ToString::to_string),
                    duration: record.duration,
                });
            })
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        lock(&self.spans).clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        lock(&self.logs).clone()
    }

    pub fn span_ops(&self) -> Vec<OpKind> {
        self.spans().iter().map(|s| s.op).collect()
    }

    pub fn log_ops(&self) -> Vec<OpKind> {
        self.logs().iter().map(|l| l.op).collect()
    }
}

struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl crate::trace::Tracer for RecordingTracer {
    fn span(&self, _ctx: &Context) -> Box<dyn Span> {
        Box::new(RecordingSpan {
            spans: self.spans.clone(),
            index: None,
        })
    }
}

/// `index` is `None` for the context's own span, which is never recorded.
struct RecordingSpan {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    index: Option<usize>,
}

impl RecordingSpan {
    fn update(&self, f: impl FnOnce(&mut SpanRecord)) {
        if let Some(index) = self.index {
            f(&mut lock(&self.spans)[index]);
        }
    }
}

impl Span for RecordingSpan {
    fn new_child(&self, op: OpKind) -> Box<dyn Span> {
        let mut spans = lock(&self.spans);
        spans.push(SpanRecord {
            op,
            labels: Vec::new(),
            error: None,
            status_set: false,
            finished: false,
        });
        Box::new(RecordingSpan {
            spans: self.spans.clone(),
            index: Some(spans.len() - 1),
        })
    }

    fn set_label(&mut self, key: &str, value: &str) {
        self.update(|s| s.labels.push((key.to_string(), value.to_string())));
    }

    fn set_error(&mut self, err: Option<&Error>) {
        let err = err.map(ToString::to_string);
        self.update(|s| {
            s.error = err;
            s.status_set = true;
        });
    }

    fn finish(self: Box<Self>) {
        self.update(|s| {
            assert!(!s.finished, "span finished twice");
            s.finished = true;
        });
    }
}

// ---------------------------------------------------------------------------
// Captured `tracing` output

/// In-memory sink for a plain-text `tracing_subscriber::fmt` subscriber.
#[derive(Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn subscriber(&self, level: tracing::Level) -> impl tracing::Subscriber + Send + Sync {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&lock(&self.0))
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake driver

/// Every driver method the fakes can receive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Prepare(String),
    PrepareContext(String),
    Close,
    Begin,
    BeginTx,
    Exec(String, Vec<Value>),
    ExecContext(String, Vec<NamedValue>),
    Query(String, Vec<Value>),
    QueryContext(String, Vec<NamedValue>),
    Ping,
    CheckNamedValue,
    StmtClose,
    StmtExec(Vec<Value>),
    StmtExecContext(Vec<NamedValue>),
    StmtQuery(Vec<Value>),
    StmtQueryContext(Vec<NamedValue>),
    Commit,
    Rollback,
    RowsNext,
    RowsClose,
    LastInsertId,
    RowsAffected,
    Open(String),
    Connect,
}

/// Optional capabilities a fake connection advertises.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Caps {
    pub begin_tx: bool,
    pub prepare_context: bool,
    pub execer: bool,
    pub execer_context: bool,
    pub queryer: bool,
    pub queryer_context: bool,
    pub pinger: bool,
    pub checker: bool,
    pub stmt_exec_context: bool,
    pub stmt_query_context: bool,
}

impl Caps {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn legacy() -> Self {
        Self {
            execer: true,
            queryer: true,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            begin_tx: true,
            prepare_context: true,
            execer: true,
            execer_context: true,
            queryer: true,
            queryer_context: true,
            pinger: true,
            checker: true,
            stmt_exec_context: true,
            stmt_query_context: true,
        }
    }
}

/// State shared by a fake connection and everything it hands out.
#[derive(Default)]
pub(crate) struct Script {
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<Error>>,
    rows: Mutex<Vec<Vec<Value>>>,
}

impl Script {
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Make the next driver call fail with `err`.
    pub fn fail_next(&self, err: Error) {
        *lock(&self.failure) = Some(err);
    }

    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *lock(&self.rows) = rows;
    }

    fn record(&self, call: Call) -> Result<()> {
        lock(&self.calls).push(call);
        match lock(&self.failure).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn rows_for(script: &Arc<Script>) -> Box<dyn Rows> {
        Box::new(FakeRows {
            script: script.clone(),
            rows: lock(&script.rows).clone().into(),
        })
    }
}

pub(crate) struct FakeConn {
    pub caps: Caps,
    pub script: Arc<Script>,
}

impl FakeConn {
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            script: Arc::new(Script::default()),
        }
    }

    fn stmt(&self) -> Box<dyn Stmt> {
        Box::new(FakeStmt {
            caps: self.caps,
            script: self.script.clone(),
        })
    }

    fn tx(&self) -> Box<dyn Tx> {
        Box::new(FakeTx {
            script: self.script.clone(),
        })
    }

    fn result(&self) -> Box<dyn ExecResult> {
        Box::new(FakeResult {
            script: self.script.clone(),
        })
    }
}

#[async_trait]
impl Conn for FakeConn {
    async fn prepare(&self, query: &str) -> Result<Box<dyn Stmt>> {
        self.script.record(Call::Prepare(query.to_string()))?;
        Ok(self.stmt())
    }

    async fn close(&self) -> Result<()> {
        self.script.record(Call::Close)
    }

    async fn begin(&self) -> Result<Box<dyn Tx>> {
        self.script.record(Call::Begin)?;
        Ok(self.tx())
    }

    fn as_begin_tx(&self) -> Option<&dyn ConnBeginTx> {
        self.caps.begin_tx.then_some(self as &dyn ConnBeginTx)
    }

    fn as_prepare_context(&self) -> Option<&dyn ConnPrepareContext> {
        self.caps.prepare_context.then_some(self as &dyn ConnPrepareContext)
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        self.caps.execer.then_some(self as &dyn Execer)
    }

    fn as_execer_context(&self) -> Option<&dyn ExecerContext> {
        self.caps.execer_context.then_some(self as &dyn ExecerContext)
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        self.caps.queryer.then_some(self as &dyn Queryer)
    }

    fn as_queryer_context(&self) -> Option<&dyn QueryerContext> {
        self.caps.queryer_context.then_some(self as &dyn QueryerContext)
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        self.caps.pinger.then_some(self as &dyn Pinger)
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        self.caps.checker.then_some(self as &dyn NamedValueChecker)
    }
}

#[async_trait]
impl ConnBeginTx for FakeConn {
    async fn begin_tx(&self, _ctx: &Context, _opts: TxOptions) -> Result<Box<dyn Tx>> {
        self.script.record(Call::BeginTx)?;
        Ok(self.tx())
    }
}

#[async_trait]
impl ConnPrepareContext for FakeConn {
    async fn prepare_context(&self, _ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        self.script.record(Call::PrepareContext(query.to_string()))?;
        Ok(self.stmt())
    }
}

#[async_trait]
impl Execer for FakeConn {
    async fn exec(&self, query: &str, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        self.script.record(Call::Exec(query.to_string(), args.to_vec()))?;
        Ok(self.result())
    }
}

#[async_trait]
impl ExecerContext for FakeConn {
    async fn exec_context(
        &self,
        _ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        self.script
            .record(Call::ExecContext(query.to_string(), args.to_vec()))?;
        Ok(self.result())
    }
}

#[async_trait]
impl Queryer for FakeConn {
    async fn query(&self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        self.script.record(Call::Query(query.to_string(), args.to_vec()))?;
        Ok(Script::rows_for(&self.script))
    }
}

#[async_trait]
impl QueryerContext for FakeConn {
    async fn query_context(
        &self,
        _ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        self.script
            .record(Call::QueryContext(query.to_string(), args.to_vec()))?;
        Ok(Script::rows_for(&self.script))
    }
}

#[async_trait]
impl Pinger for FakeConn {
    async fn ping(&self, _ctx: &Context) -> Result<()> {
        self.script.record(Call::Ping)
    }
}

impl NamedValueChecker for FakeConn {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()> {
        self.script.record(Call::CheckNamedValue)?;
        value.name = None;
        Ok(())
    }
}

pub(crate) struct FakeStmt {
    caps: Caps,
    script: Arc<Script>,
}

#[async_trait]
impl Stmt for FakeStmt {
    async fn close(&self) -> Result<()> {
        self.script.record(Call::StmtClose)
    }

    fn num_input(&self) -> Option<usize> {
        Some(2)
    }

    async fn exec(&self, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        self.script.record(Call::StmtExec(args.to_vec()))?;
        Ok(Box::new(FakeResult {
            script: self.script.clone(),
        }))
    }

    async fn query(&self, args: &[Value]) -> Result<Box<dyn Rows>> {
        self.script.record(Call::StmtQuery(args.to_vec()))?;
        Ok(Script::rows_for(&self.script))
    }

    fn as_exec_context(&self) -> Option<&dyn StmtExecContext> {
        self.caps.stmt_exec_context.then_some(self as &dyn StmtExecContext)
    }

    fn as_query_context(&self) -> Option<&dyn StmtQueryContext> {
        self.caps.stmt_query_context.then_some(self as &dyn StmtQueryContext)
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        self.caps.checker.then_some(self as &dyn NamedValueChecker)
    }
}

#[async_trait]
impl StmtExecContext for FakeStmt {
    async fn exec_context(
        &self,
        _ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        self.script.record(Call::StmtExecContext(args.to_vec()))?;
        Ok(Box::new(FakeResult {
            script: self.script.clone(),
        }))
    }
}

#[async_trait]
impl StmtQueryContext for FakeStmt {
    async fn query_context(&self, _ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        self.script.record(Call::StmtQueryContext(args.to_vec()))?;
        Ok(Script::rows_for(&self.script))
    }
}

impl NamedValueChecker for FakeStmt {
    fn check_named_value(&self, _value: &mut NamedValue) -> Result<()> {
        self.script.record(Call::CheckNamedValue)
    }
}

pub(crate) struct FakeTx {
    script: Arc<Script>,
}

#[async_trait]
impl Tx for FakeTx {
    async fn commit(&self) -> Result<()> {
        self.script.record(Call::Commit)
    }

    async fn rollback(&self) -> Result<()> {
        self.script.record(Call::Rollback)
    }
}

pub(crate) struct FakeRows {
    script: Arc<Script>,
    rows: VecDeque<Vec<Value>>,
}

#[async_trait]
impl Rows for FakeRows {
    fn columns(&self) -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    async fn close(&mut self) -> Result<()> {
        self.script.record(Call::RowsClose)
    }

    async fn next(&mut self) -> Result<Option<Vec<Value>>> {
        self.script.record(Call::RowsNext)?;
        Ok(self.rows.pop_front())
    }
}

pub(crate) struct FakeResult {
    script: Arc<Script>,
}

impl ExecResult for FakeResult {
    fn last_insert_id(&self) -> Result<i64> {
        self.script.record(Call::LastInsertId)?;
        Ok(7)
    }

    fn rows_affected(&self) -> Result<u64> {
        self.script.record(Call::RowsAffected)?;
        Ok(3)
    }
}

/// Hands out fake connections sharing one script.
pub(crate) struct FakeDriver {
    pub caps: Caps,
    pub script: Arc<Script>,
}

impl FakeDriver {
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            script: Arc::new(Script::default()),
        }
    }

    fn conn(&self) -> Box<dyn Conn> {
        Box::new(FakeConn {
            caps: self.caps,
            script: self.script.clone(),
        })
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        self.script.record(Call::Open(name.to_string()))?;
        Ok(self.conn())
    }
}

#[async_trait]
impl Connector for FakeDriver {
    async fn connect(&self, _ctx: &Context) -> Result<Box<dyn Conn>> {
        self.script.record(Call::Connect)?;
        Ok(self.conn())
    }
}

/// Read every remaining row.
pub(crate) async fn drain(rows: &mut dyn Rows) -> Result<Vec<Vec<Value>>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(row);
    }
    Ok(out)
}

pub(crate) fn sample_rows() -> Vec<Vec<Value>> {
    vec![
        vec![Value::from(1i64), Value::from("alice")],
        vec![Value::from(2i64), Value::from("bob")],
    ]
}
