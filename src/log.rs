//! Logging sink for decorated calls.

use std::time::Duration;

use tracing::field;

use crate::context::Context;
use crate::error::Error;
use crate::ops::OpKind;

/// One record per instrumented call.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub query: Option<&'a str>,
    /// Rendered arguments; absent when argument logging is disabled.
    pub args: Option<&'a str>,
    pub error: Option<&'a Error>,
    pub duration: Duration,
}

impl LogRecord<'_> {
    pub fn new(duration: Duration) -> Self {
        Self {
            query: None,
            args: None,
            error: None,
            duration,
        }
    }
}

/// Receives one record per instrumented call. Must return promptly and never panic.
pub trait Logger: Send + Sync {
    fn log(&self, ctx: &Context, op: OpKind, record: &LogRecord<'_>);
}

impl<F> Logger for F
where
    F: Fn(&Context, OpKind, &LogRecord<'_>) + Send + Sync,
{
    fn log(&self, ctx: &Context, op: OpKind, record: &LogRecord<'_>) {
        self(ctx, op, record)
    }
}

/// Emits records as `tracing` events under the context's span.
///
/// Successful calls log at DEBUG, failed ones at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, ctx: &Context, op: OpKind, record: &LogRecord<'_>) {
        let duration_ms = record.duration.as_millis() as u64;
        match record.error {
            None => tracing::debug!(
                parent: ctx.span(),
                op = %op,
                query = record.query,
                args = record.args,
                duration_ms = duration_ms,
                "sql driver call"
            ),
            Some(e) => tracing::warn!(
                parent: ctx.span(),
                op = %op,
                query = record.query,
                args = record.args,
                error = field::display(e),
                duration_ms = duration_ms,
                "sql driver call failed"
            ),
        }
    }
}

/// Logger that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _ctx: &Context, _op: OpKind, _record: &LogRecord<'_>) {}
}
