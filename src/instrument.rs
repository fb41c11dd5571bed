//! Scoped instrumentation of a single driver call.

use std::time::Instant;

use crate::config::Options;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::log::LogRecord;
use crate::ops::OpKind;
use crate::trace::{Span, COMPONENT, LABEL_ARGS, LABEL_COMPONENT, LABEL_QUERY};

/// Span, start time and labels of one in-flight call.
///
/// The span is finished and the log record emitted exactly once: by [`finish`] on the
/// normal path, or on drop when the call's future is abandoned part way.
///
/// [`finish`]: Instrumented::finish
pub(crate) struct Instrumented<'a> {
    opts: &'a Options,
    ctx: &'a Context,
    op: OpKind,
    span: Option<Box<dyn Span>>,
    query: Option<&'a str>,
    args: Option<String>,
    start: Instant,
}

impl Options {
    /// Start instrumenting `op`, or `None` when it is excluded.
    pub(crate) fn trace_op<'a>(
        &'a self,
        ctx: &'a Context,
        op: OpKind,
    ) -> Option<Instrumented<'a>> {
        if self.is_op_excluded(op) {
            return None;
        }

        let mut span = self.tracer().span(ctx).new_child(op);
        span.set_label(LABEL_COMPONENT, COMPONENT);

        Some(Instrumented {
            opts: self,
            ctx,
            op,
            span: Some(span),
            query: None,
            args: None,
            start: Instant::now(),
        })
    }
}

impl<'a> Instrumented<'a> {
    pub(crate) fn with_query(mut self, query: &'a str) -> Self {
        self.set_label(LABEL_QUERY, query);
        self.query = Some(query);
        self
    }

    /// Attach rendered arguments unless argument logging is off. `render` only runs
    /// when they are kept.
    pub(crate) fn with_args(mut self, render: impl FnOnce() -> String) -> Self {
        if !self.opts.omit_args() {
            let rendered = render();
            self.set_label(LABEL_ARGS, &rendered);
            self.args = Some(rendered);
        }
        self
    }

    pub(crate) fn with_label(mut self, key: &str, value: &str) -> Self {
        self.set_label(key, value);
        self
    }

    fn set_label(&mut self, key: &str, value: &str) {
        if let Some(span) = self.span.as_mut() {
            span.set_label(key, value);
        }
    }

    /// The `tracing` span to run the delegated future in.
    pub(crate) fn tracing_span(&self) -> tracing::Span {
        self.span
            .as_ref()
            .and_then(|span| span.as_tracing())
            .cloned()
            .unwrap_or_else(tracing::Span::none)
    }

    pub(crate) fn finish(mut self, err: Option<&Error>) {
        self.complete(Some(err));
    }

    /// `outcome` is `None` for a call abandoned before it returned: the span is finished
    /// without a status and the record carries no error.
    fn complete(&mut self, outcome: Option<Option<&Error>>) {
        let Some(mut span) = self.span.take() else {
            return;
        };
        if let Some(err) = outcome {
            span.set_error(err);
        }
        span.finish();

        let record = LogRecord {
            query: self.query,
            args: self.args.as_deref(),
            error: outcome.flatten(),
            duration: self.start.elapsed(),
        };
        self.opts.logger().log(self.ctx, self.op, &record);
    }
}

impl Drop for Instrumented<'_> {
    fn drop(&mut self) {
        self.complete(None);
    }
}

/// The span a delegated future should be instrumented with.
pub(crate) fn scope(guard: &Option<Instrumented<'_>>) -> tracing::Span {
    guard
        .as_ref()
        .map_or_else(tracing::Span::none, Instrumented::tracing_span)
}

/// Record `result` on the guard, if the call was instrumented.
pub(crate) fn finish<T>(guard: Option<Instrumented<'_>>, result: &Result<T>) {
    if let Some(guard) = guard {
        guard.finish(result.as_ref().err());
    }
}
