//! Tracer and span abstractions, with a `tracing`-backed default.

use tracing::field;

use crate::context::Context;
use crate::error::Error;
use crate::ops::OpKind;

/// Label carrying the instrumenting component's name.
pub const LABEL_COMPONENT: &str = "component";
/// Label carrying the query text.
pub const LABEL_QUERY: &str = "query";
/// Label carrying the rendered arguments.
pub const LABEL_ARGS: &str = "args";
pub const LABEL_ISOLATION_LEVEL: &str = "isolation_level";
pub const LABEL_ACCESS_MODE: &str = "access_mode";

/// Value of the `component` label on every span this crate creates.
pub const COMPONENT: &str = "sql-driver";

/// A unit of a trace bounding one logical operation.
pub trait Span: Send {
    /// Start a span nested under this one.
    fn new_child(&self, op: OpKind) -> Box<dyn Span>;

    fn set_label(&mut self, key: &str, value: &str);

    /// Record the outcome of the traced call; `None` means it succeeded.
    fn set_error(&mut self, err: Option<&Error>);

    fn finish(self: Box<Self>);

    /// The `tracing` span backing this span, if any. Delegated futures are instrumented
    /// with it so driver events nest under the call.
    fn as_tracing(&self) -> Option<&tracing::Span> {
        None
    }
}

/// Source of spans.
pub trait Tracer: Send + Sync {
    /// The span a context is running under. Must return a usable span even when the
    /// context carries no active parent.
    fn span(&self, ctx: &Context) -> Box<dyn Span>;
}

/// Tracer built on the `tracing` crate.
///
/// Spans become children of the context's span, so with a tracing layer that exports
/// to OpenTelemetry the driver calls appear under the request that issued them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl Tracer for TracingTracer {
    fn span(&self, ctx: &Context) -> Box<dyn Span> {
        Box::new(TracingSpan(ctx.span().clone()))
    }
}

/// A [`Span`] wrapping a [`tracing::Span`].
#[derive(Debug, Clone)]
pub struct TracingSpan(pub tracing::Span);

impl Span for TracingSpan {
    fn new_child(&self, op: OpKind) -> Box<dyn Span> {
        let span = tracing::info_span!(
            parent: &self.0,
            "sql",
            otel.name = op.as_str(),
            otel.kind = "client",
            component = field::Empty,
            db.statement = field::Empty,
            db.args = field::Empty,
            db.transaction.isolation_level = field::Empty,
            db.transaction.access_mode = field::Empty,
            otel.status_code = field::Empty,
            error.message = field::Empty,
        );
        Box::new(TracingSpan(span))
    }

    fn set_label(&mut self, key: &str, value: &str) {
        let field = match key {
            LABEL_QUERY => "db.statement",
            LABEL_ARGS => "db.args",
            LABEL_ISOLATION_LEVEL => "db.transaction.isolation_level",
            LABEL_ACCESS_MODE => "db.transaction.access_mode",
            other => other,
        };
        self.0.record(field, value);
    }

    fn set_error(&mut self, err: Option<&Error>) {
        match err {
            None => {
                self.0.record("otel.status_code", "OK");
            }
            Some(e) => {
                self.0.record("otel.status_code", "ERROR");
                self.0.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn finish(self: Box<Self>) {}

    fn as_tracing(&self) -> Option<&tracing::Span> {
        Some(&self.0)
    }
}

/// Tracer that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracer;

#[derive(Debug, Clone, Copy, Default)]
struct NullSpan;

impl Tracer for NullTracer {
    fn span(&self, _ctx: &Context) -> Box<dyn Span> {
        Box::new(NullSpan)
    }
}

impl Span for NullSpan {
    fn new_child(&self, _op: OpKind) -> Box<dyn Span> {
        Box::new(NullSpan)
    }

    fn set_label(&mut self, _key: &str, _value: &str) {}

    fn set_error(&mut self, _err: Option<&Error>) {}

    fn finish(self: Box<Self>) {}
}
