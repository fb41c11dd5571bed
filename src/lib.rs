//! # sql-driver-tracing
//!
//! Tracing and structured logging for SQL driver connections.
//!
//! This crate wraps a driver connection in a transparent decorator that opens a span and
//! emits a log record around every driver call, without changing what the call does.
//! Queries, arguments, results and errors pass through untouched.
//!
//! ## Features
//!
//! - **Capability aware**: the wrapper advertises every optional capability and, per
//!   call, uses the context-aware variant if the driver has it or falls back to the
//!   legacy one
//! - **Cooperative cancellation**: a legacy call is skipped when the caller's context
//!   is already done before it starts
//! - **Proper Span Nesting**: spans are children of the context's span, so driver calls
//!   appear under the request that issued them
//! - **Configurable**: exclude noisy operations, leave arguments out of traces, or plug
//!   in your own [`Tracer`] and [`Logger`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sql_driver_tracing::{Context, TracingExt};
//!
//! let conn = my_driver.open("postgres://localhost/mydb").await?.with_tracing();
//!
//! let ctx = Context::background();
//! let rows = conn.query_context(&ctx, "SELECT * FROM users WHERE id = $1", &args).await?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use sql_driver_tracing::{wrap_driver, OpKind, Options};
//!
//! let opts = Options::default()
//!     .with_omit_args(true)                   // keep arguments out of spans and logs
//!     .with_ops_excluded([OpKind::RowsNext]); // no span per fetched row
//!
//! let driver = wrap_driver(my_driver, opts);
//! ```
//!
//! ## Span Attributes
//!
//! With the default [`TracingTracer`], spans are named `sql` and carry:
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `otel.name` | Operation kind, e.g. `sql-conn-query` |
//! | `component` | Always `sql-driver` |
//! | `db.statement` | Query text (where the operation has one) |
//! | `db.args` | Rendered arguments (unless omitted) |
//! | `otel.status_code` | "OK" or "ERROR" |
//! | `error.message` | Error details (on failure) |

mod args;
mod config;
mod connection;
mod connector;
mod context;
pub mod driver;
mod error;
mod instrument;
mod log;
mod ops;
mod result;
mod rows;
mod statement;
mod trace;
mod transaction;

#[cfg(test)]
mod testing;

pub use args::{format_args, format_values, named_value_to_value};
pub use config::Options;
pub use connection::{TracingExt, WrappedConn};
pub use connector::{wrap_connector, wrap_driver, WrappedConnector, WrappedDriver};
pub use context::Context;
pub use error::{Error, Result};
pub use log::{LogRecord, Logger, NullLogger, TracingLogger};
pub use ops::{OpKind, UnknownOpKind};
pub use result::WrappedResult;
pub use rows::WrappedRows;
pub use statement::WrappedStmt;
pub use trace::{
    NullTracer, Span, Tracer, TracingSpan, TracingTracer, COMPONENT, LABEL_ACCESS_MODE,
    LABEL_ARGS, LABEL_COMPONENT, LABEL_ISOLATION_LEVEL, LABEL_QUERY,
};
pub use transaction::WrappedTx;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::{
        Conn, ConnBeginTx, ConnPrepareContext, Execer, ExecerContext, NamedValueChecker,
        Pinger, Queryer, QueryerContext, Rows, Stmt, StmtExecContext, StmtQueryContext, Tx,
    };
    pub use crate::{Context, Options, TracingExt, WrappedConn};
}
