//! Traced driver connection wrapper.

use std::time::Duration;

use async_trait::async_trait;
use tracing::Instrument;

use crate::args::{format_args, named_value_to_value};
use crate::config::Options;
use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, ExecResult, Execer, ExecerContext, NamedValue,
    NamedValueChecker, Pinger, Queryer, QueryerContext, Rows, Stmt, Tx, TxOptions, Value,
};
use crate::error::{Error, Result};
use crate::instrument::{finish, scope};
use crate::log::LogRecord;
use crate::ops::OpKind;
use crate::result::WrappedResult;
use crate::rows::WrappedRows;
use crate::statement::WrappedStmt;
use crate::trace::{LABEL_ACCESS_MODE, LABEL_ISOLATION_LEVEL};
use crate::transaction::WrappedTx;

/// A traced wrapper around a driver connection.
///
/// `WrappedConn` implements [`Conn`] and every optional connection capability, so code
/// probing it with the `as_*` accessors always finds one. At call time it checks which
/// of those capabilities the wrapped connection really has:
///
/// - context-aware variant present: it is called directly;
/// - only the legacy variant present: the context is checked once, named arguments are
///   converted to positional values, and the legacy call runs to completion;
/// - neither present (exec and query only): [`Error::Skip`] is returned without tracing
///   anything.
///
/// Statements, transactions, rows and results it hands out are wrapped as well and
/// share its [`Options`]. Errors from the driver are returned unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use sql_driver_tracing::{Context, Options, WrappedConn};
///
/// let conn = WrappedConn::new(Box::new(my_conn), Options::production());
///
/// let ctx = Context::background().with_timeout(Duration::from_secs(5));
/// let rows = conn.query_context(&ctx, "SELECT id FROM users", &[]).await?;
/// ```
pub struct WrappedConn {
    opts: Options,
    parent: Box<dyn Conn>,
}

impl WrappedConn {
    /// Wrap `parent` with the given options.
    pub fn new(parent: Box<dyn Conn>, opts: Options) -> Self {
        Self { opts, parent }
    }

    /// Wrap `parent` with default options.
    pub fn wrap(parent: impl Conn + 'static) -> Self {
        Self::new(Box::new(parent), Options::default())
    }

    /// Get a reference to the underlying connection.
    pub fn inner(&self) -> &dyn Conn {
        self.parent.as_ref()
    }

    /// Get the options shared with everything this connection hands out.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Consume the wrapper and return the underlying connection.
    pub fn into_inner(self) -> Box<dyn Conn> {
        self.parent
    }

    fn wrap_stmt(&self, ctx: Context, query: &str, stmt: Box<dyn Stmt>) -> Box<dyn Stmt> {
        Box::new(WrappedStmt::new(self.opts.clone(), ctx, query, stmt))
    }

    fn wrap_tx(&self, ctx: Context, tx: Box<dyn Tx>) -> Box<dyn Tx> {
        Box::new(WrappedTx::new(self.opts.clone(), ctx, tx))
    }

    fn wrap_result(&self, ctx: Context, res: Box<dyn ExecResult>) -> Box<dyn ExecResult> {
        Box::new(WrappedResult::new(self.opts.clone(), ctx, res))
    }

    fn wrap_rows(&self, ctx: Context, rows: Box<dyn Rows>) -> Box<dyn Rows> {
        Box::new(WrappedRows::new(self.opts.clone(), ctx, rows))
    }
}

/// Arguments for a legacy call standing in for a context-aware one.
///
/// Fails with the context's error, without converting anything, once the context is
/// done.
pub(crate) fn fallback_args(ctx: &Context, args: &[NamedValue]) -> Result<Vec<Value>> {
    if let Some(err) = ctx.err() {
        return Err(err);
    }
    named_value_to_value(args)
}

#[async_trait]
impl Conn for WrappedConn {
    async fn prepare(&self, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt = self.parent.prepare(query).await?;
        Ok(self.wrap_stmt(Context::background(), query, stmt))
    }

    async fn close(&self) -> Result<()> {
        self.parent.close().await
    }

    async fn begin(&self) -> Result<Box<dyn Tx>> {
        let tx = self.parent.begin().await?;
        Ok(self.wrap_tx(Context::background(), tx))
    }

    fn as_begin_tx(&self) -> Option<&dyn ConnBeginTx> {
        Some(self)
    }

    fn as_prepare_context(&self) -> Option<&dyn ConnPrepareContext> {
        Some(self)
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        Some(self)
    }

    fn as_execer_context(&self) -> Option<&dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        Some(self)
    }

    fn as_queryer_context(&self) -> Option<&dyn QueryerContext> {
        Some(self)
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        Some(self)
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        Some(self)
    }
}

#[async_trait]
impl ConnBeginTx for WrappedConn {
    async fn begin_tx(&self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>> {
        let mut guard = self.opts.trace_op(ctx, OpKind::TxBegin);
        if let Some(level) = &opts.isolation_level {
            let level = format!("{:?}", level);
            guard = guard.map(|g| g.with_label(LABEL_ISOLATION_LEVEL, &level));
        }
        if let Some(mode) = &opts.access_mode {
            let mode = format!("{:?}", mode);
            guard = guard.map(|g| g.with_label(LABEL_ACCESS_MODE, &mode));
        }

        let result = async move {
            match self.parent.as_begin_tx() {
                Some(begin_tx) => begin_tx.begin_tx(ctx, opts).await,
                None => {
                    if let Some(err) = ctx.err() {
                        return Err(err);
                    }
                    self.parent.begin().await
                }
            }
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(self.wrap_tx(ctx.clone(), result?))
    }
}

#[async_trait]
impl ConnPrepareContext for WrappedConn {
    async fn prepare_context(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        let guard = self
            .opts
            .trace_op(ctx, OpKind::Prepare)
            .map(|g| g.with_query(query));

        let result = async {
            match self.parent.as_prepare_context() {
                Some(prepare) => prepare.prepare_context(ctx, query).await,
                None => {
                    if let Some(err) = ctx.err() {
                        return Err(err);
                    }
                    self.parent.prepare(query).await
                }
            }
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(self.wrap_stmt(ctx.clone(), query, result?))
    }
}

#[async_trait]
impl Execer for WrappedConn {
    async fn exec(&self, query: &str, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        let Some(execer) = self.parent.as_execer() else {
            return Err(Error::Skip);
        };
        let res = execer.exec(query, args).await?;
        Ok(self.wrap_result(Context::background(), res))
    }
}

#[async_trait]
impl ExecerContext for WrappedConn {
    async fn exec_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        let execer_ctx = self.parent.as_execer_context();
        let execer = self.parent.as_execer();
        if execer_ctx.is_none() && execer.is_none() {
            return Err(Error::Skip);
        }

        let guard = self
            .opts
            .trace_op(ctx, OpKind::ConnExec)
            .map(|g| g.with_query(query).with_args(|| format_args(args)));

        let result = async {
            if let Some(execer_ctx) = execer_ctx {
                return execer_ctx.exec_context(ctx, query, args).await;
            }
            let values = fallback_args(ctx, args)?;
            match execer {
                Some(execer) => execer.exec(query, &values).await,
                None => Err(Error::Skip),
            }
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(self.wrap_result(ctx.clone(), result?))
    }
}

#[async_trait]
impl Queryer for WrappedConn {
    async fn query(&self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        let Some(queryer) = self.parent.as_queryer() else {
            return Err(Error::Skip);
        };
        let rows = queryer.query(query, args).await?;
        Ok(self.wrap_rows(Context::background(), rows))
    }
}

#[async_trait]
impl QueryerContext for WrappedConn {
    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        let queryer_ctx = self.parent.as_queryer_context();
        let queryer = self.parent.as_queryer();
        if queryer_ctx.is_none() && queryer.is_none() {
            return Err(Error::Skip);
        }

        let guard = self
            .opts
            .trace_op(ctx, OpKind::ConnQuery)
            .map(|g| g.with_query(query).with_args(|| format_args(args)));

        let result = async {
            if let Some(queryer_ctx) = queryer_ctx {
                return queryer_ctx.query_context(ctx, query, args).await;
            }
            let values = fallback_args(ctx, args)?;
            match queryer {
                Some(queryer) => queryer.query(query, &values).await,
                None => Err(Error::Skip),
            }
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(self.wrap_rows(ctx.clone(), result?))
    }
}

#[async_trait]
impl Pinger for WrappedConn {
    /// Pings the wrapped connection if it can be pinged. Otherwise logs a
    /// `sql-dummy-ping` record, whatever the exclusions, and reports success.
    async fn ping(&self, ctx: &Context) -> Result<()> {
        let Some(pinger) = self.parent.as_pinger() else {
            self.opts
                .logger()
                .log(ctx, OpKind::DummyPing, &LogRecord::new(Duration::ZERO));
            return Ok(());
        };

        let guard = self.opts.trace_op(ctx, OpKind::Ping);
        let result = pinger.ping(ctx).instrument(scope(&guard)).await;
        finish(guard, &result);
        result
    }
}

impl NamedValueChecker for WrappedConn {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()> {
        match self.parent.as_named_value_checker() {
            Some(checker) => checker.check_named_value(value),
            None => Err(Error::Skip),
        }
    }
}

/// Extension trait for easy wrapping of driver connections.
pub trait TracingExt {
    /// Wrap this connection with tracing instrumentation.
    fn with_tracing(self) -> WrappedConn;

    /// Wrap this connection with custom options.
    fn with_tracing_options(self, opts: Options) -> WrappedConn;
}

impl<C: Conn + 'static> TracingExt for C {
    fn with_tracing(self) -> WrappedConn {
        WrappedConn::wrap(self)
    }

    fn with_tracing_options(self, opts: Options) -> WrappedConn {
        WrappedConn::new(Box::new(self), opts)
    }
}
