//! Traced prepared statement wrapper.

use async_trait::async_trait;
use tracing::Instrument;

use crate::args::{format_args, format_values};
use crate::config::Options;
use crate::connection::fallback_args;
use crate::context::Context;
use crate::driver::{
    ExecResult, NamedValue, NamedValueChecker, Rows, Stmt, StmtExecContext, StmtQueryContext,
    Value,
};
use crate::error::{Error, Result};
use crate::instrument::{finish, scope};
use crate::ops::OpKind;
use crate::result::WrappedResult;
use crate::rows::WrappedRows;

/// A prepared statement handed out by a [`WrappedConn`](crate::WrappedConn).
///
/// Legacy `exec`/`query` calls are traced under the context the statement was prepared
/// with; the context-aware variants use the context of the call.
pub struct WrappedStmt {
    opts: Options,
    ctx: Context,
    query: String,
    parent: Box<dyn Stmt>,
}

impl WrappedStmt {
    pub(crate) fn new(opts: Options, ctx: Context, query: &str, parent: Box<dyn Stmt>) -> Self {
        Self {
            opts,
            ctx,
            query: query.to_string(),
            parent,
        }
    }

    /// The SQL this statement was prepared from.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub fn inner(&self) -> &dyn Stmt {
        self.parent.as_ref()
    }
}

#[async_trait]
impl Stmt for WrappedStmt {
    async fn close(&self) -> Result<()> {
        let guard = self
            .opts
            .trace_op(&self.ctx, OpKind::StmtClose)
            .map(|g| g.with_query(&self.query));
        let result = self.parent.close().instrument(scope(&guard)).await;
        finish(guard, &result);
        result
    }

    fn num_input(&self) -> Option<usize> {
        self.parent.num_input()
    }

    async fn exec(&self, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        let guard = self
            .opts
            .trace_op(&self.ctx, OpKind::StmtExec)
            .map(|g| g.with_query(&self.query).with_args(|| format_values(args)));
        let result = self.parent.exec(args).instrument(scope(&guard)).await;
        finish(guard, &result);
        Ok(Box::new(WrappedResult::new(
            self.opts.clone(),
            self.ctx.clone(),
            result?,
        )))
    }

    async fn query(&self, args: &[Value]) -> Result<Box<dyn Rows>> {
        let guard = self
            .opts
            .trace_op(&self.ctx, OpKind::StmtQuery)
            .map(|g| g.with_query(&self.query).with_args(|| format_values(args)));
        let result = self.parent.query(args).instrument(scope(&guard)).await;
        finish(guard, &result);
        Ok(Box::new(WrappedRows::new(
            self.opts.clone(),
            self.ctx.clone(),
            result?,
        )))
    }

    fn as_exec_context(&self) -> Option<&dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&self) -> Option<&dyn StmtQueryContext> {
        Some(self)
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        Some(self)
    }
}

#[async_trait]
impl StmtExecContext for WrappedStmt {
    async fn exec_context(
        &self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        let guard = self
            .opts
            .trace_op(ctx, OpKind::StmtExec)
            .map(|g| g.with_query(&self.query).with_args(|| format_args(args)));

        let result = async {
            if let Some(exec_ctx) = self.parent.as_exec_context() {
                return exec_ctx.exec_context(ctx, args).await;
            }
            let values = fallback_args(ctx, args)?;
            self.parent.exec(&values).await
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(Box::new(WrappedResult::new(
            self.opts.clone(),
            ctx.clone(),
            result?,
        )))
    }
}

#[async_trait]
impl StmtQueryContext for WrappedStmt {
    async fn query_context(&self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        let guard = self
            .opts
            .trace_op(ctx, OpKind::StmtQuery)
            .map(|g| g.with_query(&self.query).with_args(|| format_args(args)));

        let result = async {
            if let Some(query_ctx) = self.parent.as_query_context() {
                return query_ctx.query_context(ctx, args).await;
            }
            let values = fallback_args(ctx, args)?;
            self.parent.query(&values).await
        }
        .instrument(scope(&guard))
        .await;

        finish(guard, &result);
        Ok(Box::new(WrappedRows::new(
            self.opts.clone(),
            ctx.clone(),
            result?,
        )))
    }
}

impl NamedValueChecker for WrappedStmt {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()> {
        match self.parent.as_named_value_checker() {
            Some(checker) => checker.check_named_value(value),
            None => Err(Error::Skip),
        }
    }
}
