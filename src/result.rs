//! Traced exec result wrapper.

use crate::config::Options;
use crate::context::Context;
use crate::driver::ExecResult;
use crate::error::Result;
use crate::instrument::finish;
use crate::ops::OpKind;

/// The result of an exec call made through a traced connection or statement.
pub struct WrappedResult {
    opts: Options,
    ctx: Context,
    parent: Box<dyn ExecResult>,
}

impl WrappedResult {
    pub(crate) fn new(opts: Options, ctx: Context, parent: Box<dyn ExecResult>) -> Self {
        Self { opts, ctx, parent }
    }
}

impl ExecResult for WrappedResult {
    fn last_insert_id(&self) -> Result<i64> {
        let guard = self.opts.trace_op(&self.ctx, OpKind::ResLastInsertId);
        let result = self.parent.last_insert_id();
        finish(guard, &result);
        result
    }

    fn rows_affected(&self) -> Result<u64> {
        let guard = self.opts.trace_op(&self.ctx, OpKind::ResRowsAffected);
        let result = self.parent.rows_affected();
        finish(guard, &result);
        result
    }
}
