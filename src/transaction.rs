//! Traced transaction wrapper.

use async_trait::async_trait;
use tracing::Instrument;

use crate::config::Options;
use crate::context::Context;
use crate::driver::Tx;
use crate::error::Result;
use crate::instrument::{finish, scope};
use crate::ops::OpKind;

/// A transaction handed out by a [`WrappedConn`](crate::WrappedConn). Commit and
/// rollback are traced under the context the transaction was started with.
pub struct WrappedTx {
    opts: Options,
    ctx: Context,
    parent: Box<dyn Tx>,
}

impl WrappedTx {
    pub(crate) fn new(opts: Options, ctx: Context, parent: Box<dyn Tx>) -> Self {
        Self { opts, ctx, parent }
    }
}

#[async_trait]
impl Tx for WrappedTx {
    async fn commit(&self) -> Result<()> {
        let guard = self.opts.trace_op(&self.ctx, OpKind::TxCommit);
        let result = self.parent.commit().instrument(scope(&guard)).await;
        finish(guard, &result);
        result
    }

    async fn rollback(&self) -> Result<()> {
        let guard = self.opts.trace_op(&self.ctx, OpKind::TxRollback);
        let result = self.parent.rollback().instrument(scope(&guard)).await;
        finish(guard, &result);
        result
    }
}
