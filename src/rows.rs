//! Traced row cursor wrapper.

use async_trait::async_trait;
use tracing::Instrument;

use crate::config::Options;
use crate::context::Context;
use crate::driver::{Rows, Value};
use crate::error::Result;
use crate::instrument::{finish, scope};
use crate::ops::OpKind;

/// Rows returned through a traced connection or statement. Each `next` is its own
/// span; exclude [`OpKind::RowsNext`] for large result sets.
pub struct WrappedRows {
    opts: Options,
    ctx: Context,
    parent: Box<dyn Rows>,
}

impl WrappedRows {
    pub(crate) fn new(opts: Options, ctx: Context, parent: Box<dyn Rows>) -> Self {
        Self { opts, ctx, parent }
    }
}

#[async_trait]
impl Rows for WrappedRows {
    fn columns(&self) -> Vec<String> {
        self.parent.columns()
    }

    async fn close(&mut self) -> Result<()> {
        self.parent.close().await
    }

    async fn next(&mut self) -> Result<Option<Vec<Value>>> {
        let guard = self.opts.trace_op(&self.ctx, OpKind::RowsNext);
        let result = self.parent.next().instrument(scope(&guard)).await;
        finish(guard, &result);
        result
    }
}
