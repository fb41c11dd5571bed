//! Driver and connector wrappers: every connection they open comes back traced.

use async_trait::async_trait;
use tracing::Instrument;

use crate::config::Options;
use crate::connection::WrappedConn;
use crate::context::Context;
use crate::driver::{Conn, Connector, Driver};
use crate::error::Result;
use crate::instrument::{finish, scope};
use crate::ops::OpKind;

/// Wrap a driver so the connections it opens are instrumented with `opts`.
pub fn wrap_driver(driver: impl Driver + 'static, opts: Options) -> WrappedDriver {
    WrappedDriver {
        opts,
        parent: Box::new(driver),
    }
}

/// Wrap a connector so the connections it opens are instrumented with `opts`.
pub fn wrap_connector(connector: impl Connector + 'static, opts: Options) -> WrappedConnector {
    WrappedConnector {
        opts,
        parent: Box::new(connector),
    }
}

pub struct WrappedDriver {
    opts: Options,
    parent: Box<dyn Driver>,
}

#[async_trait]
impl Driver for WrappedDriver {
    /// Opening by name is not traced; only the returned connection is.
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        let conn = self.parent.open(name).await?;
        Ok(Box::new(WrappedConn::new(conn, self.opts.clone())))
    }
}

pub struct WrappedConnector {
    opts: Options,
    parent: Box<dyn Connector>,
}

#[async_trait]
impl Connector for WrappedConnector {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        let guard = self.opts.trace_op(ctx, OpKind::ConnectorConnect);
        let result = self.parent.connect(ctx).instrument(scope(&guard)).await;
        finish(guard, &result);
        Ok(Box::new(WrappedConn::new(result?, self.opts.clone())))
    }
}
