//! The driver contract.
//!
//! A driver implements the base traits ([`Conn`], [`Stmt`], [`Tx`], [`Rows`],
//! [`ExecResult`]) and any subset of the optional capability traits. Capabilities are
//! discovered at call time through the `as_*` accessors, which return `None` unless the
//! implementor overrides them:
//!
//! ```rust,ignore
//! impl Conn for MyConn {
//!     // ...base methods...
//!
//!     fn as_queryer_context(&self) -> Option<&dyn QueryerContext> {
//!         Some(self)
//!     }
//! }
//! ```

use async_trait::async_trait;
use sea_orm::{AccessMode, IsolationLevel};

pub use sea_orm::Value;

use crate::context::Context;
use crate::error::Result;

/// An argument passed to a context-aware call.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// Parameter name, if the caller bound it by name.
    pub name: Option<String>,
    /// 1-based position of the parameter.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Build ordinals `1..=n` for a list of positional values.
    pub fn from_values<I, V>(values: I) -> Vec<NamedValue>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| NamedValue::positional(i + 1, value))
            .collect()
    }
}

/// Options for a context-aware transaction start.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub access_mode: Option<AccessMode>,
}

/// A connection to a database. Used by one caller at a time.
#[async_trait]
pub trait Conn: Send + Sync {
    async fn prepare(&self, query: &str) -> Result<Box<dyn Stmt>>;

    async fn close(&self) -> Result<()>;

    async fn begin(&self) -> Result<Box<dyn Tx>>;

    fn as_begin_tx(&self) -> Option<&dyn ConnBeginTx> {
        None
    }

    fn as_prepare_context(&self) -> Option<&dyn ConnPrepareContext> {
        None
    }

    fn as_execer(&self) -> Option<&dyn Execer> {
        None
    }

    fn as_execer_context(&self) -> Option<&dyn ExecerContext> {
        None
    }

    fn as_queryer(&self) -> Option<&dyn Queryer> {
        None
    }

    fn as_queryer_context(&self) -> Option<&dyn QueryerContext> {
        None
    }

    fn as_pinger(&self) -> Option<&dyn Pinger> {
        None
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        None
    }
}

#[async_trait]
pub trait ConnBeginTx: Send + Sync {
    async fn begin_tx(&self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>>;
}

#[async_trait]
pub trait ConnPrepareContext: Send + Sync {
    async fn prepare_context(&self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>>;
}

/// Direct execution without a prepared statement.
///
/// May return [`Error::Skip`](crate::Error::Skip) to make the caller prepare instead.
#[async_trait]
pub trait Execer: Send + Sync {
    async fn exec(&self, query: &str, args: &[Value]) -> Result<Box<dyn ExecResult>>;
}

#[async_trait]
pub trait ExecerContext: Send + Sync {
    async fn exec_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>>;
}

#[async_trait]
pub trait Queryer: Send + Sync {
    async fn query(&self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait QueryerContext: Send + Sync {
    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, ctx: &Context) -> Result<()>;
}

/// Validates, and may rewrite, an argument before it is sent to the driver.
pub trait NamedValueChecker: Send + Sync {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()>;
}

/// A prepared statement.
#[async_trait]
pub trait Stmt: Send + Sync {
    async fn close(&self) -> Result<()>;

    /// Number of placeholders, or `None` when the driver cannot tell.
    fn num_input(&self) -> Option<usize>;

    async fn exec(&self, args: &[Value]) -> Result<Box<dyn ExecResult>>;

    async fn query(&self, args: &[Value]) -> Result<Box<dyn Rows>>;

    fn as_exec_context(&self) -> Option<&dyn StmtExecContext> {
        None
    }

    fn as_query_context(&self) -> Option<&dyn StmtQueryContext> {
        None
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        None
    }
}

#[async_trait]
pub trait StmtExecContext: Send + Sync {
    async fn exec_context(&self, ctx: &Context, args: &[NamedValue])
        -> Result<Box<dyn ExecResult>>;
}

#[async_trait]
pub trait StmtQueryContext: Send + Sync {
    async fn query_context(&self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait Tx: Send + Sync {
    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}

/// A cursor over query results.
#[async_trait]
pub trait Rows: Send {
    fn columns(&self) -> Vec<String>;

    async fn close(&mut self) -> Result<()>;

    /// The next row, or `None` once the cursor is exhausted.
    async fn next(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Outcome of an exec call.
pub trait ExecResult: Send + Sync {
    fn last_insert_id(&self) -> Result<i64>;

    fn rows_affected(&self) -> Result<u64>;
}

/// Opens connections by data source name.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>>;
}

/// Opens connections from pre-parsed configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>>;
}
