//! Operation kinds used to name spans and to exclude calls from tracing.

use std::str::FromStr;

/// Driver methods the decorators instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Prepare,
    ConnExec,
    ConnQuery,
    StmtExec,
    StmtQuery,
    StmtClose,
    TxBegin,
    TxCommit,
    TxRollback,
    ResLastInsertId,
    ResRowsAffected,
    RowsNext,
    Ping,
    /// Logged instead of `Ping` when the connection cannot be pinged.
    DummyPing,
    ConnectorConnect,
}

impl OpKind {
    pub const ALL: [OpKind; 15] = [
        OpKind::Prepare,
        OpKind::ConnExec,
        OpKind::ConnQuery,
        OpKind::StmtExec,
        OpKind::StmtQuery,
        OpKind::StmtClose,
        OpKind::TxBegin,
        OpKind::TxCommit,
        OpKind::TxRollback,
        OpKind::ResLastInsertId,
        OpKind::ResRowsAffected,
        OpKind::RowsNext,
        OpKind::Ping,
        OpKind::DummyPing,
        OpKind::ConnectorConnect,
    ];

    /// Returns the operation as a string suitable for span names.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Prepare => "sql-prepare",
            OpKind::ConnExec => "sql-conn-exec",
            OpKind::ConnQuery => "sql-conn-query",
            OpKind::StmtExec => "sql-stmt-exec",
            OpKind::StmtQuery => "sql-stmt-query",
            OpKind::StmtClose => "sql-stmt-close",
            OpKind::TxBegin => "sql-tx-begin",
            OpKind::TxCommit => "sql-tx-commit",
            OpKind::TxRollback => "sql-tx-rollback",
            OpKind::ResLastInsertId => "sql-res-lastInsertId",
            OpKind::ResRowsAffected => "sql-res-rowsAffected",
            OpKind::RowsNext => "sql-rows-next",
            OpKind::Ping => "sql-ping",
            OpKind::DummyPing => "sql-dummy-ping",
            OpKind::ConnectorConnect => "sql-connector-connect",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when parsing an unknown operation name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation kind: {0}")]
pub struct UnknownOpKind(pub String);

impl FromStr for OpKind {
    type Err = UnknownOpKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpKind::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOpKind(s.to_string()))
    }
}
