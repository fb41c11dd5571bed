//! Error types shared by drivers and the decorators wrapping them.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by driver calls.
///
/// Drivers report their own failures through this type as well, so a decorated call
/// hands the caller back the very value the driver returned.
#[derive(Error, Debug)]
pub enum Error {
    /// The optional operation is not implemented here; the caller should fall back to
    /// its generic path.
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("sql: driver does not support the use of Named Parameters")]
    NamedParameters,

    #[error("sql: argument ordinal {ordinal} out of range for {count} arguments")]
    InvalidOrdinal { ordinal: usize, count: usize },

    #[error("sql: duplicate argument ordinal {0}")]
    DuplicateOrdinal(usize),

    #[error("driver: bad connection")]
    BadConn,

    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Returns true for the errors a [`Context`](crate::Context) reports once it is done.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
