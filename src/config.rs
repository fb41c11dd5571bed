//! Configuration shared by every decorator.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::log::{Logger, TracingLogger};
use crate::ops::OpKind;
use crate::trace::{Tracer, TracingTracer};

/// Options shared by a decorated connection and everything it hands out.
///
/// Built once, then cloned into each wrapper. The tracer and logger are reference
/// counted, so cloning is cheap.
///
/// # Example
///
/// ```rust
/// use sql_driver_tracing::{OpKind, Options};
///
/// let opts = Options::default()
///     .with_omit_args(true)
///     .with_ops_excluded([OpKind::RowsNext]);
///
/// assert!(opts.is_op_excluded(OpKind::RowsNext));
/// assert!(!opts.is_op_excluded(OpKind::ConnQuery));
/// ```
#[derive(Clone)]
pub struct Options {
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    excluded_ops: HashSet<OpKind>,
    omit_args: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tracer: Arc::new(TracingTracer),
            logger: Arc::new(TracingLogger),
            excluded_ops: HashSet::new(),
            omit_args: false,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut excluded: Vec<&str> = self.excluded_ops.iter().map(OpKind::as_str).collect();
        excluded.sort_unstable();
        f.debug_struct("Options")
            .field("excluded_ops", &excluded)
            .field("omit_args", &self.omit_args)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Create options with the `tracing`-backed tracer and logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracer spans are created from.
    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Arc::new(tracer);
        self
    }

    /// Replace the sink that receives one record per traced call.
    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Stop creating spans and log records for the given operations.
    ///
    /// The calls themselves still happen and their errors still propagate.
    pub fn with_ops_excluded(mut self, ops: impl IntoIterator<Item = OpKind>) -> Self {
        self.excluded_ops.extend(ops);
        self
    }

    /// Stop creating spans and log records for a single operation.
    pub fn with_op_excluded(mut self, op: OpKind) -> Self {
        self.excluded_ops.insert(op);
        self
    }

    /// Leave query arguments out of span labels and log records.
    ///
    /// **Security Warning**: Query arguments often contain user input and potentially
    /// sensitive data. Leave them out anywhere traces leave your control.
    pub fn with_omit_args(mut self, omit: bool) -> Self {
        self.omit_args = omit;
        self
    }

    /// Everything traced, arguments included.
    ///
    /// **Warning**: Do not use in production as it logs all query arguments.
    pub fn development() -> Self {
        Self::default()
    }

    /// Arguments omitted; per-row and per-result operations excluded.
    pub fn production() -> Self {
        Self::default().with_omit_args(true).with_ops_excluded([
            OpKind::RowsNext,
            OpKind::ResLastInsertId,
            OpKind::ResRowsAffected,
        ])
    }

    /// Get the configured tracer.
    pub fn tracer(&self) -> &dyn Tracer {
        self.tracer.as_ref()
    }

    /// Get the configured logger.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Whether calls of this kind are left untraced and unlogged.
    pub fn is_op_excluded(&self, op: OpKind) -> bool {
        self.excluded_ops.contains(&op)
    }

    /// Whether query arguments are kept out of labels and log records.
    pub fn omit_args(&self) -> bool {
        self.omit_args
    }
}
