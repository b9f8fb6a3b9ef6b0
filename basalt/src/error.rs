use thiserror::Error;

use crate::column::ColumnId;
use crate::operator::OperatorKind;

pub type BasaltResult<T> = anyhow::Result<T>;

/// Failure kinds raised while building or rewriting plans.
///
/// Functions return [`BasaltResult`], and these kinds travel inside the `anyhow::Error` so that
/// callers can `downcast_ref` to decide whether to abort the query or fall back to an
/// unoptimized plan. A rule declining to rewrite is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    /// A tree or operator breaks an invariant the planner relies on, e.g. a physical scan
    /// built from a logical scan without a selected index.
    #[error("invariant violated at {kind}: {detail}")]
    InvariantViolation { kind: OperatorKind, detail: String },

    /// An operator references a column which its inputs don't produce.
    #[error("{kind} references column {column} which is not produced by its inputs")]
    UnresolvedColumn { kind: OperatorKind, column: ColumnId },

    /// A column id which was never allocated in this planning session.
    #[error("unknown column id {0}")]
    UnknownColumnId(ColumnId),

    #[error("table {0:?} not exists")]
    TableNotFound(String),

    /// A rule was invoked on an expression that its pattern doesn't match.
    #[error("pattern of rule {rule} miss matched")]
    PatternMismatch { rule: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
