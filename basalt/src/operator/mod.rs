//! Contains relational operators such as scan, join, aggregation, etc.
//!
//! Operators are classified into two categories: logical and physical. We separate logical and
//! physical operators in two enums, and tag every variant with an [`OperatorKind`] used by rule
//! patterns and visitor dispatch.
//!
//! Fields shared by every operator, the row limit and the residual predicate, live in an
//! [`OperatorBase`] embedded in each variant. Fields which only steer planning, such as the
//! split flag of an aggregation, are wrapped in [`PlanningMeta`] so that they never take part in
//! equality or hashing.
mod base;
pub use base::*;
mod logical;
pub use logical::*;
mod physical;
pub use physical::*;
mod aggregation;
pub use aggregation::*;
mod filter;
pub use filter::*;
mod join;
pub use join::*;
mod project;
pub use project::*;
mod scan;
pub use scan::*;
mod union;
pub use union::*;
mod visit;
pub use visit::*;

use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::Operator::{Logical, Physical};
use crate::plan::ExpressionContext;
use crate::scalar::ScalarOperator;

/// Tag of every operator variant.
#[derive(EnumSetType, Debug, Hash, AsRefStr, StrumDisplay)]
pub enum OperatorKind {
    LogicalOlapScan,
    LogicalJoin,
    LogicalAggregation,
    LogicalProject,
    LogicalFilter,
    LogicalUnion,

    PhysicalOlapScan,
    PhysicalHashJoin,
    PhysicalNestLoopJoin,
    PhysicalHashAggregate,
    PhysicalProject,
    PhysicalFilter,
    PhysicalUnion,
}

impl OperatorKind {
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            OperatorKind::LogicalOlapScan
                | OperatorKind::LogicalJoin
                | OperatorKind::LogicalAggregation
                | OperatorKind::LogicalProject
                | OperatorKind::LogicalFilter
                | OperatorKind::LogicalUnion
        )
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum Operator {
    Logical(LogicalOperator),
    Physical(PhysicalOperator),
}

#[enum_dispatch(LogicalOperator, PhysicalOperator)]
pub trait OperatorTrait {
    /// Limit and residual predicate of this operator.
    fn base(&self) -> &OperatorBase;

    /// Columns produced by this operator. `ctx` carries the logical properties of inputs.
    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet>;
}

#[enum_dispatch(LogicalOperator, PhysicalOperator)]
pub trait DisplayFields {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result;
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Logical(op) => op.kind(),
            Physical(op) => op.kind(),
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Logical(_))
    }

    pub fn limit(&self) -> Option<u64> {
        self.base().limit()
    }

    pub fn predicate(&self) -> Option<&ScalarOperator> {
        self.base().predicate()
    }
}

impl OperatorTrait for Operator {
    fn base(&self) -> &OperatorBase {
        match self {
            Logical(op) => op.base(),
            Physical(op) => op.base(),
        }
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        match self {
            Logical(op) => op.output_columns(ctx),
            Physical(op) => op.output_columns(ctx),
        }
    }
}

impl From<LogicalOperator> for Operator {
    fn from(op: LogicalOperator) -> Self {
        Logical(op)
    }
}

impl From<PhysicalOperator> for Operator {
    fn from(op: PhysicalOperator) -> Self {
        Physical(op)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Logical(op) => write!(f, "{}", op),
            Physical(op) => write!(f, "{}", op),
        }
    }
}
