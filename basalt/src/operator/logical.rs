use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{
    Aggregation, DisplayFields, Filter, Join, OlapScan, OperatorBase, OperatorKind,
    OperatorTrait, Project, Union,
};
use crate::plan::ExpressionContext;

/// Logical relational operator.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EnumAsInner, AsRefStr)]
#[enum_dispatch]
pub enum LogicalOperator {
    LogicalOlapScan(OlapScan),
    LogicalJoin(Join),
    LogicalAggregation(Aggregation),
    LogicalProject(Project),
    LogicalFilter(Filter),
    LogicalUnion(Union),
}

impl LogicalOperator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            LogicalOperator::LogicalOlapScan(_) => OperatorKind::LogicalOlapScan,
            LogicalOperator::LogicalJoin(_) => OperatorKind::LogicalJoin,
            LogicalOperator::LogicalAggregation(_) => OperatorKind::LogicalAggregation,
            LogicalOperator::LogicalProject(_) => OperatorKind::LogicalProject,
            LogicalOperator::LogicalFilter(_) => OperatorKind::LogicalFilter,
            LogicalOperator::LogicalUnion(_) => OperatorKind::LogicalUnion,
        }
    }
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display(f)
    }
}
