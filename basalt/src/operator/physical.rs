use std::fmt::{Display, Formatter};

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use strum_macros::AsRefStr;

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{
    DisplayFields, Filter, HashAggregate, HashJoin, NestLoopJoin, OperatorBase, OperatorKind,
    OperatorTrait, PhysicalOlapScan, Project, Union,
};
use crate::plan::ExpressionContext;

/// Physical relational operator, bound to an execution strategy.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EnumAsInner, AsRefStr)]
#[enum_dispatch]
pub enum PhysicalOperator {
    PhysicalOlapScan(PhysicalOlapScan),
    PhysicalHashJoin(HashJoin),
    PhysicalNestLoopJoin(NestLoopJoin),
    PhysicalHashAggregate(HashAggregate),
    PhysicalProject(Project),
    PhysicalFilter(Filter),
    PhysicalUnion(Union),
}

impl PhysicalOperator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            PhysicalOperator::PhysicalOlapScan(_) => OperatorKind::PhysicalOlapScan,
            PhysicalOperator::PhysicalHashJoin(_) => OperatorKind::PhysicalHashJoin,
            PhysicalOperator::PhysicalNestLoopJoin(_) => OperatorKind::PhysicalNestLoopJoin,
            PhysicalOperator::PhysicalHashAggregate(_) => OperatorKind::PhysicalHashAggregate,
            PhysicalOperator::PhysicalProject(_) => OperatorKind::PhysicalProject,
            PhysicalOperator::PhysicalFilter(_) => OperatorKind::PhysicalFilter,
            PhysicalOperator::PhysicalUnion(_) => OperatorKind::PhysicalUnion,
        }
    }
}

impl Display for PhysicalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())?;
        self.display(f)
    }
}
