use std::iter::once;
use std::sync::Arc;

use crate::operator::LogicalOperator::{
    LogicalAggregation, LogicalFilter, LogicalJoin, LogicalOlapScan, LogicalProject, LogicalUnion,
};
use crate::operator::PhysicalOperator::{
    PhysicalFilter, PhysicalHashAggregate, PhysicalHashJoin, PhysicalNestLoopJoin,
    PhysicalOlapScan as PhysicalScan, PhysicalProject, PhysicalUnion,
};
use crate::operator::{
    Aggregation, Filter, HashAggregate, HashJoin, Join, LogicalOperator, NestLoopJoin, OlapScan,
    PhysicalOlapScan, PhysicalOperator, Project, Union,
};
use crate::plan::{OptExpression, OptExpressionRef};
use crate::scalar::{ColumnRefOperator, ScalarOperator};

/// Builds logical plans bottom up, the current root becomes the first input of each new node.
///
/// ```no
/// let right = LogicalPlanBuilder::scan(t2).build();
/// let plan = LogicalPlanBuilder::scan(t1)
///     .join(join, right)
///     .filter(predicate)
///     .build();
/// ```
pub struct LogicalPlanBuilder {
    root: OptExpressionRef,
}

impl LogicalPlanBuilder {
    pub fn scan(scan: OlapScan) -> Self {
        Self::from_expr(Arc::new(OptExpression::with_operator(
            LogicalOlapScan(scan),
            vec![],
        )))
    }

    pub fn from_expr(root: OptExpressionRef) -> Self {
        Self { root }
    }

    fn reset_root<I>(self, operator: LogicalOperator, others: I) -> Self
    where
        I: IntoIterator<Item = OptExpressionRef>,
    {
        let inputs = once(self.root).chain(others);
        Self {
            root: Arc::new(OptExpression::with_operator(operator, inputs)),
        }
    }

    pub fn filter(self, predicate: ScalarOperator) -> Self {
        self.reset_root(LogicalFilter(Filter::new(predicate)), vec![])
    }

    pub fn project<I>(self, exprs: I) -> Self
    where
        I: IntoIterator<Item = (ColumnRefOperator, ScalarOperator)>,
    {
        self.reset_root(LogicalProject(Project::new(exprs)), vec![])
    }

    pub fn aggregate(self, aggregation: Aggregation) -> Self {
        self.reset_root(LogicalAggregation(aggregation), vec![])
    }

    pub fn join(self, join: Join, right: OptExpressionRef) -> Self {
        self.reset_root(LogicalJoin(join), vec![right])
    }

    pub fn union<I>(self, union: Union, others: I) -> Self
    where
        I: IntoIterator<Item = OptExpressionRef>,
    {
        self.reset_root(LogicalUnion(union), others)
    }

    pub fn build(self) -> OptExpressionRef {
        self.root
    }
}

/// Builds physical plans, mirrors [`LogicalPlanBuilder`].
pub struct PhysicalPlanBuilder {
    root: OptExpressionRef,
}

impl PhysicalPlanBuilder {
    pub fn scan(scan: PhysicalOlapScan) -> Self {
        Self::from_expr(Arc::new(OptExpression::with_operator(
            PhysicalScan(scan),
            vec![],
        )))
    }

    pub fn from_expr(root: OptExpressionRef) -> Self {
        Self { root }
    }

    fn reset_root<I>(self, operator: PhysicalOperator, others: I) -> Self
    where
        I: IntoIterator<Item = OptExpressionRef>,
    {
        let inputs = once(self.root).chain(others);
        Self {
            root: Arc::new(OptExpression::with_operator(operator, inputs)),
        }
    }

    pub fn filter(self, predicate: ScalarOperator) -> Self {
        self.reset_root(PhysicalFilter(Filter::new(predicate)), vec![])
    }

    pub fn project<I>(self, exprs: I) -> Self
    where
        I: IntoIterator<Item = (ColumnRefOperator, ScalarOperator)>,
    {
        self.reset_root(PhysicalProject(Project::new(exprs)), vec![])
    }

    pub fn hash_aggregate(self, aggregation: Aggregation) -> Self {
        self.reset_root(
            PhysicalHashAggregate(HashAggregate::new(aggregation)),
            vec![],
        )
    }

    pub fn hash_join(self, join: Join, right: OptExpressionRef) -> Self {
        self.reset_root(PhysicalHashJoin(HashJoin::new(join)), vec![right])
    }

    pub fn nest_loop_join(self, join: Join, right: OptExpressionRef) -> Self {
        self.reset_root(PhysicalNestLoopJoin(NestLoopJoin::new(join)), vec![right])
    }

    pub fn union<I>(self, union: Union, others: I) -> Self
    where
        I: IntoIterator<Item = OptExpressionRef>,
    {
        self.reset_root(PhysicalUnion(union), others)
    }

    pub fn build(self) -> OptExpressionRef {
        self.root
    }
}
