use crate::error::BasaltResult;
use crate::operator::LogicalOperator::{
    LogicalAggregation, LogicalFilter, LogicalJoin, LogicalOlapScan, LogicalProject, LogicalUnion,
};
use crate::operator::Operator::{Logical, Physical};
use crate::operator::PhysicalOperator::{
    PhysicalFilter, PhysicalHashAggregate, PhysicalHashJoin, PhysicalNestLoopJoin,
    PhysicalOlapScan as PhysicalScan, PhysicalProject, PhysicalUnion,
};
use crate::operator::{
    Aggregation, Filter, HashAggregate, HashJoin, Join, NestLoopJoin, OlapScan, Operator,
    OperatorTrait, PhysicalOlapScan, Project, Union,
};
use crate::plan::OptExpression;

/// Visitor over operators.
///
/// Every variant method falls back to [`OperatorVisitor::visit_operator`], so a visitor only
/// overrides the variants it cares about. `expr` is the plan node holding the operator when the
/// caller walks a tree, visitors which only need the operator ignore it.
pub trait OperatorVisitor {
    /// Context
    type C;
    type R;

    fn visit_operator(
        &mut self,
        op: &Operator,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R>;

    fn visit_logical_olap_scan(
        &mut self,
        op: &Operator,
        _scan: &OlapScan,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_logical_join(
        &mut self,
        op: &Operator,
        _join: &Join,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_logical_aggregation(
        &mut self,
        op: &Operator,
        _aggregation: &Aggregation,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_logical_project(
        &mut self,
        op: &Operator,
        _project: &Project,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_logical_filter(
        &mut self,
        op: &Operator,
        _filter: &Filter,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_logical_union(
        &mut self,
        op: &Operator,
        _union: &Union,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_olap_scan(
        &mut self,
        op: &Operator,
        _scan: &PhysicalOlapScan,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_hash_join(
        &mut self,
        op: &Operator,
        _join: &HashJoin,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_nest_loop_join(
        &mut self,
        op: &Operator,
        _join: &NestLoopJoin,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_hash_aggregate(
        &mut self,
        op: &Operator,
        _aggregate: &HashAggregate,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_project(
        &mut self,
        op: &Operator,
        _project: &Project,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_filter(
        &mut self,
        op: &Operator,
        _filter: &Filter,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }

    fn visit_physical_union(
        &mut self,
        op: &Operator,
        _union: &Union,
        expr: Option<&OptExpression>,
        ctx: &mut Self::C,
    ) -> BasaltResult<Self::R> {
        self.visit_operator(op, expr, ctx)
    }
}

/// Dispatches `op` to the visitor method of its variant.
pub fn accept<V: OperatorVisitor>(
    visitor: &mut V,
    op: &Operator,
    expr: Option<&OptExpression>,
    ctx: &mut V::C,
) -> BasaltResult<V::R> {
    match op {
        Logical(LogicalOlapScan(scan)) => visitor.visit_logical_olap_scan(op, scan, expr, ctx),
        Logical(LogicalJoin(join)) => visitor.visit_logical_join(op, join, expr, ctx),
        Logical(LogicalAggregation(agg)) => visitor.visit_logical_aggregation(op, agg, expr, ctx),
        Logical(LogicalProject(project)) => visitor.visit_logical_project(op, project, expr, ctx),
        Logical(LogicalFilter(filter)) => visitor.visit_logical_filter(op, filter, expr, ctx),
        Logical(LogicalUnion(union)) => visitor.visit_logical_union(op, union, expr, ctx),
        Physical(PhysicalScan(scan)) => visitor.visit_physical_olap_scan(op, scan, expr, ctx),
        Physical(PhysicalHashJoin(join)) => visitor.visit_physical_hash_join(op, join, expr, ctx),
        Physical(PhysicalNestLoopJoin(join)) => {
            visitor.visit_physical_nest_loop_join(op, join, expr, ctx)
        }
        Physical(PhysicalHashAggregate(agg)) => {
            visitor.visit_physical_hash_aggregate(op, agg, expr, ctx)
        }
        Physical(PhysicalProject(project)) => {
            visitor.visit_physical_project(op, project, expr, ctx)
        }
        Physical(PhysicalFilter(filter)) => visitor.visit_physical_filter(op, filter, expr, ctx),
        Physical(PhysicalUnion(union)) => visitor.visit_physical_union(op, union, expr, ctx),
    }
}
