use log::error;

use crate::column::ColumnRefSet;
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::{
    accept, Aggregation, HashAggregate, HashJoin, Join, NestLoopJoin, Operator, OperatorKind,
    OperatorTrait, OperatorVisitor, Project, Union,
};
use crate::plan::{ExpressionContext, OptExpression};
use crate::properties::LogicalProperty;

/// Checks that every operator of `plan` only references columns produced below it.
///
/// Predicates may also reference the operator's own outputs. Returns the logical property of
/// the root on success, otherwise the first [`OptimizerError::UnresolvedColumn`] found bottom up.
pub fn validate(plan: &OptExpression) -> BasaltResult<LogicalProperty> {
    let child_properties = plan
        .inputs()
        .iter()
        .map(|input| validate(input))
        .collect::<BasaltResult<Vec<LogicalProperty>>>()?;
    let mut ctx = ExpressionContext::new(child_properties);

    accept(&mut ColumnResolver, plan.operator(), Some(plan), &mut ctx)?;
    Ok(LogicalProperty::new(plan.operator().output_columns(&ctx)?))
}

struct ColumnResolver;

impl ColumnResolver {
    fn check(
        kind: OperatorKind,
        used: &ColumnRefSet,
        available: &ColumnRefSet,
    ) -> BasaltResult<()> {
        match used.iter().find(|id| !available.contains(*id)) {
            Some(column) => {
                error!(
                    "{} references column {} but only {} are available",
                    kind, column, available
                );
                Err(OptimizerError::UnresolvedColumn { kind, column }.into())
            }
            None => Ok(()),
        }
    }

    /// Inputs and the operator's own outputs.
    fn predicate_scope(op: &Operator, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        let mut columns = ctx.all_child_output_columns();
        columns.union(&op.output_columns(ctx)?);
        Ok(columns)
    }

    fn check_join(op: &Operator, join: &Join, ctx: &ExpressionContext) -> BasaltResult<()> {
        Self::check(
            op.kind(),
            &join.required_child_input_columns(),
            &ctx.all_child_output_columns(),
        )?;
        if let Some(columns) = join.prune_output_columns() {
            Self::check(
                op.kind(),
                &ColumnRefSet::with_columns(columns),
                &ctx.all_child_output_columns(),
            )?;
        }
        Ok(())
    }

    fn check_aggregation(
        op: &Operator,
        aggregation: &Aggregation,
        ctx: &ExpressionContext,
    ) -> BasaltResult<()> {
        let mut used = ColumnRefSet::with_columns(aggregation.grouping_keys());
        used.union(&aggregation.aggregations().used_columns());
        Self::check(op.kind(), &used, &ctx.all_child_output_columns())?;
        Self::check(
            op.kind(),
            &op.base().predicate_used_columns(),
            &Self::predicate_scope(op, ctx)?,
        )
    }

    fn check_project(
        op: &Operator,
        project: &Project,
        ctx: &ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check(op.kind(), &project.used_columns(), &ctx.all_child_output_columns())?;
        Self::check(
            op.kind(),
            &op.base().predicate_used_columns(),
            &Self::predicate_scope(op, ctx)?,
        )
    }

    fn check_union(op: &Operator, union: &Union, ctx: &ExpressionContext) -> BasaltResult<()> {
        for (idx, columns) in union.child_output_columns().iter().enumerate() {
            Self::check(
                op.kind(),
                &ColumnRefSet::with_columns(columns),
                ctx.child_output_columns(idx)?,
            )?;
        }
        Self::check(
            op.kind(),
            &op.base().predicate_used_columns(),
            &Self::predicate_scope(op, ctx)?,
        )
    }
}

impl OperatorVisitor for ColumnResolver {
    type C = ExpressionContext;
    type R = ();

    fn visit_operator(
        &mut self,
        op: &Operator,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check(
            op.kind(),
            &op.base().predicate_used_columns(),
            &Self::predicate_scope(op, ctx)?,
        )
    }

    fn visit_logical_join(
        &mut self,
        op: &Operator,
        join: &Join,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_join(op, join, ctx)
    }

    fn visit_logical_aggregation(
        &mut self,
        op: &Operator,
        aggregation: &Aggregation,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_aggregation(op, aggregation, ctx)
    }

    fn visit_logical_project(
        &mut self,
        op: &Operator,
        project: &Project,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_project(op, project, ctx)
    }

    fn visit_logical_union(
        &mut self,
        op: &Operator,
        union: &Union,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_union(op, union, ctx)
    }

    fn visit_physical_hash_join(
        &mut self,
        op: &Operator,
        join: &HashJoin,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_join(op, join.join(), ctx)
    }

    fn visit_physical_nest_loop_join(
        &mut self,
        op: &Operator,
        join: &NestLoopJoin,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_join(op, join.join(), ctx)
    }

    fn visit_physical_hash_aggregate(
        &mut self,
        op: &Operator,
        aggregate: &HashAggregate,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_aggregation(op, aggregate.aggregation(), ctx)
    }

    fn visit_physical_project(
        &mut self,
        op: &Operator,
        project: &Project,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_project(op, project, ctx)
    }

    fn visit_physical_union(
        &mut self,
        op: &Operator,
        union: &Union,
        _expr: Option<&OptExpression>,
        ctx: &mut ExpressionContext,
    ) -> BasaltResult<()> {
        Self::check_union(op, union, ctx)
    }
}
