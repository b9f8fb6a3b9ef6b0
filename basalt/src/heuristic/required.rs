use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{
    accept, Aggregation, Join, Operator, OperatorTrait, OperatorVisitor, Project, Union,
};
use crate::plan::OptExpression;

/// Columns that must survive column pruning anywhere in `plan`.
///
/// These are the root's outputs plus every column some operator of the tree reads.
pub fn required_columns(plan: &OptExpression) -> BasaltResult<ColumnRefSet> {
    let mut columns = plan.output_columns()?;
    collect_used_columns(plan, &mut columns)?;
    Ok(columns)
}

fn collect_used_columns(plan: &OptExpression, columns: &mut ColumnRefSet) -> BasaltResult<()> {
    accept(&mut UsedColumnsCollector, plan.operator(), Some(plan), columns)?;
    for input in plan.inputs() {
        collect_used_columns(input, columns)?;
    }
    Ok(())
}

struct UsedColumnsCollector;

impl OperatorVisitor for UsedColumnsCollector {
    type C = ColumnRefSet;
    type R = ();

    fn visit_operator(
        &mut self,
        op: &Operator,
        _expr: Option<&OptExpression>,
        columns: &mut ColumnRefSet,
    ) -> BasaltResult<()> {
        columns.union(&op.base().predicate_used_columns());
        Ok(())
    }

    fn visit_logical_join(
        &mut self,
        _op: &Operator,
        join: &Join,
        _expr: Option<&OptExpression>,
        columns: &mut ColumnRefSet,
    ) -> BasaltResult<()> {
        columns.union(&join.required_child_input_columns());
        Ok(())
    }

    fn visit_logical_aggregation(
        &mut self,
        op: &Operator,
        aggregation: &Aggregation,
        expr: Option<&OptExpression>,
        columns: &mut ColumnRefSet,
    ) -> BasaltResult<()> {
        columns.union_columns(aggregation.grouping_keys());
        columns.union_columns(aggregation.partition_by_columns());
        columns.union(&aggregation.aggregations().used_columns());
        self.visit_operator(op, expr, columns)
    }

    fn visit_logical_project(
        &mut self,
        op: &Operator,
        project: &Project,
        expr: Option<&OptExpression>,
        columns: &mut ColumnRefSet,
    ) -> BasaltResult<()> {
        columns.union(&project.used_columns());
        self.visit_operator(op, expr, columns)
    }

    fn visit_logical_union(
        &mut self,
        op: &Operator,
        union: &Union,
        expr: Option<&OptExpression>,
        columns: &mut ColumnRefSet,
    ) -> BasaltResult<()> {
        for child_columns in union.child_output_columns() {
            columns.union_columns(child_columns);
        }
        self.visit_operator(op, expr, columns)
    }
}
