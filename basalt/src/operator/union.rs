use std::fmt::Formatter;

use itertools::Itertools;

use crate::column::ColumnRefSet;
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::{DisplayFields, OperatorBase, OperatorKind, OperatorTrait};
use crate::plan::ExpressionContext;
use crate::scalar::{ColumnRefOperator, ScalarOperator};

/// Concatenates rows of all inputs.
///
/// The i-th column of `child_output_columns[k]` feeds the i-th output column.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Union {
    base: OperatorBase,
    output_columns: Vec<ColumnRefOperator>,
    child_output_columns: Vec<Vec<ColumnRefOperator>>,
    is_union_all: bool,
}

impl Union {
    pub fn new(
        output_columns: Vec<ColumnRefOperator>,
        child_output_columns: Vec<Vec<ColumnRefOperator>>,
        is_union_all: bool,
    ) -> BasaltResult<Self> {
        if let Some(columns) = child_output_columns
            .iter()
            .find(|columns| columns.len() != output_columns.len())
        {
            return Err(OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalUnion,
                detail: format!(
                    "input produces {} columns, while union outputs {}",
                    columns.len(),
                    output_columns.len()
                ),
            }
            .into());
        }

        Ok(Self {
            base: OperatorBase::default(),
            output_columns,
            child_output_columns,
            is_union_all,
        })
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }

    pub fn with_predicate(mut self, predicate: Option<ScalarOperator>) -> Self {
        self.base.set_predicate(predicate);
        self
    }

    pub fn output_column_list(&self) -> &[ColumnRefOperator] {
        &self.output_columns
    }

    pub fn child_output_columns(&self) -> &[Vec<ColumnRefOperator>] {
        &self.child_output_columns
    }

    pub fn is_union_all(&self) -> bool {
        self.is_union_all
    }
}

impl OperatorTrait for Union {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, _ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        Ok(ColumnRefSet::with_columns(&self.output_columns))
    }
}

impl DisplayFields for Union {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("all", &self.is_union_all).field(
            "output",
            &format_args!("[{}]", self.output_columns.iter().join(", ")),
        );
        self.base.display_fields(&mut s);
        s.finish()
    }
}
