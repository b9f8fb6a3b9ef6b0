use std::fmt::Formatter;

use itertools::Itertools;

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{DisplayFields, OperatorBase, OperatorTrait};
use crate::plan::ExpressionContext;
use crate::scalar::{ColumnRefOperator, ScalarOperator};

/// Computes new columns from the columns of its input.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Project {
    base: OperatorBase,
    column_ref_map: Vec<(ColumnRefOperator, ScalarOperator)>,
}

impl Project {
    pub fn new<I>(column_ref_map: I) -> Self
    where
        I: IntoIterator<Item = (ColumnRefOperator, ScalarOperator)>,
    {
        Self {
            base: OperatorBase::default(),
            column_ref_map: column_ref_map.into_iter().collect(),
        }
    }

    /// A projection passing `columns` through unchanged.
    pub fn identity<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a ColumnRefOperator>,
    {
        Self::new(columns.into_iter().map(|c| (c.clone(), c.clone().into())))
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }

    pub fn with_predicate(mut self, predicate: Option<ScalarOperator>) -> Self {
        self.base.set_predicate(predicate);
        self
    }

    pub fn column_ref_map(&self) -> &[(ColumnRefOperator, ScalarOperator)] {
        &self.column_ref_map
    }

    /// Columns the input must produce for all projected expressions.
    pub fn used_columns(&self) -> ColumnRefSet {
        let mut columns = ColumnRefSet::new();
        for (_, expr) in &self.column_ref_map {
            columns.union(&expr.used_columns());
        }
        columns
    }
}

impl OperatorTrait for Project {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, _ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        Ok(ColumnRefSet::with_columns(
            self.column_ref_map.iter().map(|(c, _)| c),
        ))
    }
}

impl DisplayFields for Project {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field(
            "exprs",
            &format_args!(
                "[{}]",
                self.column_ref_map
                    .iter()
                    .map(|(c, expr)| format!("{} := {}", c, expr))
                    .join(", ")
            ),
        );
        self.base.display_fields(&mut s);
        s.finish()
    }
}
