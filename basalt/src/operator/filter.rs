use std::fmt::Formatter;

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{DisplayFields, OperatorBase, OperatorTrait};
use crate::plan::ExpressionContext;
use crate::scalar::ScalarOperator;

/// Keeps rows of its input matching the predicate.
///
/// The predicate is stored in the operator envelope like the residual predicate of any other
/// operator.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Filter {
    base: OperatorBase,
}

impl Filter {
    pub fn new(predicate: ScalarOperator) -> Self {
        Self {
            base: OperatorBase::new(None, Some(predicate)),
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }
}

impl OperatorTrait for Filter {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        Ok(ctx.child_output_columns(0)?.clone())
    }
}

impl DisplayFields for Filter {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        self.base.display_fields(&mut s);
        s.finish()
    }
}
