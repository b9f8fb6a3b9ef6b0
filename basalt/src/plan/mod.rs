//! Plan expressions.
//!
//! An [`OptExpression`] pairs an operator with its ordered inputs. Nodes are immutable and inputs
//! are shared through [`Arc`], so two parents may hold the same input subtree. A rewrite never
//! touches an existing node, it builds new nodes reusing untouched inputs.
mod builder;
pub use builder::*;
mod explain;
pub use explain::*;
mod validate;
pub use validate::*;

use std::fmt::{Debug, Formatter};
use std::ops::Index;
use std::sync::Arc;

use anyhow::anyhow;

use crate::column::ColumnRefSet;
use crate::error::BasaltResult;
use crate::operator::{Operator, OperatorTrait};
use crate::properties::LogicalProperty;
use crate::utils::TreeBuilder;

pub type OptExpressionRef = Arc<OptExpression>;

/// One node of a plan tree.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct OptExpression {
    operator: Operator,
    inputs: Vec<OptExpressionRef>,
}

impl OptExpression {
    pub fn new_builder<O: Into<Operator>>(operator: O) -> TreeBuilder<Self, Operator> {
        TreeBuilder::new(operator.into())
    }

    pub fn with_operator<O, I>(operator: O, inputs: I) -> Self
    where
        O: Into<Operator>,
        I: IntoIterator<Item = OptExpressionRef>,
    {
        Self {
            operator: operator.into(),
            inputs: inputs.into_iter().collect(),
        }
    }

    /// Creates a node with a new operator over the same inputs.
    pub fn clone_with_operator<O: Into<Operator>>(&self, operator: O) -> Self {
        Self {
            operator: operator.into(),
            inputs: self.inputs.clone(),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn inputs(&self) -> &[OptExpressionRef] {
        &self.inputs
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Logical properties of every input, in input order.
    pub fn expression_context(&self) -> BasaltResult<ExpressionContext> {
        let child_properties = self
            .inputs
            .iter()
            .map(|input| input.logical_property())
            .collect::<BasaltResult<Vec<LogicalProperty>>>()?;
        Ok(ExpressionContext::new(child_properties))
    }

    /// Derives the logical property of this node from its inputs.
    pub fn logical_property(&self) -> BasaltResult<LogicalProperty> {
        let ctx = self.expression_context()?;
        Ok(LogicalProperty::new(self.operator.output_columns(&ctx)?))
    }

    pub fn output_columns(&self) -> BasaltResult<ColumnRefSet> {
        let ctx = self.expression_context()?;
        self.operator.output_columns(&ctx)
    }

    fn format(&self, f: &mut Formatter<'_>, level: usize) -> std::fmt::Result {
        let prefix = if level > 0 {
            let mut buffer = String::with_capacity(2 * level);
            for _ in 0..(level - 1) {
                buffer.push_str("  ");
            }
            buffer.push_str("--");
            buffer
        } else {
            "".to_string()
        };

        writeln!(f, "{}{}", prefix, self.operator)?;
        for input in &self.inputs {
            input.format(f, level + 1)?;
        }

        Ok(())
    }
}

impl Debug for OptExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.format(f, 0)
    }
}

/// Creates a leaf node.
impl From<Operator> for OptExpression {
    fn from(operator: Operator) -> Self {
        OptExpression::with_operator(operator, vec![])
    }
}

impl From<(Operator, Vec<OptExpression>)> for OptExpression {
    fn from(t: (Operator, Vec<OptExpression>)) -> Self {
        OptExpression::with_operator(t.0, t.1.into_iter().map(Arc::new))
    }
}

/// Index of inputs.
impl Index<usize> for OptExpression {
    type Output = OptExpressionRef;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inputs[index]
    }
}

/// Properties of the inputs of the operator being derived.
#[derive(Clone, Debug, Default)]
pub struct ExpressionContext {
    child_properties: Vec<LogicalProperty>,
}

impl ExpressionContext {
    pub fn new(child_properties: Vec<LogicalProperty>) -> Self {
        Self { child_properties }
    }

    pub fn arity(&self) -> usize {
        self.child_properties.len()
    }

    pub fn child_logical_property(&self, idx: usize) -> BasaltResult<&LogicalProperty> {
        self.child_properties.get(idx).ok_or_else(|| {
            anyhow!(
                "Input {} requested from an expression with {} inputs",
                idx,
                self.child_properties.len()
            )
        })
    }

    pub fn child_output_columns(&self, idx: usize) -> BasaltResult<&ColumnRefSet> {
        Ok(self.child_logical_property(idx)?.output_columns())
    }

    /// Union of the output columns of all inputs.
    pub fn all_child_output_columns(&self) -> ColumnRefSet {
        let mut columns = ColumnRefSet::new();
        for prop in &self.child_properties {
            columns.union(prop.output_columns());
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::sync::Arc;

    use crate::column::ColumnRefSet;
    use crate::operator::{Join, JoinKind, LogicalOperator, Operator};
    use crate::plan::{ExpressionContext, OptExpression};
    use crate::scalar::ScalarOperator;
    use crate::test_utils::{scan_expr, test_context};

    fn hash_of(expr: &OptExpression) -> u64 {
        let mut hasher = DefaultHasher::new();
        expr.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_shared_inputs_and_structural_equality() {
        let mut ctx = test_context();
        let (t1, c1) = scan_expr(&mut ctx, "t1");
        let (t2, c2) = scan_expr(&mut ctx, "t2");
        let on = ScalarOperator::equal(c1[0].clone().into(), c2[0].clone().into());
        let join = Operator::from(LogicalOperator::from(
            Join::new(JoinKind::Inner, Some(on)).unwrap(),
        ));

        let j1 = OptExpression::with_operator(join.clone(), vec![t1.clone(), t2.clone()]);
        let j2 = OptExpression::with_operator(join, vec![t1.clone(), t2.clone()]);
        assert_eq!(j1, j2);
        assert_eq!(hash_of(&j1), hash_of(&j2));
        assert!(Arc::ptr_eq(&j1[0], &j2[0]));

        let swapped = j1.clone_with_operator(j1.operator().clone());
        assert_eq!(j1, swapped);
        let swapped = OptExpression::with_operator(j1.operator().clone(), vec![t2, t1]);
        assert_ne!(j1, swapped);
    }

    #[test]
    fn test_derive_output_columns() {
        let mut ctx = test_context();
        let (t1, c1) = scan_expr(&mut ctx, "t1");
        let (t2, c2) = scan_expr(&mut ctx, "t2");

        let join = OptExpression::new_builder(LogicalOperator::from(Join::new_cross()))
            .leaf(t1.operator().clone())
            .leaf(t2.operator().clone())
            .build();

        let mut expected = ColumnRefSet::with_columns(&c1);
        expected.union_columns(&c2);
        assert_eq!(expected, join.output_columns().unwrap());
        assert_eq!(
            ColumnRefSet::with_columns(&c1),
            *join.expression_context().unwrap().child_output_columns(0).unwrap()
        );
    }

    #[test]
    fn test_missing_input() {
        let ctx = ExpressionContext::default();
        assert_eq!(0, ctx.arity());
        assert!(ctx.child_output_columns(0).is_err());
        assert!(ctx.all_child_output_columns().is_empty());
    }
}
