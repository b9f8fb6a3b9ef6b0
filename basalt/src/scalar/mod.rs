//! Scalar expression trees.
//!
//! Scalar operators appear inside relational operators as predicates, join conditions,
//! projections and aggregate calls. They are immutable values compared structurally, so two
//! equal sub expressions are the same expression for memoization.
mod call;
pub use call::*;
mod column_ref;
pub use column_ref::*;
mod predicate;
pub use predicate::*;

use std::fmt::{Display, Formatter};

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use enum_as_inner::EnumAsInner;

use crate::column::ColumnRefSet;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EnumAsInner)]
pub enum ScalarOperator {
    ColumnRef(ColumnRefOperator),
    Constant(ScalarValue),
    Call(CallOperator),
    BinaryPredicate(BinaryPredicateOperator),
    CompoundPredicate(CompoundPredicateOperator),
    IsNullPredicate(IsNullPredicateOperator),
}

impl ScalarOperator {
    pub fn binary(binary_type: BinaryType, left: ScalarOperator, right: ScalarOperator) -> Self {
        ScalarOperator::BinaryPredicate(BinaryPredicateOperator::new(binary_type, left, right))
    }

    pub fn equal(left: ScalarOperator, right: ScalarOperator) -> Self {
        Self::binary(BinaryType::Eq, left, right)
    }

    pub fn and(left: ScalarOperator, right: ScalarOperator) -> Self {
        ScalarOperator::CompoundPredicate(CompoundPredicateOperator::new(
            CompoundType::And,
            vec![left, right],
        ))
    }

    pub fn or(left: ScalarOperator, right: ScalarOperator) -> Self {
        ScalarOperator::CompoundPredicate(CompoundPredicateOperator::new(
            CompoundType::Or,
            vec![left, right],
        ))
    }

    pub fn not(child: ScalarOperator) -> Self {
        ScalarOperator::CompoundPredicate(CompoundPredicateOperator::new(
            CompoundType::Not,
            vec![child],
        ))
    }

    pub fn is_null(child: ScalarOperator) -> Self {
        ScalarOperator::IsNullPredicate(IsNullPredicateOperator::new(child, false))
    }

    pub fn boolean(value: bool) -> Self {
        ScalarOperator::Constant(ScalarValue::Boolean(Some(value)))
    }

    pub fn int64(value: i64) -> Self {
        ScalarOperator::Constant(ScalarValue::Int64(Some(value)))
    }

    /// Columns referenced anywhere in this tree.
    pub fn used_columns(&self) -> ColumnRefSet {
        let mut columns = ColumnRefSet::new();
        self.collect_used_columns(&mut columns);
        columns
    }

    fn collect_used_columns(&self, columns: &mut ColumnRefSet) {
        match self {
            ScalarOperator::ColumnRef(column) => columns.insert(column.id()),
            ScalarOperator::Constant(_) => {}
            _ => {
                for child in self.children() {
                    child.collect_used_columns(columns);
                }
            }
        }
    }

    pub fn children(&self) -> Vec<&ScalarOperator> {
        match self {
            ScalarOperator::ColumnRef(_) | ScalarOperator::Constant(_) => vec![],
            ScalarOperator::Call(call) => call.args().iter().collect(),
            ScalarOperator::BinaryPredicate(pred) => vec![pred.left(), pred.right()],
            ScalarOperator::CompoundPredicate(pred) => pred.children().iter().collect(),
            ScalarOperator::IsNullPredicate(pred) => vec![pred.child()],
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ScalarOperator::ColumnRef(column) => column.data_type().clone(),
            ScalarOperator::Constant(value) => value.get_datatype(),
            ScalarOperator::Call(call) => call.return_type().clone(),
            _ => DataType::Boolean,
        }
    }

    pub fn is_constant_true(&self) -> bool {
        matches!(self, ScalarOperator::Constant(ScalarValue::Boolean(Some(true))))
    }

    /// Splits a predicate on top level `AND`s.
    pub fn conjuncts(&self) -> Vec<ScalarOperator> {
        let mut conjuncts = vec![];
        self.collect_conjuncts(&mut conjuncts);
        conjuncts
    }

    fn collect_conjuncts(&self, conjuncts: &mut Vec<ScalarOperator>) {
        match self {
            ScalarOperator::CompoundPredicate(pred)
                if pred.compound_type() == CompoundType::And =>
            {
                for child in pred.children() {
                    child.collect_conjuncts(conjuncts);
                }
            }
            _ => conjuncts.push(self.clone()),
        }
    }

    /// Rebuilds a predicate from conjuncts. `None` when there is nothing left to filter by.
    pub fn compound_and<I: IntoIterator<Item = ScalarOperator>>(conjuncts: I) -> Option<Self> {
        conjuncts
            .into_iter()
            .filter(|c| !c.is_constant_true())
            .reduce(ScalarOperator::and)
    }
}

impl From<ColumnRefOperator> for ScalarOperator {
    fn from(column: ColumnRefOperator) -> Self {
        ScalarOperator::ColumnRef(column)
    }
}

impl From<CallOperator> for ScalarOperator {
    fn from(call: CallOperator) -> Self {
        ScalarOperator::Call(call)
    }
}

impl Display for ScalarOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarOperator::ColumnRef(column) => write!(f, "{}", column),
            ScalarOperator::Constant(value) => write!(f, "{}", value),
            ScalarOperator::Call(call) => write!(f, "{}", call),
            ScalarOperator::BinaryPredicate(pred) => write!(f, "{}", pred),
            ScalarOperator::CompoundPredicate(pred) => write!(f, "{}", pred),
            ScalarOperator::IsNullPredicate(pred) => write!(f, "{}", pred),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use arrow_schema::DataType;

    use crate::column::{ColumnRefFactory, ColumnRefSet};
    use crate::scalar::{CallOperator, ScalarOperator};

    fn hash_of(expr: &ScalarOperator) -> u64 {
        let mut hasher = DefaultHasher::new();
        expr.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_used_columns() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);
        let c = factory.create("c", DataType::Int64, false);

        let expr = ScalarOperator::and(
            ScalarOperator::equal(a.clone().into(), b.clone().into()),
            ScalarOperator::is_null(
                CallOperator::new("abs", vec![c.clone().into()], DataType::Int64).into(),
            ),
        );

        assert_eq!(
            ColumnRefSet::with_columns(vec![&a, &b, &c]),
            expr.used_columns()
        );
        assert!(ScalarOperator::int64(1).used_columns().is_empty());
    }

    #[test]
    fn test_structural_equality() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);

        let e1 = ScalarOperator::equal(a.clone().into(), b.clone().into());
        let e2 = ScalarOperator::equal(a.clone().into(), b.clone().into());
        assert_eq!(e1, e2);
        assert_eq!(hash_of(&e1), hash_of(&e2));

        let f1 = CallOperator::new(
            "minus",
            vec![a.clone().into(), b.clone().into()],
            DataType::Int64,
        );
        let f2 = CallOperator::new("minus", vec![b.into(), a.into()], DataType::Int64);
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_conjuncts_round_trip() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);

        let p1 = ScalarOperator::equal(a.clone().into(), ScalarOperator::int64(1));
        let p2 = ScalarOperator::equal(b.clone().into(), ScalarOperator::int64(2));
        let p3 = ScalarOperator::or(p1.clone(), p2.clone());

        let expr = ScalarOperator::and(ScalarOperator::and(p1.clone(), p2.clone()), p3.clone());
        assert_eq!(vec![p1.clone(), p2.clone(), p3.clone()], expr.conjuncts());

        let rebuilt = ScalarOperator::compound_and(expr.conjuncts()).unwrap();
        assert_eq!(expr.conjuncts(), rebuilt.conjuncts());

        assert_eq!(
            None,
            ScalarOperator::compound_and(vec![ScalarOperator::boolean(true)])
        );
    }

    #[test]
    fn test_display() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);

        let expr = ScalarOperator::and(
            ScalarOperator::equal(a.clone().into(), b.into()),
            ScalarOperator::not(ScalarOperator::is_null(
                CallOperator::new_distinct("count", vec![a.into()], DataType::Int64).into(),
            )),
        );
        assert_eq!(
            "1: a = 2: b AND (NOT count(distinct 1: a) IS NULL)",
            expr.to_string()
        );
    }
}
