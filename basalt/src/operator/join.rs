use std::fmt::Formatter;

use itertools::Itertools;
use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::column::ColumnRefSet;
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::{DisplayFields, OperatorBase, OperatorKind, OperatorTrait, PlanningMeta};
use crate::plan::ExpressionContext;
use crate::scalar::{ColumnRefOperator, ScalarOperator};

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinKind {
    Inner,
    Cross,
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    RightSemi,
    LeftAnti,
    RightAnti,
    NullAwareLeftAnti,
}

impl JoinKind {
    pub fn is_inner(self) -> bool {
        self == JoinKind::Inner
    }

    pub fn is_cross(self) -> bool {
        self == JoinKind::Cross
    }

    pub fn is_outer(self) -> bool {
        matches!(
            self,
            JoinKind::LeftOuter | JoinKind::RightOuter | JoinKind::FullOuter
        )
    }

    /// Only rows of the left input are visible above the join.
    pub fn outputs_left_only(self) -> bool {
        matches!(
            self,
            JoinKind::LeftSemi | JoinKind::LeftAnti | JoinKind::NullAwareLeftAnti
        )
    }

    pub fn outputs_right_only(self) -> bool {
        matches!(self, JoinKind::RightSemi | JoinKind::RightAnti)
    }
}

#[derive(Clone, Debug, Default)]
struct JoinPlanningState {
    hint: String,
    /// Set once the on clause has been pushed into inputs, never cleared.
    has_push_down_join_on_clause: bool,
}

/// Logical join operator.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Join {
    base: OperatorBase,
    join_kind: JoinKind,
    on_predicate: Option<ScalarOperator>,
    /// Output columns chosen by column pruning, absent until pruning runs.
    prune_output_columns: Option<Vec<ColumnRefOperator>>,
    planning: PlanningMeta<JoinPlanningState>,
}

impl Join {
    /// The on predicate may only be absent for cross joins.
    pub fn new(join_kind: JoinKind, on_predicate: Option<ScalarOperator>) -> BasaltResult<Self> {
        if on_predicate.is_none() && !join_kind.is_cross() {
            return Err(OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalJoin,
                detail: format!("{} join requires an on predicate", join_kind),
            }
            .into());
        }

        Ok(Self {
            base: OperatorBase::default(),
            join_kind,
            on_predicate,
            prune_output_columns: None,
            planning: PlanningMeta::default(),
        })
    }

    pub fn new_cross() -> Self {
        Self {
            base: OperatorBase::default(),
            join_kind: JoinKind::Cross,
            on_predicate: None,
            prune_output_columns: None,
            planning: PlanningMeta::default(),
        }
    }

    pub fn with_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.planning.hint = hint.into();
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }

    pub fn with_predicate(mut self, predicate: Option<ScalarOperator>) -> Self {
        self.base.set_predicate(predicate);
        self
    }

    pub fn with_prune_output_columns(mut self, columns: Vec<ColumnRefOperator>) -> Self {
        self.prune_output_columns = Some(columns);
        self
    }

    /// Replaces the on predicate, keeping all other fields.
    pub fn with_on_predicate(mut self, on_predicate: Option<ScalarOperator>) -> BasaltResult<Self> {
        if on_predicate.is_none() && !self.join_kind.is_cross() {
            return Err(OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalJoin,
                detail: format!("{} join requires an on predicate", self.join_kind),
            }
            .into());
        }
        self.on_predicate = on_predicate;
        Ok(self)
    }

    /// Marks the on clause as pushed down.
    pub fn set_push_down_join_on_clause(&mut self) {
        self.planning.has_push_down_join_on_clause = true;
    }

    pub fn has_push_down_join_on_clause(&self) -> bool {
        self.planning.has_push_down_join_on_clause
    }

    pub fn join_kind(&self) -> JoinKind {
        self.join_kind
    }

    pub fn on_predicate(&self) -> Option<&ScalarOperator> {
        self.on_predicate.as_ref()
    }

    pub fn hint(&self) -> &str {
        &self.planning.hint
    }

    pub fn prune_output_columns(&self) -> Option<&[ColumnRefOperator]> {
        self.prune_output_columns.as_deref()
    }

    /// Output columns as if column pruning never ran.
    pub fn unpruned_output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        if self.join_kind.outputs_left_only() {
            return Ok(ctx.child_output_columns(0)?.clone());
        }
        if self.join_kind.outputs_right_only() {
            return Ok(ctx.child_output_columns(1)?.clone());
        }

        let mut columns = ColumnRefSet::new();
        for idx in 0..ctx.arity() {
            columns.union(ctx.child_output_columns(idx)?);
        }
        Ok(columns)
    }

    /// Inner and cross joins allow unrestricted reordering of inputs and predicates.
    pub fn is_inner_or_cross_join(&self) -> bool {
        self.join_kind.is_inner() || self.join_kind.is_cross()
    }

    /// Columns the inputs must keep visible for the on predicate and residual predicate.
    pub fn required_child_input_columns(&self) -> ColumnRefSet {
        let mut columns = ColumnRefSet::new();
        if let Some(on_predicate) = &self.on_predicate {
            columns.union(&on_predicate.used_columns());
        }
        columns.union(&self.base.predicate_used_columns());
        columns
    }
}

impl OperatorTrait for Join {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        match &self.prune_output_columns {
            Some(columns) => Ok(ColumnRefSet::with_columns(columns)),
            None => self.unpruned_output_columns(ctx),
        }
    }
}

impl DisplayFields for Join {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("join_kind", &format_args!("{}", self.join_kind));
        if let Some(on_predicate) = &self.on_predicate {
            s.field("on", &format_args!("{}", on_predicate));
        }
        if let Some(columns) = &self.prune_output_columns {
            s.field("output", &format_args!("[{}]", columns.iter().join(", ")));
        }
        self.base.display_fields(&mut s);
        s.finish()
    }
}

/// Hash join, implements joins with at least one equi conjunct across inputs.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct HashJoin(Join);

impl HashJoin {
    pub fn new(join: Join) -> Self {
        Self(join)
    }

    pub fn join(&self) -> &Join {
        &self.0
    }
}

/// Nested loop join, implements any join kind and condition.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct NestLoopJoin(Join);

impl NestLoopJoin {
    pub fn new(join: Join) -> Self {
        Self(join)
    }

    pub fn join(&self) -> &Join {
        &self.0
    }
}

impl OperatorTrait for HashJoin {
    fn base(&self) -> &OperatorBase {
        self.0.base()
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        self.0.output_columns(ctx)
    }
}

impl OperatorTrait for NestLoopJoin {
    fn base(&self) -> &OperatorBase {
        self.0.base()
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        self.0.output_columns(ctx)
    }
}

impl DisplayFields for HashJoin {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.display(f)
    }
}

impl DisplayFields for NestLoopJoin {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.display(f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use arrow_schema::DataType;

    use crate::column::{ColumnRefFactory, ColumnRefSet};
    use crate::error::OptimizerError;
    use crate::operator::{Join, JoinKind};
    use crate::scalar::ScalarOperator;

    fn hash_of(join: &Join) -> u64 {
        let mut hasher = DefaultHasher::new();
        join.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_ignores_planning_state() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);
        let on = ScalarOperator::equal(a.clone().into(), b.clone().into());

        let j1 = Join::new(JoinKind::Inner, Some(on.clone())).unwrap();
        let mut j2 = Join::new(JoinKind::Inner, Some(on.clone()))
            .unwrap()
            .with_hint("BROADCAST");
        j2.set_push_down_join_on_clause();

        assert_eq!(j1, j2);
        assert_eq!(hash_of(&j1), hash_of(&j2));
        assert!(!j1.has_push_down_join_on_clause());
        assert!(j2.has_push_down_join_on_clause());

        let j3 = Join::new(JoinKind::LeftOuter, Some(on.clone())).unwrap();
        assert_ne!(j1, j3);

        let j4 = j1.clone().with_prune_output_columns(vec![a.clone()]);
        assert_ne!(j1, j4);

        let j5 = Join::new(
            JoinKind::Inner,
            Some(ScalarOperator::equal(b.into(), a.into())),
        )
        .unwrap();
        assert_ne!(j1, j5);
    }

    #[test]
    fn test_required_child_input_columns() {
        let mut factory = ColumnRefFactory::new();
        let a = factory.create("a", DataType::Int64, false);
        let b = factory.create("b", DataType::Int64, false);
        let c = factory.create("c", DataType::Int64, false);
        let _d = factory.create("d", DataType::Int64, false);

        let join = Join::new(
            JoinKind::LeftOuter,
            Some(ScalarOperator::equal(a.clone().into(), b.clone().into())),
        )
        .unwrap()
        .with_predicate(Some(ScalarOperator::is_null(c.clone().into())));

        assert_eq!(
            ColumnRefSet::with_columns(vec![&a, &b, &c]),
            join.required_child_input_columns()
        );
        assert!(!join.is_inner_or_cross_join());
        assert!(Join::new_cross().is_inner_or_cross_join());
        assert!(Join::new_cross().required_child_input_columns().is_empty());
    }

    #[test]
    fn test_missing_on_predicate() {
        let err = Join::new(JoinKind::Inner, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizerError>(),
            Some(OptimizerError::InvariantViolation { .. })
        ));
    }
}
