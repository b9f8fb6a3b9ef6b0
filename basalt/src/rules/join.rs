use std::sync::Arc;

use log::debug;

use crate::column::ColumnRefSet;
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::LogicalOperator::{LogicalFilter, LogicalJoin};
use crate::operator::Operator::Logical;
use crate::operator::PhysicalOperator::{PhysicalHashJoin, PhysicalNestLoopJoin};
use crate::operator::{Filter, HashJoin, Join, NestLoopJoin, OperatorKind};
use crate::optimizer::OptimizerContext;
use crate::plan::{ExpressionContext, OptExpression, OptExpressionRef};
use crate::rules::RulePromise::{High, Low, Medium};
use crate::rules::{pattern, Pattern, Rule, RulePromise, RuleResult, RuleType, ANY};
use crate::scalar::ScalarOperator;

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref BINARY_JOIN_PATTERN: Pattern = {
        pattern(OperatorKind::LogicalJoin)
            .leaf(ANY)
            .leaf(ANY)
        .build()
    };
}

fn join_of<'a>(input: &'a OptExpression, rule_type: RuleType) -> BasaltResult<&'a Join> {
    match input.operator() {
        Logical(LogicalJoin(join)) => Ok(join),
        _ => Err(OptimizerError::PatternMismatch {
            rule: rule_type.to_string(),
        }
        .into()),
    }
}

/// Commutate inner and cross join inputs.
#[derive(Clone)]
pub struct JoinCommutativityRule {}

impl JoinCommutativityRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for JoinCommutativityRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let join = join_of(input, self.rule_type())?;
        if !join.is_inner_or_cross_join() {
            debug!("Skip commutating {} join", join.join_kind());
            return Ok(());
        }

        result.add(OptExpression::with_operator(
            input.operator().clone(),
            vec![input[1].clone(), input[0].clone()],
        ));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_JOIN_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::JoinCommutativity
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }
}

/// Pushes conjuncts of an inner join on clause which only reference one input into a filter
/// over that input.
///
/// The push down flag of the join is set on the produced join, even if no conjunct could be
/// pushed, and the rule declines joins having it.
#[derive(Clone)]
pub struct PushDownJoinOnClauseRule {}

impl PushDownJoinOnClauseRule {
    pub fn new() -> Self {
        Self {}
    }

    fn push_down(input: &OptExpressionRef, conjuncts: Vec<ScalarOperator>) -> OptExpressionRef {
        match ScalarOperator::compound_and(conjuncts) {
            Some(predicate) => Arc::new(OptExpression::with_operator(
                LogicalFilter(Filter::new(predicate)),
                vec![input.clone()],
            )),
            None => input.clone(),
        }
    }
}

impl Rule for PushDownJoinOnClauseRule {
    fn apply(
        &self,
        input: &OptExpression,
        ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let join = join_of(input, self.rule_type())?;
        if join.has_push_down_join_on_clause() {
            debug!("Join on clause already pushed down");
            return Ok(());
        }
        if !ctx.session().enable_push_down_join_on_clause {
            debug!("Join on clause push down disabled by session");
            return Ok(());
        }
        if !join.is_inner_or_cross_join() {
            debug!("Skip pushing down on clause of {} join", join.join_kind());
            return Ok(());
        }

        let expr_ctx = input.expression_context()?;
        let left_columns = expr_ctx.child_output_columns(0)?;
        let right_columns = expr_ctx.child_output_columns(1)?;

        let mut left_conjuncts = vec![];
        let mut right_conjuncts = vec![];
        let mut remaining = vec![];
        for conjunct in join.on_predicate().map(|p| p.conjuncts()).unwrap_or_default() {
            let used = conjunct.used_columns();
            if used.is_empty() {
                remaining.push(conjunct);
            } else if used.is_subset_of(left_columns) {
                left_conjuncts.push(conjunct);
            } else if used.is_subset_of(right_columns) {
                right_conjuncts.push(conjunct);
            } else {
                remaining.push(conjunct);
            }
        }

        let on_predicate = match ScalarOperator::compound_and(remaining) {
            Some(predicate) => Some(predicate),
            None if join.join_kind().is_cross() => None,
            None => Some(ScalarOperator::boolean(true)),
        };
        let mut new_join = join.clone().with_on_predicate(on_predicate)?;
        new_join.set_push_down_join_on_clause();

        debug!(
            "Pushed {} conjuncts to left and {} to right input of join",
            left_conjuncts.len(),
            right_conjuncts.len()
        );
        result.add(OptExpression::with_operator(
            LogicalJoin(new_join),
            vec![
                Self::push_down(&input[0], left_conjuncts),
                Self::push_down(&input[1], right_conjuncts),
            ],
        ));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_JOIN_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::PushDownJoinOnClause
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }
}

/// Restricts join outputs to the columns required above the join.
///
/// Columns only read by the on predicate or the residual predicate are not outputs unless a
/// parent requires them. They are added to the required columns of the context afterwards, so
/// that pruning below the join never drops them.
#[derive(Clone)]
pub struct PruneJoinColumnsRule {}

impl PruneJoinColumnsRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for PruneJoinColumnsRule {
    fn apply(
        &self,
        input: &OptExpression,
        ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let join = join_of(input, self.rule_type())?;
        let mut output = join.unpruned_output_columns(&input.expression_context()?)?;
        output.intersect(ctx.required_columns());
        ctx.add_required_columns(&join.required_child_input_columns());

        if let Some(columns) = join.prune_output_columns() {
            if ColumnRefSet::with_columns(columns) == output {
                debug!("Join output columns already pruned to {}", output);
                return Ok(());
            }
        }

        let columns = ctx.column_factory().column_refs(&output)?;
        debug!("Prune join output columns to {}", output);
        result.add(input.clone_with_operator(LogicalJoin(
            join.clone().with_prune_output_columns(columns),
        )));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_JOIN_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::PruneJoinColumns
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }
}

/// Implements joins having an equality conjunct between both inputs as hash joins.
#[derive(Clone)]
pub struct HashJoinImplementationRule {}

impl HashJoinImplementationRule {
    pub fn new() -> Self {
        Self {}
    }

    /// Any conjunct `l = r` or `l <=> r` with each side over a different input.
    fn has_equi_conjunct(join: &Join, ctx: &ExpressionContext) -> BasaltResult<bool> {
        let left = ctx.child_output_columns(0)?;
        let right = ctx.child_output_columns(1)?;
        let conjuncts = join.on_predicate().map(|p| p.conjuncts()).unwrap_or_default();

        Ok(conjuncts.iter().any(|conjunct| match conjunct {
            ScalarOperator::BinaryPredicate(pred) if pred.binary_type().is_equal() => {
                let l = pred.left().used_columns();
                let r = pred.right().used_columns();
                !l.is_empty()
                    && !r.is_empty()
                    && ((l.is_subset_of(left) && r.is_subset_of(right))
                        || (l.is_subset_of(right) && r.is_subset_of(left)))
            }
            _ => false,
        }))
    }
}

impl Rule for HashJoinImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let join = join_of(input, self.rule_type())?;
        if !Self::has_equi_conjunct(join, &input.expression_context()?)? {
            debug!("Join has no equi conjunct, can't implement as hash join");
            return Ok(());
        }

        result.add(input.clone_with_operator(PhysicalHashJoin(HashJoin::new(join.clone()))));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_JOIN_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementHashJoin
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }
}

/// Implements any join as a nested loop join.
#[derive(Clone)]
pub struct NestLoopJoinImplementationRule {}

impl NestLoopJoinImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for NestLoopJoinImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let join = join_of(input, self.rule_type())?;
        result.add(input.clone_with_operator(PhysicalNestLoopJoin(NestLoopJoin::new(
            join.clone(),
        ))));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_JOIN_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementNestLoopJoin
    }

    fn rule_promise(&self) -> RulePromise {
        Low
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::column::ColumnRefSet;
    use crate::operator::LogicalOperator::{LogicalFilter, LogicalJoin};
    use crate::operator::Operator::Logical;
    use crate::operator::{Join, JoinKind, LogicalOperator, OperatorKind};
    use crate::optimizer::{OptimizerContext, SessionVariables};
    use crate::plan::{OptExpression, OptExpressionRef};
    use crate::rules::{
        HashJoinImplementationRule, JoinCommutativityRule, NestLoopJoinImplementationRule,
        PruneJoinColumnsRule, PushDownJoinOnClauseRule, Rule,
    };
    use crate::scalar::{ColumnRefOperator, ScalarOperator};
    use crate::test_utils::{scan_expr, test_context, test_context_with_session};

    struct JoinFixture {
        t1: OptExpressionRef,
        t2: OptExpressionRef,
        /// `a, c, b, d`
        columns: Vec<ColumnRefOperator>,
    }

    impl JoinFixture {
        fn new(ctx: &mut OptimizerContext) -> Self {
            let (t1, mut columns) = scan_expr(ctx, "t1");
            let (t2, right) = scan_expr(ctx, "t2");
            columns.extend(right);
            Self { t1, t2, columns }
        }

        fn col(&self, idx: usize) -> ScalarOperator {
            self.columns[idx].clone().into()
        }

        fn a_eq_b(&self) -> ScalarOperator {
            ScalarOperator::equal(self.col(0), self.col(2))
        }

        fn join(&self, join: Join) -> OptExpression {
            OptExpression::with_operator(
                LogicalOperator::from(join),
                vec![self.t1.clone(), self.t2.clone()],
            )
        }
    }

    fn join_of(expr: &OptExpression) -> &Join {
        match expr.operator() {
            Logical(LogicalJoin(join)) => join,
            _ => panic!("{:?} is not a join", expr.operator().kind()),
        }
    }

    #[test]
    fn test_push_down_on_clause_once() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let c_is_null = ScalarOperator::is_null(f.col(1));
        let on = ScalarOperator::and(f.a_eq_b(), c_is_null.clone());
        let input = f.join(Join::new(JoinKind::Inner, Some(on)).unwrap());

        let rule = PushDownJoinOnClauseRule::new();
        let results = rule.transform(&input, &mut ctx).unwrap();
        assert_eq!(1, results.len());

        let join = join_of(&results[0]);
        assert!(join.has_push_down_join_on_clause());
        assert_eq!(Some(&f.a_eq_b()), join.on_predicate());

        let filter = results[0][0].operator();
        assert!(matches!(filter, Logical(LogicalFilter(_))));
        assert_eq!(Some(&c_is_null), filter.predicate());
        assert!(Arc::ptr_eq(&f.t1, &results[0][0][0]));
        assert!(Arc::ptr_eq(&f.t2, &results[0][1]));

        assert!(rule.transform(&results[0], &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_push_down_declines() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let rule = PushDownJoinOnClauseRule::new();

        let outer = f.join(Join::new(JoinKind::LeftOuter, Some(f.a_eq_b())).unwrap());
        assert!(rule.transform(&outer, &mut ctx).unwrap().is_empty());

        let session = SessionVariables {
            enable_push_down_join_on_clause: false,
            ..SessionVariables::default()
        };
        let mut ctx = test_context_with_session(session);
        let f = JoinFixture::new(&mut ctx);
        let inner = f.join(Join::new(JoinKind::Inner, Some(f.a_eq_b())).unwrap());
        assert!(rule.transform(&inner, &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_push_down_whole_on_clause() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let on = ScalarOperator::equal(f.col(3), ScalarOperator::int64(1));
        let input = f.join(Join::new(JoinKind::Inner, Some(on)).unwrap());

        let results = PushDownJoinOnClauseRule::new()
            .transform(&input, &mut ctx)
            .unwrap();
        let join = join_of(&results[0]);
        assert!(join.on_predicate().unwrap().is_constant_true());
        assert_eq!(OperatorKind::LogicalOlapScan, results[0][0].operator().kind());
        assert_eq!(OperatorKind::LogicalFilter, results[0][1].operator().kind());
    }

    #[test]
    fn test_join_required_columns_and_commutativity() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let input = f.join(Join::new(JoinKind::Inner, Some(f.a_eq_b())).unwrap());
        let join = join_of(&input);

        assert_eq!(
            ColumnRefSet::with_columns(vec![&f.columns[0], &f.columns[2]]),
            join.required_child_input_columns()
        );
        assert!(join.is_inner_or_cross_join());

        let results = JoinCommutativityRule::new()
            .transform(&input, &mut ctx)
            .unwrap();
        assert_eq!(1, results.len());
        assert_eq!(input.operator(), results[0].operator());
        assert!(Arc::ptr_eq(&f.t2, &results[0][0]));
        assert!(Arc::ptr_eq(&f.t1, &results[0][1]));
        assert_eq!(
            input.output_columns().unwrap(),
            results[0].output_columns().unwrap()
        );

        let outer = f.join(Join::new(JoinKind::LeftOuter, Some(f.a_eq_b())).unwrap());
        let results = JoinCommutativityRule::new()
            .transform(&outer, &mut ctx)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_prune_join_columns() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let input = f.join(Join::new(JoinKind::Inner, Some(f.a_eq_b())).unwrap());
        ctx.set_required_columns(ColumnRefSet::with_columns(vec![&f.columns[3]]));

        let rule = PruneJoinColumnsRule::new();
        let results = rule.transform(&input, &mut ctx).unwrap();
        assert_eq!(1, results.len());

        // Join keys are read from the inputs but nothing above needs them.
        let expected = vec![f.columns[3].clone()];
        assert_eq!(
            Some(expected.as_slice()),
            join_of(&results[0]).prune_output_columns()
        );
        assert_eq!(
            ColumnRefSet::with_columns(&expected),
            results[0].output_columns().unwrap()
        );
        assert_eq!(
            ColumnRefSet::with_columns(vec![&f.columns[0], &f.columns[2], &f.columns[3]]),
            *ctx.required_columns()
        );

        ctx.set_required_columns(ColumnRefSet::with_columns(vec![&f.columns[3]]));
        assert!(rule.transform(&results[0], &mut ctx).unwrap().is_empty());

        // Join keys required above stay visible.
        ctx.set_required_columns(ColumnRefSet::with_columns(vec![&f.columns[0], &f.columns[3]]));
        let results = rule.transform(&input, &mut ctx).unwrap();
        assert_eq!(
            Some([f.columns[0].clone(), f.columns[3].clone()].as_slice()),
            join_of(&results[0]).prune_output_columns()
        );
    }

    #[test]
    fn test_implement_joins() {
        let mut ctx = test_context();
        let f = JoinFixture::new(&mut ctx);
        let equi = f.join(Join::new(JoinKind::Inner, Some(f.a_eq_b())).unwrap());
        let results = HashJoinImplementationRule::new()
            .transform(&equi, &mut ctx)
            .unwrap();
        assert_eq!(1, results.len());
        assert_eq!(OperatorKind::PhysicalHashJoin, results[0].operator().kind());

        let same_side = ScalarOperator::equal(f.col(0), f.col(1));
        let non_equi = f.join(Join::new(JoinKind::Inner, Some(same_side)).unwrap());
        let results = HashJoinImplementationRule::new()
            .transform(&non_equi, &mut ctx)
            .unwrap();
        assert!(results.is_empty());

        let cross = f.join(Join::new_cross());
        assert!(HashJoinImplementationRule::new()
            .transform(&cross, &mut ctx)
            .unwrap()
            .is_empty());
        let results = NestLoopJoinImplementationRule::new()
            .transform(&cross, &mut ctx)
            .unwrap();
        assert_eq!(
            OperatorKind::PhysicalNestLoopJoin,
            results[0].operator().kind()
        );
        assert_eq!(2, results[0].arity());
    }
}
