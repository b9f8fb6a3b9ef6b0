use std::sync::Arc;

use log::debug;

use crate::error::{BasaltResult, OptimizerError};
use crate::operator::LogicalOperator::LogicalAggregation;
use crate::operator::Operator::Logical;
use crate::operator::PhysicalOperator::PhysicalHashAggregate;
use crate::operator::{
    AggType, AggregateMap, Aggregation, HashAggregate, OperatorKind, OperatorTrait,
};
use crate::optimizer::OptimizerContext;
use crate::plan::{OptExpression, OptExpressionRef};
use crate::rules::{pattern, Pattern, Rule, RulePromise, RuleResult, RuleType, ANY};
use crate::scalar::{CallOperator, ColumnRefOperator, ScalarOperator};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref AGGREGATION_PATTERN: Pattern = {
        Pattern::new_leaf(OperatorKind::LogicalAggregation)
    };
    static ref UNARY_AGGREGATION_PATTERN: Pattern = {
        pattern(OperatorKind::LogicalAggregation)
            .leaf(ANY)
        .build()
    };
}

fn aggregation_of<'a>(
    input: &'a OptExpression,
    rule_type: RuleType,
) -> BasaltResult<&'a Aggregation> {
    match input.operator() {
        Logical(LogicalAggregation(aggregation)) => Ok(aggregation),
        _ => Err(OptimizerError::PatternMismatch {
            rule: rule_type.to_string(),
        }
        .into()),
    }
}

/// Marks the position of a lone distinct aggregate over a single column.
///
/// `count(distinct c)` next to any number of non distinct aggregates qualifies, two distinct
/// aggregates or a distinct aggregate over an expression don't.
#[derive(Clone)]
pub struct DistinctAggregationDetectionRule {}

impl DistinctAggregationDetectionRule {
    pub fn new() -> Self {
        Self {}
    }

    fn single_distinct_pos(aggregations: &AggregateMap) -> Option<usize> {
        let mut distinct = aggregations
            .iter()
            .enumerate()
            .filter(|(_, (_, call))| call.is_distinct());
        match (distinct.next(), distinct.next()) {
            (Some((pos, (_, call))), None)
                if matches!(call.args(), [ScalarOperator::ColumnRef(_)]) =>
            {
                Some(pos)
            }
            _ => None,
        }
    }
}

impl Rule for DistinctAggregationDetectionRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let aggregation = aggregation_of(input, self.rule_type())?;
        if aggregation.is_split() || aggregation.single_distinct_function_pos().is_some() {
            debug!("Single distinct function already detected");
            return Ok(());
        }

        match Self::single_distinct_pos(aggregation.aggregations()) {
            Some(pos) => {
                debug!("Found single distinct function at {}", pos);
                let mut new_aggregation = aggregation.clone();
                new_aggregation.set_single_distinct_function_pos(pos)?;
                result.add(input.clone_with_operator(LogicalAggregation(new_aggregation)));
            }
            None => debug!("No single distinct function found"),
        }
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &AGGREGATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::DistinctAggregationDetection
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}

/// Splits a global aggregation into a multi stage pipeline.
///
/// Without a single distinct function, the aggregation becomes a local stage updating partial
/// states below a global stage merging them:
///
/// ```no
/// Global(keys, c := f(x))  =>  Global(keys, c := f(c))
///                               └─ Local(keys, c := f(x))
/// ```
///
/// With a single distinct function `d := g(distinct y)`, rows are first deduplicated on the
/// grouping keys plus `y`:
///
/// ```no
/// Global(keys, d := g(distinct y), c := f(x))
///     =>  Global(keys, d := g(y), c := f(c))
///         └─ DistinctGlobal(keys + y, c := f(c)) partitioned by keys
///            └─ Local(keys + y, c := f(x))
/// ```
///
/// Every produced stage is marked split, split aggregations are never split again.
#[derive(Clone)]
pub struct SplitAggregateRule {}

impl SplitAggregateRule {
    pub fn new() -> Self {
        Self {}
    }

    /// Merges the partial state held in the column of each entry.
    fn merge_calls<'a, I>(entries: I) -> AggregateMap
    where
        I: IntoIterator<Item = (&'a ColumnRefOperator, &'a CallOperator)>,
    {
        entries
            .into_iter()
            .map(|(column, call)| (column.clone(), call.with_args(vec![column.clone().into()])))
            .collect()
    }

    fn single_input(input: &OptExpression) -> BasaltResult<OptExpressionRef> {
        match input.inputs() {
            [child] => Ok(child.clone()),
            inputs => Err(OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalAggregation,
                detail: format!("aggregation expects one input, got {}", inputs.len()),
            }
            .into()),
        }
    }

    fn stage(mut aggregation: Aggregation, input: OptExpressionRef) -> OptExpressionRef {
        aggregation.set_split();
        Arc::new(OptExpression::with_operator(
            LogicalAggregation(aggregation),
            vec![input],
        ))
    }

    fn split_two_stage(
        aggregation: &Aggregation,
        input: &OptExpression,
    ) -> BasaltResult<OptExpression> {
        let keys = aggregation.grouping_keys().to_vec();
        let local = Aggregation::new(
            AggType::Local,
            keys.clone(),
            aggregation.aggregations().clone(),
        );
        let local = Self::stage(local, Self::single_input(input)?);

        let mut global = Aggregation::new(
            AggType::Global,
            keys,
            Self::merge_calls(aggregation.aggregations().iter()),
        )
        .with_limit(aggregation.base().limit())
        .with_predicate(aggregation.base().predicate().cloned());
        global.set_split();
        Ok(OptExpression::with_operator(
            LogicalAggregation(global),
            vec![local],
        ))
    }

    fn split_three_stage(
        aggregation: &Aggregation,
        pos: usize,
        input: &OptExpression,
    ) -> BasaltResult<OptExpression> {
        let (distinct_column, distinct_call) = aggregation
            .aggregations()
            .entry_at(pos)
            .ok_or_else(|| OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalAggregation,
                detail: format!("no aggregate at single distinct position {}", pos),
            })?;
        let distinct_arg = match distinct_call.args() {
            [ScalarOperator::ColumnRef(column)] => column.clone(),
            _ => {
                return Err(OptimizerError::InvariantViolation {
                    kind: OperatorKind::LogicalAggregation,
                    detail: format!("distinct aggregate {} isn't over one column", distinct_call),
                }
                .into())
            }
        };

        let keys = aggregation.grouping_keys().to_vec();
        let mut keys_with_distinct = keys.clone();
        if !keys_with_distinct.contains(&distinct_arg) {
            keys_with_distinct.push(distinct_arg.clone());
        }
        let others = aggregation
            .aggregations()
            .iter()
            .filter(|(column, _)| *column != distinct_column)
            .map(|(column, call)| (column.clone(), call.clone()))
            .collect::<AggregateMap>();

        let local = Aggregation::new(AggType::Local, keys_with_distinct.clone(), others.clone());
        let local = Self::stage(local, Self::single_input(input)?);

        let distinct_global = Aggregation::new(
            AggType::DistinctGlobal,
            keys_with_distinct,
            Self::merge_calls(others.iter()),
        )
        .with_partition_by_columns(keys.clone());
        let distinct_global = Self::stage(distinct_global, local);

        let global_calls = aggregation
            .aggregations()
            .iter()
            .map(|(column, call)| {
                if column == distinct_column {
                    (column.clone(), call.with_args(call.args().to_vec()))
                } else {
                    (column.clone(), call.with_args(vec![column.clone().into()]))
                }
            })
            .collect::<AggregateMap>();
        let mut global = Aggregation::new(AggType::Global, keys, global_calls)
            .with_limit(aggregation.base().limit())
            .with_predicate(aggregation.base().predicate().cloned());
        global.set_split();
        global.set_single_distinct_function_pos(pos)?;

        Ok(OptExpression::with_operator(
            LogicalAggregation(global),
            vec![distinct_global],
        ))
    }
}

impl Rule for SplitAggregateRule {
    fn apply(
        &self,
        input: &OptExpression,
        ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let aggregation = aggregation_of(input, self.rule_type())?;
        if aggregation.is_split() {
            debug!("Aggregation already split");
            return Ok(());
        }
        if aggregation.agg_type() != AggType::Global {
            debug!("Skip splitting {} aggregation", aggregation.agg_type());
            return Ok(());
        }
        if ctx.session().is_one_stage_agg() {
            debug!("One stage aggregation forced by session");
            return Ok(());
        }

        match aggregation.single_distinct_function_pos() {
            Some(pos) => {
                debug!("Split aggregation into three stages");
                result.add(Self::split_three_stage(aggregation, pos, input)?);
            }
            None if aggregation
                .aggregations()
                .iter()
                .any(|(_, call)| call.is_distinct()) =>
            {
                debug!("Distinct aggregates without single distinct position can't be split");
            }
            None => {
                debug!("Split aggregation into two stages");
                result.add(Self::split_two_stage(aggregation, input)?);
            }
        }
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &UNARY_AGGREGATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::SplitAggregate
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::Medium
    }
}

/// Implements every aggregation stage as a hash aggregation.
#[derive(Clone)]
pub struct HashAggImplementationRule {}

impl HashAggImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for HashAggImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        let aggregation = aggregation_of(input, self.rule_type())?;
        result.add(input.clone_with_operator(PhysicalHashAggregate(HashAggregate::new(
            aggregation.clone(),
        ))));
        Ok(())
    }

    fn pattern(&self) -> &Pattern {
        &AGGREGATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementHashAggregate
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use crate::operator::LogicalOperator::LogicalAggregation;
    use crate::operator::Operator::Logical;
    use crate::operator::{AggType, AggregateMap, Aggregation, OperatorKind};
    use crate::optimizer::{OptimizerContext, SessionVariables};
    use crate::plan::{LogicalPlanBuilder, OptExpression, OptExpressionRef};
    use crate::rules::{
        DistinctAggregationDetectionRule, HashAggImplementationRule, Rule, RuleResult,
        SplitAggregateRule,
    };
    use crate::error::OptimizerError;
    use crate::scalar::{CallOperator, ColumnRefOperator};
    use crate::test_utils::{olap_scan, test_context, test_context_with_session};

    fn aggregation_of(expr: &OptExpression) -> &Aggregation {
        match expr.operator() {
            Logical(LogicalAggregation(aggregation)) => aggregation,
            _ => panic!("{:?} is not an aggregation", expr.operator().kind()),
        }
    }

    fn count_distinct(column: &ColumnRefOperator) -> CallOperator {
        CallOperator::new_distinct("count", vec![column.clone().into()], DataType::Int64)
    }

    /// `select a, count(distinct c), sum(c) from t1 group by a`
    fn distinct_aggregation(
        ctx: &mut OptimizerContext,
    ) -> (OptExpressionRef, Vec<ColumnRefOperator>) {
        let (scan, columns) = olap_scan(ctx, "t1");
        let cnt = ctx.column_factory_mut().create("cnt", DataType::Int64, false);
        let sum = ctx.column_factory_mut().create("sum", DataType::Int64, true);

        let aggregations = vec![
            (cnt.clone(), count_distinct(&columns[1])),
            (
                sum.clone(),
                CallOperator::new("sum", vec![columns[1].clone().into()], DataType::Int64),
            ),
        ]
        .into_iter()
        .collect::<AggregateMap>();

        let plan = LogicalPlanBuilder::scan(scan)
            .aggregate(Aggregation::new(
                AggType::Global,
                vec![columns[0].clone()],
                aggregations,
            ))
            .build();
        (plan, vec![columns[0].clone(), columns[1].clone(), cnt, sum])
    }

    #[test]
    fn test_detect_single_distinct_function() {
        let mut ctx = test_context();
        let (plan, _) = distinct_aggregation(&mut ctx);
        assert_eq!(None, aggregation_of(&plan).single_distinct_function_pos());

        let rule = DistinctAggregationDetectionRule::new();
        let results = rule.transform(&plan, &mut ctx).unwrap();
        assert_eq!(1, results.len());
        assert_eq!(Some(0), aggregation_of(&results[0]).single_distinct_function_pos());
        // Planning state is not part of the operator's identity.
        assert_eq!(*plan, results[0]);

        assert!(rule.transform(&results[0], &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_detect_rejects_multiple_distinct_functions() {
        let mut ctx = test_context();
        let (scan, columns) = olap_scan(&mut ctx, "t1");
        let x = ctx.column_factory_mut().create("x", DataType::Int64, false);
        let y = ctx.column_factory_mut().create("y", DataType::Int64, false);
        let aggregations = vec![
            (x, count_distinct(&columns[0])),
            (y, count_distinct(&columns[1])),
        ]
        .into_iter()
        .collect::<AggregateMap>();
        let plan = LogicalPlanBuilder::scan(scan)
            .aggregate(Aggregation::new(AggType::Global, vec![], aggregations))
            .build();

        let results = DistinctAggregationDetectionRule::new()
            .transform(&plan, &mut ctx)
            .unwrap();
        assert!(results.is_empty());

        // Can't be split without knowing which distinct function to deduplicate on.
        let results = SplitAggregateRule::new().transform(&plan, &mut ctx).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_split_into_three_stages() {
        let mut ctx = test_context();
        let (plan, columns) = distinct_aggregation(&mut ctx);
        let (a, c, cnt, sum) = (&columns[0], &columns[1], &columns[2], &columns[3]);
        let detected = DistinctAggregationDetectionRule::new()
            .transform(&plan, &mut ctx)
            .unwrap()
            .remove(0);

        let rule = SplitAggregateRule::new();
        let results = rule.transform(&detected, &mut ctx).unwrap();
        assert_eq!(1, results.len());

        let global = aggregation_of(&results[0]);
        assert_eq!(AggType::Global, global.agg_type());
        assert!(global.is_split());
        assert_eq!(&[a.clone()], global.grouping_keys());
        // The deduplicated count updates raw values, the sum merges partial sums.
        assert_eq!(Some(0), global.single_distinct_function_pos());
        assert_eq!(
            Some((cnt, &CallOperator::new("count", vec![c.clone().into()], DataType::Int64))),
            global.aggregations().entry_at(0)
        );
        assert_eq!(
            Some(&CallOperator::new("count", vec![c.clone().into()], DataType::Int64)),
            global.aggregations().get(cnt)
        );
        assert_eq!(
            Some(&CallOperator::new("sum", vec![sum.clone().into()], DataType::Int64)),
            global.aggregations().get(sum)
        );
        assert_eq!(
            plan.output_columns().unwrap(),
            results[0].output_columns().unwrap()
        );

        let distinct_global = aggregation_of(&results[0][0]);
        assert_eq!(AggType::DistinctGlobal, distinct_global.agg_type());
        assert_eq!(None, distinct_global.single_distinct_function_pos());
        assert!(distinct_global.is_split());
        assert_eq!(&[a.clone(), c.clone()], distinct_global.grouping_keys());
        assert_eq!(&[a.clone()], distinct_global.partition_by_columns());
        assert_eq!(1, distinct_global.aggregations().len());

        let local = aggregation_of(&results[0][0][0]);
        assert_eq!(AggType::Local, local.agg_type());
        assert!(local.is_split());
        assert_eq!(&[a.clone(), c.clone()], local.grouping_keys());
        assert_eq!(
            Some(&CallOperator::new("sum", vec![c.clone().into()], DataType::Int64)),
            local.aggregations().get(sum)
        );
        assert_eq!(None, local.aggregations().get(cnt));
        assert_eq!(OperatorKind::LogicalOlapScan, results[0][0][0][0].operator().kind());

        // Split stages are never split again.
        assert!(rule.transform(&results[0], &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_split_into_two_stages() {
        let mut ctx = test_context();
        let (scan, columns) = olap_scan(&mut ctx, "t1");
        let sum = ctx.column_factory_mut().create("sum", DataType::Int64, true);
        let aggregations = vec![(
            sum.clone(),
            CallOperator::new("sum", vec![columns[1].clone().into()], DataType::Int64),
        )]
        .into_iter()
        .collect::<AggregateMap>();
        let plan = LogicalPlanBuilder::scan(scan)
            .aggregate(
                Aggregation::new(AggType::Global, vec![columns[0].clone()], aggregations)
                    .with_limit(Some(10)),
            )
            .build();

        let results = SplitAggregateRule::new().transform(&plan, &mut ctx).unwrap();
        assert_eq!(1, results.len());

        let global = aggregation_of(&results[0]);
        assert_eq!(AggType::Global, global.agg_type());
        assert_eq!(None, global.single_distinct_function_pos());
        assert_eq!(
            Some(&CallOperator::new("sum", vec![sum.clone().into()], DataType::Int64)),
            global.aggregations().get(&sum)
        );
        assert_eq!(
            plan.output_columns().unwrap(),
            results[0].output_columns().unwrap()
        );

        let local = aggregation_of(&results[0][0]);
        assert_eq!(AggType::Local, local.agg_type());
        assert!(local.is_split());
        assert_eq!(
            aggregation_of(&plan).aggregations(),
            local.aggregations()
        );
        assert_eq!(OperatorKind::LogicalOlapScan, results[0][0][0].operator().kind());
    }

    #[test]
    fn test_split_without_input() {
        let mut ctx = test_context();
        let (plan, _) = distinct_aggregation(&mut ctx);
        let detected = DistinctAggregationDetectionRule::new()
            .transform(&plan, &mut ctx)
            .unwrap()
            .remove(0);
        let orphan = OptExpression::with_operator(
            detected.operator().clone(),
            Vec::<OptExpressionRef>::new(),
        );

        let err = SplitAggregateRule::new()
            .transform(&orphan, &mut ctx)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizerError>(),
            Some(OptimizerError::PatternMismatch { .. })
        ));

        let mut result = RuleResult::new();
        let err = SplitAggregateRule::new()
            .apply(&orphan, &mut ctx, &mut result)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizerError>(),
            Some(OptimizerError::InvariantViolation {
                kind: OperatorKind::LogicalAggregation,
                ..
            })
        ));
    }

    #[test]
    fn test_split_declined_for_one_stage_session() {
        let session = SessionVariables {
            new_planner_agg_stage: 1,
            ..SessionVariables::default()
        };
        let mut ctx = test_context_with_session(session);
        let (plan, _) = distinct_aggregation(&mut ctx);
        let detected = DistinctAggregationDetectionRule::new()
            .transform(&plan, &mut ctx)
            .unwrap()
            .remove(0);

        let results = SplitAggregateRule::new()
            .transform(&detected, &mut ctx)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_implement_hash_aggregate() {
        let mut ctx = test_context();
        let (plan, _) = distinct_aggregation(&mut ctx);

        let results = HashAggImplementationRule::new()
            .transform(&plan, &mut ctx)
            .unwrap();
        assert_eq!(1, results.len());
        assert_eq!(
            OperatorKind::PhysicalHashAggregate,
            results[0].operator().kind()
        );
        assert_eq!(
            plan.output_columns().unwrap(),
            results[0].output_columns().unwrap()
        );
    }
}
