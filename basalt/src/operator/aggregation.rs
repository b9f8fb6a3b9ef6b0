use std::fmt::Formatter;
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use log::error;
use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::column::ColumnRefSet;
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::{DisplayFields, OperatorBase, OperatorKind, OperatorTrait, PlanningMeta};
use crate::plan::ExpressionContext;
use crate::scalar::{CallOperator, ColumnRefOperator, ScalarOperator};

/// Stage of an aggregation in a multi stage pipeline.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AggType {
    Local,
    Global,
    DistinctGlobal,
    DistinctLocal,
}

/// Output column to aggregate call mapping.
///
/// Iteration follows insertion order, which drives the order of generated outputs and the
/// meaning of positions such as the single distinct function position. Equality and hashing
/// have map semantics and ignore order.
#[derive(Clone, Debug, Default)]
pub struct AggregateMap {
    entries: Vec<(ColumnRefOperator, CallOperator)>,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing the call of an existing key in place.
    pub fn insert(&mut self, column: ColumnRefOperator, call: CallOperator) {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = call,
            None => self.entries.push((column, call)),
        }
    }

    pub fn get(&self, column: &ColumnRefOperator) -> Option<&CallOperator> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, call)| call)
    }

    pub fn entry_at(&self, pos: usize) -> Option<(&ColumnRefOperator, &CallOperator)> {
        self.entries.get(pos).map(|(c, call)| (c, call))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRefOperator, &CallOperator)> {
        self.entries.iter().map(|(c, call)| (c, call))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnRefOperator> {
        self.entries.iter().map(|(c, _)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns used by the arguments of all calls.
    pub fn used_columns(&self) -> ColumnRefSet {
        let mut columns = ColumnRefSet::new();
        for (_, call) in &self.entries {
            for arg in call.args() {
                columns.union(&arg.used_columns());
            }
        }
        columns
    }
}

impl FromIterator<(ColumnRefOperator, CallOperator)> for AggregateMap {
    fn from_iter<T: IntoIterator<Item = (ColumnRefOperator, CallOperator)>>(iter: T) -> Self {
        let mut map = AggregateMap::new();
        for (column, call) in iter {
            map.insert(column, call);
        }
        map
    }
}

impl PartialEq for AggregateMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(column, call)| other.get(column) == Some(call))
    }
}

impl Eq for AggregateMap {}

impl Hash for AggregateMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.len().hash(state);
        for (column, call) in self.entries.iter().sorted_by_key(|(c, _)| c.id()) {
            column.hash(state);
            call.hash(state);
        }
    }
}

#[derive(Clone, Debug, Default)]
struct AggregationPlanningState {
    /// Same as grouping keys, except for stages produced by single distinct splitting.
    partition_by_columns: Vec<ColumnRefOperator>,
    /// Already rewritten into a multi stage pipeline.
    split: bool,
    /// Position of the lone distinct aggregate in the mapping. On split stages it marks the call
    /// updating raw deduplicated values, every other call merges partial states.
    single_distinct_function_pos: Option<usize>,
}

/// Logical aggregation operator.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Aggregation {
    base: OperatorBase,
    agg_type: AggType,
    grouping_keys: Vec<ColumnRefOperator>,
    aggregations: AggregateMap,
    planning: PlanningMeta<AggregationPlanningState>,
}

impl Aggregation {
    pub fn new(
        agg_type: AggType,
        grouping_keys: Vec<ColumnRefOperator>,
        aggregations: AggregateMap,
    ) -> Self {
        let planning = AggregationPlanningState {
            partition_by_columns: grouping_keys.clone(),
            split: false,
            single_distinct_function_pos: None,
        };
        Self {
            base: OperatorBase::default(),
            agg_type,
            grouping_keys,
            aggregations,
            planning: PlanningMeta::new(planning),
        }
    }

    pub fn with_partition_by_columns(mut self, columns: Vec<ColumnRefOperator>) -> Self {
        self.planning.partition_by_columns = columns;
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

    /// Replaces the aggregate mapping.
    ///
    /// A single distinct position recorded earlier must still point at a distinct call.
    pub fn with_aggregations(mut self, aggregations: AggregateMap) -> BasaltResult<Self> {
        self.aggregations = aggregations;
        if let Some(pos) = self.planning.single_distinct_function_pos {
            self.check_single_distinct_pos(pos)?;
        }
        Ok(self)
    }

    pub fn agg_type(&self) -> AggType {
        self.agg_type
    }

    pub fn grouping_keys(&self) -> &[ColumnRefOperator] {
        &self.grouping_keys
    }

    pub fn aggregations(&self) -> &AggregateMap {
        &self.aggregations
    }

    pub fn partition_by_columns(&self) -> &[ColumnRefOperator] {
        &self.planning.partition_by_columns
    }

    pub fn is_split(&self) -> bool {
        self.planning.split
    }

    /// Marks this node as rewritten into a multi stage pipeline.
    pub fn set_split(&mut self) {
        self.planning.split = true;
    }

    pub fn single_distinct_function_pos(&self) -> Option<usize> {
        self.planning.single_distinct_function_pos
    }

    pub fn set_single_distinct_function_pos(&mut self, pos: usize) -> BasaltResult<()> {
        self.check_single_distinct_pos(pos)?;
        self.planning.single_distinct_function_pos = Some(pos);
        Ok(())
    }

    fn check_single_distinct_pos(&self, pos: usize) -> BasaltResult<()> {
        match self.aggregations.entry_at(pos) {
            Some((_, call)) if call.is_distinct() || self.planning.split => Ok(()),
            _ => {
                let detail = format!(
                    "single distinct function position {} doesn't point at a distinct call of {} \
                     aggregations",
                    pos,
                    self.aggregations.len()
                );
                error!("{}", detail);
                Err(OptimizerError::InvariantViolation {
                    kind: OperatorKind::LogicalAggregation,
                    detail,
                }
                .into())
            }
        }
    }
}

impl OperatorTrait for Aggregation {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, _ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        let mut columns = ColumnRefSet::with_columns(&self.grouping_keys);
        columns.union_columns(self.aggregations.keys());
        Ok(columns)
    }
}

impl DisplayFields for Aggregation {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("type", &format_args!("{}", self.agg_type))
            .field(
                "group_by",
                &format_args!("[{}]", self.grouping_keys.iter().join(", ")),
            )
            .field(
                "aggregations",
                &format_args!(
                    "[{}]",
                    self.aggregations
                        .iter()
                        .map(|(c, call)| format!("{} = {}", c, call))
                        .join(", ")
                ),
            );
        self.base.display_fields(&mut s);
        s.finish()
    }
}

/// Hash aggregation, the physical form of every aggregation stage.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct HashAggregate(Aggregation);

impl HashAggregate {
    pub fn new(aggregation: Aggregation) -> Self {
        Self(aggregation)
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.0
    }
}

impl OperatorTrait for HashAggregate {
    fn base(&self) -> &OperatorBase {
        self.0.base()
    }

    fn output_columns(&self, ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        self.0.output_columns(ctx)
    }
}

impl DisplayFields for HashAggregate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.display(f)
    }
}
