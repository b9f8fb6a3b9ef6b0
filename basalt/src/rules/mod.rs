//! Optimization rules.
//!
//! A rule defines an equivalent transformation of a plan. There are three kinds of rules:
//!
//! 1. Rewrite rule. It produces a transformation which is assumed to be better than the original
//! plan, e.g. [`PushDownJoinOnClauseRule`] which moves single side conjuncts below a join.
//! 2. Exploration rule. It produces an equivalent alternative logical plan used while exploring
//! the plan space, e.g. [`JoinCommutativityRule`] which swaps the inputs of an inner join.
//! 3. Implementation rule. It binds a logical operator to a physical execution strategy, e.g.
//! [`OlapScanImplementationRule`].
//!
//! ## Pattern
//!
//! A [`Pattern`] defines which expression shape a rule operates on. The driver matches the
//! pattern before invoking the rule, so the rule body only deals with shapes it understands:
//!
//! ```no
//! static ref PUSH_DOWN_JOIN_ON_CLAUSE_PATTERN: Pattern = {
//!     pattern(OperatorKind::LogicalJoin)
//!         .leaf(ANY)
//!         .leaf(ANY)
//!     .build()
//! };
//! ```
//!
//! A rule which matched may still decline at runtime, e.g. the join on clause was already
//! pushed down. Declining leaves the [`RuleResult`] empty and is not an error.
//!
//! Rules never modify their input. They build new [`OptExpression`]s, sharing inputs which are
//! not rewritten, and the driver decides how to install them: replacing nodes of a tree in the
//! heuristic driver, or adding expressions to a memo in a cost based driver.
mod pattern;
pub use pattern::*;
mod registry;
pub use registry::*;
mod aggregate;
pub use aggregate::*;
mod join;
pub use join::*;
mod scan;
pub use scan::*;
mod implementation;
pub use implementation::*;

use std::fmt::{Debug, Formatter};

use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use smallvec::SmallVec;
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::error::{BasaltResult, OptimizerError};
use crate::optimizer::OptimizerContext;
use crate::plan::OptExpression;

/// Expressions produced by one rule application, usually zero to two.
#[derive(Default)]
pub struct RuleResult {
    exprs: SmallVec<[OptExpression; 2]>,
}

impl RuleResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, new_expr: OptExpression) {
        self.exprs.push(new_expr);
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn results(self) -> impl Iterator<Item = OptExpression> {
        self.exprs.into_iter()
    }
}

/// A rule should only focus on providing equivalent transformations of optimizer expressions.
#[enum_dispatch(RuleImpl)]
pub trait Rule {
    /// Apply a rule to a matched expression.
    fn apply(
        &self,
        input: &OptExpression,
        ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()>;

    /// Pattern for rule.
    fn pattern(&self) -> &Pattern;

    /// Use to identify each rule.
    ///
    /// This is used to avoid applying same rule repeatedly to same expression.
    fn rule_type(&self) -> RuleType;

    /// Use to identify applying order of rules.
    fn rule_promise(&self) -> RulePromise;

    /// Checks the pattern and applies the rule, returning the produced expressions.
    fn transform(
        &self,
        input: &OptExpression,
        ctx: &mut OptimizerContext,
    ) -> BasaltResult<Vec<OptExpression>> {
        if !self.pattern().matches(input) {
            return Err(OptimizerError::PatternMismatch {
                rule: self.rule_type().to_string(),
            }
            .into());
        }

        let mut result = RuleResult::new();
        self.apply(input, ctx, &mut result)?;
        Ok(result.results().collect())
    }
}

#[enum_dispatch]
#[derive(Clone, AsRefStr)]
pub enum RuleImpl {
    // Rewrite rules
    PushDownJoinOnClauseRule,
    PruneJoinColumnsRule,
    DistinctAggregationDetectionRule,
    SplitAggregateRule,

    // Exploring rules
    JoinCommutativityRule,

    // Implementation rules
    OlapScanImplementationRule,
    HashJoinImplementationRule,
    NestLoopJoinImplementationRule,
    HashAggImplementationRule,
    ProjectImplementationRule,
    FilterImplementationRule,
    UnionImplementationRule,
}

impl Debug for RuleImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_ref())
    }
}

/// Unique tag of every rule. Its string form is used in session variables.
#[derive(EnumSetType, Debug, Hash, AsRefStr, StrumDisplay, EnumString, EnumIter)]
pub enum RuleType {
    // Rewrite rules
    PushDownJoinOnClause,
    PruneJoinColumns,
    DistinctAggregationDetection,
    SplitAggregate,

    // Exploring rules
    JoinCommutativity,

    // Implementation rules
    ImplementOlapScan,
    ImplementHashJoin,
    ImplementNestLoopJoin,
    ImplementHashAggregate,
    ImplementProject,
    ImplementFilter,
    ImplementUnion,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, StrumDisplay)]
pub enum RuleCategory {
    Rewrite,
    Exploration,
    Implementation,
}

impl RuleType {
    pub fn category(self) -> RuleCategory {
        match self {
            RuleType::PushDownJoinOnClause
            | RuleType::PruneJoinColumns
            | RuleType::DistinctAggregationDetection
            | RuleType::SplitAggregate => RuleCategory::Rewrite,
            RuleType::JoinCommutativity => RuleCategory::Exploration,
            RuleType::ImplementOlapScan
            | RuleType::ImplementHashJoin
            | RuleType::ImplementNestLoopJoin
            | RuleType::ImplementHashAggregate
            | RuleType::ImplementProject
            | RuleType::ImplementFilter
            | RuleType::ImplementUnion => RuleCategory::Implementation,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StrumDisplay)]
pub enum RulePromise {
    Low = 1,
    Medium = 2,
    High = 3,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::error::OptimizerError;
    use crate::operator::{Join, LogicalOperator};
    use crate::plan::OptExpression;
    use crate::rules::{
        JoinCommutativityRule, OlapScanImplementationRule, Rule, RuleCategory, RuleImpl, RuleType,
    };
    use crate::test_utils::test_context;

    #[test]
    fn test_rule_debug() {
        assert_eq!(
            "\"JoinCommutativityRule\"",
            format!("{:?}", RuleImpl::from(JoinCommutativityRule::new()))
        );
    }

    #[test]
    fn test_rule_type_names() {
        assert_eq!(
            RuleType::SplitAggregate,
            RuleType::from_str("SplitAggregate").unwrap()
        );
        assert_eq!("ImplementOlapScan", RuleType::ImplementOlapScan.as_ref());
        assert_eq!(RuleCategory::Exploration, RuleType::JoinCommutativity.category());
        assert!(RuleType::from_str("Unknown").is_err());
    }

    #[test]
    fn test_transform_checks_pattern() {
        let mut ctx = test_context();
        let join = OptExpression::with_operator(LogicalOperator::from(Join::new_cross()), vec![]);

        let err = OlapScanImplementationRule::new()
            .transform(&join, &mut ctx)
            .unwrap_err();
        assert_eq!(
            Some(&OptimizerError::PatternMismatch {
                rule: "ImplementOlapScan".to_string()
            }),
            err.downcast_ref::<OptimizerError>()
        );
    }
}
