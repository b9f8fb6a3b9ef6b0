//! One to one implementations of operators which have a single physical strategy.
use crate::error::{BasaltResult, OptimizerError};
use crate::operator::LogicalOperator::{LogicalFilter, LogicalProject, LogicalUnion};
use crate::operator::Operator::Logical;
use crate::operator::OperatorKind;
use crate::operator::PhysicalOperator::{PhysicalFilter, PhysicalProject, PhysicalUnion};
use crate::optimizer::OptimizerContext;
use crate::plan::OptExpression;
use crate::rules::{Pattern, Rule, RulePromise, RuleResult, RuleType};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref PROJECT_IMPLEMENTATION_PATTERN: Pattern = {
        Pattern::new_leaf(OperatorKind::LogicalProject)
    };
    static ref FILTER_IMPLEMENTATION_PATTERN: Pattern = {
        Pattern::new_leaf(OperatorKind::LogicalFilter)
    };
    static ref UNION_IMPLEMENTATION_PATTERN: Pattern = {
        Pattern::new_leaf(OperatorKind::LogicalUnion)
    };
}

fn pattern_mismatch(rule_type: RuleType) -> anyhow::Error {
    OptimizerError::PatternMismatch {
        rule: rule_type.to_string(),
    }
    .into()
}

#[derive(Clone)]
pub struct ProjectImplementationRule {}

impl ProjectImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for ProjectImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        match input.operator() {
            Logical(LogicalProject(project)) => {
                result.add(input.clone_with_operator(PhysicalProject(project.clone())));
                Ok(())
            }
            _ => Err(pattern_mismatch(self.rule_type())),
        }
    }

    fn pattern(&self) -> &Pattern {
        &PROJECT_IMPLEMENTATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementProject
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}

#[derive(Clone)]
pub struct FilterImplementationRule {}

impl FilterImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for FilterImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        match input.operator() {
            Logical(LogicalFilter(filter)) => {
                result.add(input.clone_with_operator(PhysicalFilter(filter.clone())));
                Ok(())
            }
            _ => Err(pattern_mismatch(self.rule_type())),
        }
    }

    fn pattern(&self) -> &Pattern {
        &FILTER_IMPLEMENTATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementFilter
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}

#[derive(Clone)]
pub struct UnionImplementationRule {}

impl UnionImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for UnionImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        match input.operator() {
            Logical(LogicalUnion(union)) => {
                result.add(input.clone_with_operator(PhysicalUnion(union.clone())));
                Ok(())
            }
            _ => Err(pattern_mismatch(self.rule_type())),
        }
    }

    fn pattern(&self) -> &Pattern {
        &UNION_IMPLEMENTATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementUnion
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}
