use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::ensure;
use log::{debug, error, trace};

use crate::error::{BasaltResult, OptimizerError};
use crate::heuristic::required_columns;
use crate::optimizer::OptimizerContext;
use crate::plan::{explain_to_string, validate, OptExpression, OptExpressionRef};
use crate::rules::{Rule, RuleCategory, RuleImpl, RuleResult, RuleSet, RuleType};

/// Match order of plan tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchOrder {
    BottomUp,
    TopDown,
}

/// Identity of a plan node, as opposed to the structural equality of [`OptExpression`].
///
/// Holding the node keeps its address from being reused while the key is alive.
#[derive(Clone)]
struct NodeKey(OptExpressionRef);

impl PartialEq for NodeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

pub struct HepOptimizer {
    match_order: MatchOrder,
    /// Max number of iteration
    max_iter_times: usize,
    rules: RuleSet,
    context: OptimizerContext,
    applied: HashSet<(NodeKey, RuleType)>,
}

impl HepOptimizer {
    pub fn new(rules: RuleSet, context: OptimizerContext) -> Self {
        Self {
            match_order: MatchOrder::TopDown,
            max_iter_times: context.session().max_rewrite_iterations,
            rules,
            context,
            applied: HashSet::new(),
        }
    }

    pub fn with_match_order(mut self, match_order: MatchOrder) -> Self {
        self.match_order = match_order;
        self
    }

    pub fn context(&self) -> &OptimizerContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut OptimizerContext {
        &mut self.context
    }

    pub fn into_context(self) -> OptimizerContext {
        self.context
    }

    /// Validates, rewrites and implements `plan`.
    pub fn optimize(&mut self, plan: OptExpressionRef) -> BasaltResult<OptExpressionRef> {
        validate(&plan)?;
        self.context.set_required_columns(required_columns(&plan)?);

        let plan = self.rewrite(plan)?;
        let plan = self.implement(&plan)?;
        debug!("Optimized plan:\n{}", explain_to_string(&plan)?);
        Ok(plan)
    }

    /// Applies rewrite rules until the plan no longer changes or iterations run out.
    ///
    /// Each successful application counts as one iteration.
    pub fn rewrite(&mut self, plan: OptExpressionRef) -> BasaltResult<OptExpressionRef> {
        let mut plan = plan;
        for times in 0..self.max_iter_times {
            match self.apply_once(&plan)? {
                Some(new_plan) => {
                    debug!("Plan after iteration {}:\n{}", times, explain_to_string(&new_plan)?);
                    plan = new_plan;
                }
                None => {
                    debug!("Reached fixed point after {} iterations", times);
                    return Ok(plan);
                }
            }
        }

        debug!("Stop rewriting after {} iterations", self.max_iter_times);
        Ok(plan)
    }

    /// Replaces every logical operator of `plan` with its first physical alternative, inputs
    /// first.
    pub fn implement(&mut self, plan: &OptExpressionRef) -> BasaltResult<OptExpressionRef> {
        let inputs = plan
            .inputs()
            .iter()
            .map(|input| self.implement(input))
            .collect::<BasaltResult<Vec<OptExpressionRef>>>()?;
        let expr = OptExpression::with_operator(plan.operator().clone(), inputs);
        if !expr.operator().is_logical() {
            return Ok(Arc::new(expr));
        }

        let kind = expr.operator().kind();
        let rules = self
            .rules
            .rules_of_category(kind, RuleCategory::Implementation)
            .cloned()
            .collect::<Vec<RuleImpl>>();
        for rule in rules {
            if !rule.pattern().matches(&expr) {
                continue;
            }
            trace!("Trying to implement {} with rule {:?}", kind, rule);
            let mut results = RuleResult::new();
            rule.apply(&expr, &mut self.context, &mut results)?;
            if let Some(physical) = results.results().next() {
                debug!("Implemented {} as {}", kind, physical.operator().kind());
                return Ok(Arc::new(physical));
            }
        }

        error!("No implementation rule applies to {}", kind);
        Err(OptimizerError::InvariantViolation {
            kind,
            detail: "no implementation rule applies".to_string(),
        }
        .into())
    }

    /// Rewrites the first node in match order some rule applies to.
    ///
    /// # Return
    ///
    /// The new plan if a rule applied, otherwise `None`.
    fn apply_once(&mut self, expr: &OptExpressionRef) -> BasaltResult<Option<OptExpressionRef>> {
        if self.match_order == MatchOrder::TopDown {
            if let Some(new_expr) = self.apply_rules(expr)? {
                return Ok(Some(new_expr));
            }
        }

        for (idx, input) in expr.inputs().iter().enumerate() {
            if let Some(new_input) = self.apply_once(input)? {
                let mut inputs = expr.inputs().to_vec();
                inputs[idx] = new_input;
                return Ok(Some(Arc::new(OptExpression::with_operator(
                    expr.operator().clone(),
                    inputs,
                ))));
            }
        }

        if self.match_order == MatchOrder::BottomUp {
            return self.apply_rules(expr);
        }
        Ok(None)
    }

    fn apply_rules(&mut self, expr: &OptExpressionRef) -> BasaltResult<Option<OptExpressionRef>> {
        let rules = self
            .rules
            .rules_of_category(expr.operator().kind(), RuleCategory::Rewrite)
            .cloned()
            .collect::<Vec<RuleImpl>>();

        for rule in rules {
            let key = (NodeKey(expr.clone()), rule.rule_type());
            if self.applied.contains(&key) || !rule.pattern().matches(expr) {
                continue;
            }

            trace!(
                "Trying to apply rule {:?} to expression {}",
                rule,
                expr.operator()
            );
            let mut results = RuleResult::new();
            rule.apply(expr, &mut self.context, &mut results)?;
            self.applied.insert(key);

            ensure!(
                results.len() <= 1,
                "Rewrite rule {:?} should not return more than 1 result",
                rule
            );
            if let Some(new_expr) = results.results().next() {
                debug!("Applied rule {:?} to {}", rule, expr.operator());
                return Ok(Some(Arc::new(new_expr)));
            }
            trace!("Skipped applying rule {:?}", rule);
        }
        Ok(None)
    }
}
