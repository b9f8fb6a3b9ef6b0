use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use enumset::EnumSet;
use log::debug;
use prettytable::Table;

use crate::error::BasaltResult;
use crate::operator::OperatorKind;
use crate::optimizer::SessionVariables;
use crate::rules::{
    DistinctAggregationDetectionRule, FilterImplementationRule, HashAggImplementationRule,
    HashJoinImplementationRule, JoinCommutativityRule, NestLoopJoinImplementationRule,
    OlapScanImplementationRule, ProjectImplementationRule, PruneJoinColumnsRule,
    PushDownJoinOnClauseRule, Rule, RuleCategory, RuleImpl, RuleType, SplitAggregateRule,
    UnionImplementationRule,
};

/// Rules grouped by the operator kind of their pattern root.
///
/// A driver looks up candidates of a node with [`RuleSet::rules_for_operator_kind`], rules with
/// a wildcard root apply to every kind. Within one kind, rules keep registration order.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules_by_kind: HashMap<OperatorKind, Vec<RuleImpl>>,
    wildcard_rules: Vec<RuleImpl>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rules of this crate, ordered by promise within each operator kind.
    pub fn with_default_rules() -> Self {
        Self::with_disabled_rules(EnumSet::empty())
    }

    /// Default rules except those disabled by `session`.
    pub fn from_session(session: &SessionVariables) -> BasaltResult<Self> {
        Ok(Self::with_disabled_rules(session.disabled_rule_types()?))
    }

    fn with_disabled_rules(disabled: EnumSet<RuleType>) -> Self {
        let mut rules: Vec<RuleImpl> = vec![
            PushDownJoinOnClauseRule::new().into(),
            PruneJoinColumnsRule::new().into(),
            DistinctAggregationDetectionRule::new().into(),
            SplitAggregateRule::new().into(),
            JoinCommutativityRule::new().into(),
            OlapScanImplementationRule::new().into(),
            HashJoinImplementationRule::new().into(),
            NestLoopJoinImplementationRule::new().into(),
            HashAggImplementationRule::new().into(),
            ProjectImplementationRule::new().into(),
            FilterImplementationRule::new().into(),
            UnionImplementationRule::new().into(),
        ];
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.rule_promise()));

        let mut rule_set = RuleSet::new();
        for rule in rules {
            if disabled.contains(rule.rule_type()) {
                debug!("Rule {} is disabled", rule.rule_type());
                continue;
            }
            rule_set.register(rule);
        }
        rule_set
    }

    pub fn register<R: Into<RuleImpl>>(&mut self, rule: R) {
        let rule = rule.into();
        debug!(
            "Registering rule {} with pattern {}",
            rule.rule_type(),
            rule.pattern()
        );
        match rule.pattern().root_kind() {
            Some(kind) => self.rules_by_kind.entry(kind).or_default().push(rule),
            None => self.wildcard_rules.push(rule),
        }
    }

    /// Rules whose pattern root can match an operator of `kind`.
    pub fn rules_for_operator_kind(&self, kind: OperatorKind) -> impl Iterator<Item = &RuleImpl> {
        self.rules_by_kind
            .get(&kind)
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
            .iter()
            .chain(self.wildcard_rules.iter())
    }

    /// Rules of `category` for `kind`.
    pub fn rules_of_category(
        &self,
        kind: OperatorKind,
        category: RuleCategory,
    ) -> impl Iterator<Item = &RuleImpl> {
        self.rules_for_operator_kind(kind)
            .filter(move |rule| rule.rule_type().category() == category)
    }

    pub fn len(&self) -> usize {
        self.rules_by_kind.values().map(Vec::len).sum::<usize>() + self.wildcard_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for RuleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.add_row(row!["Operator", "Rule", "Category", "Promise"]);

        let mut kinds = self.rules_by_kind.keys().copied().collect::<Vec<_>>();
        kinds.sort_by_key(|kind| kind.as_ref().to_string());
        for kind in kinds {
            for rule in &self.rules_by_kind[&kind] {
                table.add_row(row![
                    kind,
                    rule.rule_type(),
                    rule.rule_type().category(),
                    rule.rule_promise()
                ]);
            }
        }
        for rule in &self.wildcard_rules {
            table.add_row(row![
                "*",
                rule.rule_type(),
                rule.rule_type().category(),
                rule.rule_promise()
            ]);
        }

        write!(f, "{}", table)
    }
}
