use std::fmt::DebugStruct;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

use crate::column::ColumnRefSet;
use crate::scalar::ScalarOperator;

/// Fields every operator carries.
///
/// The predicate is applied after the operator's own semantics, and may only reference columns
/// the operator or its inputs produce.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Default)]
pub struct OperatorBase {
    limit: Option<u64>,
    predicate: Option<ScalarOperator>,
}

impl OperatorBase {
    pub fn new(limit: Option<u64>, predicate: Option<ScalarOperator>) -> Self {
        Self { limit, predicate }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn predicate(&self) -> Option<&ScalarOperator> {
        self.predicate.as_ref()
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    pub fn set_predicate(&mut self, predicate: Option<ScalarOperator>) {
        self.predicate = predicate;
    }

    pub fn predicate_used_columns(&self) -> ColumnRefSet {
        self.predicate
            .as_ref()
            .map(|p| p.used_columns())
            .unwrap_or_default()
    }

    pub(super) fn display_fields(&self, s: &mut DebugStruct) {
        if let Some(predicate) = &self.predicate {
            s.field("predicate", &format_args!("{}", predicate));
        }
        if let Some(limit) = self.limit {
            s.field("limit", &limit);
        }
    }
}

/// Planning state attached to an operator.
///
/// Compares equal to any other value and hashes to nothing, so that operators differing only in
/// planning state are the same operator for memoization.
#[derive(Clone, Debug, Default)]
pub struct PlanningMeta<T>(T);

impl<T> PlanningMeta<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> PartialEq for PlanningMeta<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for PlanningMeta<T> {}

impl<T> Hash for PlanningMeta<T> {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl<T> Deref for PlanningMeta<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for PlanningMeta<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
