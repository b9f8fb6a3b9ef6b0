use arrow_schema::DataType;

use crate::column::{ColumnId, ColumnRefSet};
use crate::error::{BasaltResult, OptimizerError};
use crate::scalar::ColumnRefOperator;

/// Allocates column ids for one planning session.
///
/// Ids are handed out sequentially starting from 1. The factory is owned by the
/// [`OptimizerContext`](crate::optimizer::OptimizerContext) of a single query and is never
/// shared, so allocation is a plain counter.
#[derive(Debug, Default, Clone)]
pub struct ColumnRefFactory {
    columns: Vec<ColumnRefOperator>,
}

impl ColumnRefFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<S: Into<String>>(
        &mut self,
        name: S,
        data_type: DataType,
        nullable: bool,
    ) -> ColumnRefOperator {
        let id = ColumnId::new(self.columns.len() as u32 + 1);
        let column = ColumnRefOperator::new(id, name, data_type, nullable);
        self.columns.push(column.clone());
        column
    }

    pub fn get(&self, id: ColumnId) -> BasaltResult<&ColumnRefOperator> {
        id.as_usize()
            .checked_sub(1)
            .and_then(|idx| self.columns.get(idx))
            .ok_or_else(|| OptimizerError::UnknownColumnId(id).into())
    }

    /// Resolves every id of `set`, in ascending id order.
    pub fn column_refs(&self, set: &ColumnRefSet) -> BasaltResult<Vec<ColumnRefOperator>> {
        set.iter().map(|id| self.get(id).cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
