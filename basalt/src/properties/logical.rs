use crate::column::ColumnRefSet;

/// Derived, never stored as ground truth on an operator.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LogicalProperty {
    output_columns: ColumnRefSet,
}

impl LogicalProperty {
    pub fn new(output_columns: ColumnRefSet) -> Self {
        Self { output_columns }
    }

    pub fn output_columns(&self) -> &ColumnRefSet {
        &self.output_columns
    }
}
