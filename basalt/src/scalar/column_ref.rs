use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use arrow_schema::DataType;

use crate::column::ColumnId;

/// Leaf scalar operator naming one column.
///
/// Equality, ordering and hashing only look at the id. Name and type are carried for
/// diagnostics and downstream plan generation.
#[derive(Clone, Debug)]
pub struct ColumnRefOperator {
    id: ColumnId,
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl ColumnRefOperator {
    pub fn new<S: Into<String>>(
        id: ColumnId,
        name: S,
        data_type: DataType,
        nullable: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

impl PartialEq for ColumnRefOperator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ColumnRefOperator {}

impl Hash for ColumnRefOperator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialOrd for ColumnRefOperator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ColumnRefOperator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for ColumnRefOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.name)
    }
}
