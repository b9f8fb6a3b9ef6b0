//! Read only table metadata.
//!
//! Tables are owned by the metadata service of the database and handed to the planner as an
//! immutable snapshot. Scans hold a [`TableRef`] and expose accessors, the planner never mutates
//! or constructs table metadata itself.
mod table;
pub use table::*;

use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;

use crate::error::{BasaltResult, OptimizerError};

/// Table lookup by name.
pub trait Catalog: Debug + Send + Sync {
    fn table(&self, name: &str) -> Option<TableRef>;

    fn table_names(&self) -> Vec<String>;

    fn table_or_err(&self, name: &str) -> BasaltResult<TableRef> {
        self.table(name)
            .ok_or_else(|| OptimizerError::TableNotFound(name.to_string()).into())
    }
}

/// In memory catalog snapshot.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    tables: HashMap<String, TableRef>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table, returning the previous table with the same name if any.
    pub fn register_table(&mut self, table: OlapTable) -> Option<TableRef> {
        debug!("Registering table {} with id {}", table.name(), table.id());
        self.tables
            .insert(table.name().to_string(), TableRef::new(table))
    }
}

impl Catalog for MemoryCatalog {
    fn table(&self, name: &str) -> Option<TableRef> {
        self.tables.get(name).cloned()
    }

    fn table_names(&self) -> Vec<String> {
        let mut names = self.tables.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use crate::catalog::{Catalog, ColumnMeta, MemoryCatalog, OlapTable, TableId};
    use crate::error::OptimizerError;

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = MemoryCatalog::new();
        let table = OlapTable::new(
            TableId::from(10),
            "t1",
            vec![ColumnMeta::new("c1", DataType::Int32, false)],
        );
        assert!(catalog.register_table(table).is_none());

        let t1 = catalog.table_or_err("t1").unwrap();
        assert_eq!(TableId::from(10), t1.id());
        assert_eq!(vec!["t1".to_string()], catalog.table_names());

        let err = catalog.table_or_err("t2").unwrap_err();
        assert_eq!(
            Some(&OptimizerError::TableNotFound("t2".to_string())),
            err.downcast_ref::<OptimizerError>()
        );
    }
}
