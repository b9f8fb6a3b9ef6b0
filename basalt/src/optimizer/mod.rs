//! Per query optimizer state.
//!
//! An [`OptimizerContext`] is created for one planning session and owned by the thread driving
//! it. Rules receive it mutably, it is never shared between queries.
mod session;
pub use session::*;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::catalog::{Catalog, MemoryCatalog};
use crate::column::{ColumnRefFactory, ColumnRefSet};
use crate::error::BasaltResult;
use crate::operator::OlapScan;

/// Context for optimization. Includes access to catalog, column allocation and session
/// variables.
pub struct OptimizerContext {
    catalog: Arc<dyn Catalog>,
    column_factory: ColumnRefFactory,
    session: SessionVariables,
    /// Columns which must stay visible above the node being rewritten.
    required_columns: ColumnRefSet,
}

impl OptimizerContext {
    pub fn new(catalog: Arc<dyn Catalog>, session: SessionVariables) -> BasaltResult<Self> {
        session.validate()?;
        Ok(Self {
            catalog,
            column_factory: ColumnRefFactory::new(),
            session,
            required_columns: ColumnRefSet::new(),
        })
    }

    pub fn catalog(&self) -> &dyn Catalog {
        &*self.catalog
    }

    pub fn column_factory(&self) -> &ColumnRefFactory {
        &self.column_factory
    }

    pub fn column_factory_mut(&mut self) -> &mut ColumnRefFactory {
        &mut self.column_factory
    }

    pub fn session(&self) -> &SessionVariables {
        &self.session
    }

    pub fn required_columns(&self) -> &ColumnRefSet {
        &self.required_columns
    }

    pub fn set_required_columns(&mut self, columns: ColumnRefSet) {
        self.required_columns = columns;
    }

    pub fn add_required_columns(&mut self, columns: &ColumnRefSet) {
        self.required_columns.union(columns);
    }

    /// Creates a scan over every column of table `name`.
    pub fn new_olap_scan(&mut self, name: &str) -> BasaltResult<OlapScan> {
        let table = self.catalog.table_or_err(name)?;
        Ok(OlapScan::from_table(table, &mut self.column_factory))
    }
}

impl Default for OptimizerContext {
    fn default() -> Self {
        Self {
            catalog: Arc::new(MemoryCatalog::default()),
            column_factory: ColumnRefFactory::new(),
            session: SessionVariables::default(),
            required_columns: ColumnRefSet::new(),
        }
    }
}

impl Debug for OptimizerContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerContext")
            .field("tables", &self.catalog.table_names())
            .field("columns", &self.column_factory.len())
            .field("session", &self.session)
            .field("required_columns", &self.required_columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::catalog::MemoryCatalog;
    use crate::column::ColumnId;
    use crate::error::OptimizerError;
    use crate::optimizer::{OptimizerContext, SessionVariables};
    use crate::test_utils::test_context;

    #[test]
    fn test_new_olap_scan() {
        let mut ctx = test_context();
        let t1 = ctx.new_olap_scan("t1").unwrap();
        let t2 = ctx.new_olap_scan("t2").unwrap();

        assert_eq!(
            vec![ColumnId::new(1), ColumnId::new(2)],
            t1.output_column_list().iter().map(|c| c.id()).collect::<Vec<_>>()
        );
        assert_eq!(ColumnId::new(3), t2.output_column_list()[0].id());
        assert_eq!(4, ctx.column_factory().len());

        let err = ctx.new_olap_scan("t3").unwrap_err();
        assert_eq!(
            Some(&OptimizerError::TableNotFound("t3".to_string())),
            err.downcast_ref::<OptimizerError>()
        );
    }

    #[test]
    fn test_rejects_invalid_session() {
        let session = SessionVariables {
            new_planner_agg_stage: 7,
            ..Default::default()
        };
        assert!(OptimizerContext::new(Arc::new(MemoryCatalog::new()), session).is_err());
    }
}
