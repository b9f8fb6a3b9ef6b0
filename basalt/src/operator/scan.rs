use std::collections::BTreeMap;
use std::fmt::Formatter;

use itertools::Itertools;

use crate::catalog::{ColumnMeta, DistributionInfo, IndexId, PartitionId, TableRef, TabletId};
use crate::column::{ColumnRefFactory, ColumnRefSet};
use crate::error::BasaltResult;
use crate::operator::{DisplayFields, OperatorBase, OperatorTrait};
use crate::plan::ExpressionContext;
use crate::properties::DistributionSpec;
use crate::scalar::{ColumnRefOperator, ScalarOperator};

/// Logical scan of an olap table.
///
/// The selected index, partition and tablet are chosen by upstream planning. Physical fan out
/// over several partitions or tablets happens after implementation.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct OlapScan {
    base: OperatorBase,
    table: TableRef,
    output_columns: Vec<ColumnRefOperator>,
    column_ref_to_meta: BTreeMap<ColumnRefOperator, ColumnMeta>,
    distribution: DistributionSpec,
    selected_index_id: Option<IndexId>,
    selected_partition_id: Option<PartitionId>,
    selected_tablet_id: Option<TabletId>,
}

impl OlapScan {
    /// Output columns follow the order of `columns`.
    pub fn new<I>(table: TableRef, columns: I, distribution: DistributionSpec) -> Self
    where
        I: IntoIterator<Item = (ColumnRefOperator, ColumnMeta)>,
    {
        let mut output_columns = vec![];
        let mut column_ref_to_meta = BTreeMap::new();
        for (column_ref, meta) in columns {
            if column_ref_to_meta
                .insert(column_ref.clone(), meta)
                .is_none()
            {
                output_columns.push(column_ref);
            }
        }

        Self {
            base: OperatorBase::default(),
            table,
            output_columns,
            column_ref_to_meta,
            distribution,
            selected_index_id: None,
            selected_partition_id: None,
            selected_tablet_id: None,
        }
    }

    /// Scans every column of `table`, allocating a fresh column reference for each.
    ///
    /// Hash distributed tables report a hashed distribution over the new references.
    pub fn from_table(table: TableRef, factory: &mut ColumnRefFactory) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|meta| {
                let column = factory.create(meta.name(), meta.data_type().clone(), meta.nullable());
                (column, meta.clone())
            })
            .collect::<Vec<_>>();

        let distribution = match table.distribution() {
            DistributionInfo::Hash { column_names, .. } => DistributionSpec::Hashed(
                column_names
                    .iter()
                    .filter_map(|name| {
                        columns
                            .iter()
                            .find(|(_, meta)| meta.name() == name)
                            .map(|(column, _)| column.id())
                    })
                    .collect(),
            ),
            DistributionInfo::Random { .. } => DistributionSpec::Random,
        };

        Self::new(table, columns, distribution)
    }

    pub fn with_selection(
        mut self,
        index_id: IndexId,
        partition_id: PartitionId,
        tablet_id: TabletId,
    ) -> Self {
        self.selected_index_id = Some(index_id);
        self.selected_partition_id = Some(partition_id);
        self.selected_tablet_id = Some(tablet_id);
        self
    }

    pub fn with_predicate(mut self, predicate: Option<ScalarOperator>) -> Self {
        self.base.set_predicate(predicate);
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn output_column_list(&self) -> &[ColumnRefOperator] {
        &self.output_columns
    }

    pub fn column_ref_to_meta(&self) -> &BTreeMap<ColumnRefOperator, ColumnMeta> {
        &self.column_ref_to_meta
    }

    pub fn distribution(&self) -> &DistributionSpec {
        &self.distribution
    }

    pub fn selected_index_id(&self) -> Option<IndexId> {
        self.selected_index_id
    }

    pub fn selected_partition_id(&self) -> Option<PartitionId> {
        self.selected_partition_id
    }

    pub fn selected_tablet_id(&self) -> Option<TabletId> {
        self.selected_tablet_id
    }
}

impl OperatorTrait for OlapScan {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, _ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        Ok(ColumnRefSet::with_columns(&self.output_columns))
    }
}

impl DisplayFields for OlapScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &format_args!("{}", self.table))
            .field(
                "output",
                &format_args!("[{}]", self.output_columns.iter().join(", ")),
            );
        if let Some(index_id) = self.selected_index_id {
            s.field("index", &format_args!("{}", index_id));
        }
        self.base.display_fields(&mut s);
        s.finish()
    }
}

/// Olap scan bound to concrete index, partitions and tablets.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct PhysicalOlapScan {
    base: OperatorBase,
    table: TableRef,
    output_columns: Vec<ColumnRefOperator>,
    column_ref_to_meta: BTreeMap<ColumnRefOperator, ColumnMeta>,
    distribution: DistributionSpec,
    selected_index_id: IndexId,
    selected_partition_ids: Vec<PartitionId>,
    selected_tablet_ids: Vec<TabletId>,
}

impl PhysicalOlapScan {
    pub fn new(
        table: TableRef,
        output_columns: Vec<ColumnRefOperator>,
        column_ref_to_meta: BTreeMap<ColumnRefOperator, ColumnMeta>,
        distribution: DistributionSpec,
        selected_index_id: IndexId,
    ) -> Self {
        Self {
            base: OperatorBase::default(),
            table,
            output_columns,
            column_ref_to_meta,
            distribution,
            selected_index_id,
            selected_partition_ids: vec![],
            selected_tablet_ids: vec![],
        }
    }

    pub fn with_selected_partition_ids(mut self, partition_ids: Vec<PartitionId>) -> Self {
        self.selected_partition_ids = partition_ids;
        self
    }

    pub fn with_selected_tablet_ids(mut self, tablet_ids: Vec<TabletId>) -> Self {
        self.selected_tablet_ids = tablet_ids;
        self
    }

    pub fn with_predicate(mut self, predicate: Option<ScalarOperator>) -> Self {
        self.base.set_predicate(predicate);
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.base.set_limit(limit);
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn output_column_list(&self) -> &[ColumnRefOperator] {
        &self.output_columns
    }

    pub fn column_ref_to_meta(&self) -> &BTreeMap<ColumnRefOperator, ColumnMeta> {
        &self.column_ref_to_meta
    }

    pub fn distribution(&self) -> &DistributionSpec {
        &self.distribution
    }

    pub fn selected_index_id(&self) -> IndexId {
        self.selected_index_id
    }

    pub fn selected_partition_ids(&self) -> &[PartitionId] {
        &self.selected_partition_ids
    }

    pub fn selected_tablet_ids(&self) -> &[TabletId] {
        &self.selected_tablet_ids
    }
}

impl OperatorTrait for PhysicalOlapScan {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn output_columns(&self, _ctx: &ExpressionContext) -> BasaltResult<ColumnRefSet> {
        Ok(ColumnRefSet::with_columns(&self.output_columns))
    }
}

impl DisplayFields for PhysicalOlapScan {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("");
        s.field("table", &format_args!("{}", self.table))
            .field(
                "output",
                &format_args!("[{}]", self.output_columns.iter().join(", ")),
            )
            .field("index", &format_args!("{}", self.selected_index_id))
            .field(
                "partitions",
                &format_args!("[{}]", self.selected_partition_ids.iter().join(", ")),
            )
            .field(
                "tablets",
                &format_args!("[{}]", self.selected_tablet_ids.iter().join(", ")),
            );
        self.base.display_fields(&mut s);
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use maplit::btreemap;

    use crate::catalog::{Catalog, ColumnMeta};
    use crate::column::{ColumnId, ColumnRefFactory};
    use crate::operator::OlapScan;
    use crate::properties::DistributionSpec;
    use crate::test_utils::test_catalog;

    #[test]
    fn test_from_table() {
        let table = test_catalog().table("t2").unwrap();
        let mut factory = ColumnRefFactory::new();
        let _unrelated = factory.create("x", DataType::Utf8, true);

        let scan = OlapScan::from_table(table, &mut factory);
        let b = factory.get(ColumnId::new(2)).unwrap().clone();
        let d = factory.get(ColumnId::new(3)).unwrap().clone();

        assert_eq!(&[b.clone(), d.clone()], scan.output_column_list());
        assert_eq!(
            &btreemap! {
                b.clone() => ColumnMeta::new_key("b", DataType::Int64),
                d => ColumnMeta::new("d", DataType::Int64, true),
            },
            scan.column_ref_to_meta()
        );
        assert_eq!(
            &DistributionSpec::Hashed(vec![b.id()]),
            scan.distribution()
        );
        assert_eq!(None, scan.selected_index_id());
    }
}
