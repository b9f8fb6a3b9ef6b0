use std::sync::Arc;

use arrow_schema::DataType;

use crate::catalog::{
    BackendId, ColumnMeta, DistributionInfo, IndexId, MemoryCatalog, OlapTable, Partition,
    PartitionId, TableId, Tablet, TabletId,
};
use crate::operator::{LogicalOperator, OlapScan, PhysicalOlapScan};
use crate::optimizer::{OptimizerContext, SessionVariables};
use crate::plan::{OptExpression, OptExpressionRef};
use crate::scalar::ColumnRefOperator;

/// Creates a hash distributed table with one partition holding one tablet of the base index.
///
/// Partition and tablet ids follow the table id, e.g. table 10 has partition 11 and tablet 12.
fn table_for_test(id: u64, name: &str, key: &str, value: &str) -> OlapTable {
    let tablet = Tablet::new(TabletId::from(id + 2), vec![BackendId::from(1)]);
    let partition = Partition::new(PartitionId::from(id + 1), format!("p_{}", name))
        .with_tablets(IndexId::from(id), vec![tablet]);

    OlapTable::new(
        TableId::from(id),
        name,
        vec![
            ColumnMeta::new_key(key, DataType::Int64),
            ColumnMeta::new(value, DataType::Int64, true),
        ],
    )
    .with_partition(partition)
    .with_distribution(DistributionInfo::Hash {
        column_names: vec![key.to_string()],
        buckets: 1,
    })
}

/// `t1(a, c)` and `t2(b, d)`.
pub fn test_catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.register_table(table_for_test(10, "t1", "a", "c"));
    catalog.register_table(table_for_test(20, "t2", "b", "d"));
    catalog
}

pub fn test_context() -> OptimizerContext {
    test_context_with_session(SessionVariables::default())
}

pub fn test_context_with_session(session: SessionVariables) -> OptimizerContext {
    OptimizerContext::new(Arc::new(test_catalog()), session).unwrap()
}

/// Scan of every column of `table` with index, partition and tablet selected.
pub fn olap_scan(ctx: &mut OptimizerContext, table: &str) -> (OlapScan, Vec<ColumnRefOperator>) {
    let scan = ctx.new_olap_scan(table).unwrap();
    let table = scan.table().clone();
    let index_id = table.base_index_id();
    let partition = &table.partitions()[0];
    let tablet_id = partition.tablets(index_id)[0].id();

    let scan = scan.with_selection(index_id, partition.id(), tablet_id);
    let columns = scan.output_column_list().to_vec();
    (scan, columns)
}

pub fn scan_expr(
    ctx: &mut OptimizerContext,
    table: &str,
) -> (OptExpressionRef, Vec<ColumnRefOperator>) {
    let (scan, columns) = olap_scan(ctx, table);
    let expr = OptExpression::with_operator(LogicalOperator::from(scan), vec![]);
    (Arc::new(expr), columns)
}

pub fn physical_scan(
    ctx: &mut OptimizerContext,
    table: &str,
) -> (PhysicalOlapScan, Vec<ColumnRefOperator>) {
    let (scan, columns) = olap_scan(ctx, table);
    let physical = PhysicalOlapScan::new(
        scan.table().clone(),
        scan.output_column_list().to_vec(),
        scan.column_ref_to_meta().clone(),
        scan.distribution().clone(),
        scan.selected_index_id().unwrap(),
    )
    .with_selected_partition_ids(scan.selected_partition_id().into_iter().collect())
    .with_selected_tablet_ids(scan.selected_tablet_id().into_iter().collect());
    (physical, columns)
}
