use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use arrow_schema::DataType;
use derive_more::{Display as DeriveDisplay, From, Into};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, From, Into, DeriveDisplay,
        )]
        pub struct $name(u64);
    };
}

catalog_id!(TableId);
catalog_id!(
    /// Id of a materialized index, the base index included.
    IndexId
);
catalog_id!(PartitionId);
catalog_id!(TabletId);
catalog_id!(BackendId);

/// Column definition of a table.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ColumnMeta {
    name: String,
    data_type: DataType,
    nullable: bool,
    is_key: bool,
}

impl ColumnMeta {
    pub fn new<S: Into<String>>(name: S, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            is_key: false,
        }
    }

    pub fn new_key<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            is_key: true,
            ..Self::new(name, data_type, false)
        }
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

    pub fn is_key(&self) -> bool {
        self.is_key
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexMeta {
    id: IndexId,
    name: String,
    column_names: Vec<String>,
}

impl IndexMeta {
    pub fn new<S: Into<String>>(id: IndexId, name: S, column_names: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            column_names,
        }
    }

    pub fn id(&self) -> IndexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tablet {
    id: TabletId,
    /// Backends holding a replica of this tablet.
    replicas: Vec<BackendId>,
}

impl Tablet {
    pub fn new(id: TabletId, replicas: Vec<BackendId>) -> Self {
        Self { id, replicas }
    }

    pub fn id(&self) -> TabletId {
        self.id
    }

    pub fn replicas(&self) -> &[BackendId] {
        &self.replicas
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    id: PartitionId,
    name: String,
    /// Tablets of each materialized index in this partition.
    tablets: BTreeMap<IndexId, Vec<Tablet>>,
}

impl Partition {
    pub fn new<S: Into<String>>(id: PartitionId, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            tablets: BTreeMap::new(),
        }
    }

    pub fn with_tablets(mut self, index_id: IndexId, tablets: Vec<Tablet>) -> Self {
        self.tablets.insert(index_id, tablets);
        self
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tablets(&self, index_id: IndexId) -> &[Tablet] {
        self.tablets
            .get(&index_id)
            .map(|tablets| tablets.as_slice())
            .unwrap_or(&[])
    }
}

/// How rows of a table are spread over tablets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DistributionInfo {
    Hash {
        column_names: Vec<String>,
        buckets: u32,
    },
    Random {
        buckets: u32,
    },
}

/// Metadata snapshot of one olap table.
#[derive(Clone, Debug)]
pub struct OlapTable {
    id: TableId,
    name: String,
    columns: Vec<ColumnMeta>,
    base_index_id: IndexId,
    indexes: Vec<IndexMeta>,
    partitions: Vec<Partition>,
    distribution: DistributionInfo,
}

impl OlapTable {
    /// Creates a table whose base index id equals the table id, with a single random bucket.
    pub fn new<S: Into<String>>(id: TableId, name: S, columns: Vec<ColumnMeta>) -> Self {
        let base_index_id = IndexId::from(u64::from(id));
        let base_index = IndexMeta::new(
            base_index_id,
            "base",
            columns.iter().map(|c| c.name().to_string()).collect(),
        );
        Self {
            id,
            name: name.into(),
            columns,
            base_index_id,
            indexes: vec![base_index],
            partitions: vec![],
            distribution: DistributionInfo::Random { buckets: 1 },
        }
    }

    pub fn with_index(mut self, index: IndexMeta) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partitions.push(partition);
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionInfo) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn base_index_id(&self) -> IndexId {
        self.base_index_id
    }

    pub fn indexes(&self) -> &[IndexMeta] {
        &self.indexes
    }

    pub fn index(&self, id: IndexId) -> Option<&IndexMeta> {
        self.indexes.iter().find(|i| i.id() == id)
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, id: PartitionId) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.id() == id)
    }

    pub fn distribution(&self) -> &DistributionInfo {
        &self.distribution
    }
}

/// Shared handle of a table snapshot. Two handles are equal when they name the same table id.
#[derive(Clone, Debug)]
pub struct TableRef(Arc<OlapTable>);

impl TableRef {
    pub fn new(table: OlapTable) -> Self {
        Self(Arc::new(table))
    }
}

impl Deref for TableRef {
    type Target = OlapTable;

    fn deref(&self) -> &OlapTable {
        &self.0
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
