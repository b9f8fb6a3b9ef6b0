use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::column::ColumnId;

#[derive(Hash, Debug, Clone, Eq, PartialEq, Default)]
pub enum DistributionSpec {
    /// No requirement on distribution.
    #[default]
    Any,
    /// The data set is not partitioned and has only one partition.
    Singleton,
    /// The data set is partitioned according to hash values of columns.
    Hashed(Vec<ColumnId>),
    /// The data set has several partitions, but the partitioning doesn't following any rule.
    Random,
}

impl Display for DistributionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionSpec::Any => write!(f, "ANY"),
            DistributionSpec::Singleton => write!(f, "SINGLETON"),
            DistributionSpec::Hashed(columns) => write!(f, "HASH({})", columns.iter().join(", ")),
            DistributionSpec::Random => write!(f, "RANDOM"),
        }
    }
}
