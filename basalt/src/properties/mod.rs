//! Properties of relation operators.
//!
//! [`LogicalProperty`] is shared by all logically equivalent plans, such as the output columns.
//! [`DistributionSpec`] describes how the rows produced by a physical operator are spread across
//! nodes.

mod distribution;
pub use distribution::*;
mod logical;
pub use logical::*;
