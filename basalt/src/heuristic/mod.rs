//! Implementation of heuristic optimizer.
//!
//! Heuristic optimizer optimizes query plan by applying a batch of rewrite rules to query plan
//! until some condition is met, e.g. max number of iterations or reached fixed point. The
//! implementation is inspired by [apache calcite](https://github.com/apache/calcite)'s
//! HepPlanner.
//!
//! After rewriting, every logical operator is replaced by the first physical alternative its
//! implementation rules produce. No cost is involved, choosing among alternatives is left to
//! cost based drivers built on the same rules.
mod optimizer;
pub use optimizer::*;
mod required;
pub use required::*;
