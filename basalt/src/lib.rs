//! ## Background
//!
//! A query planner turns a logical description of a query (scans, joins, aggregations,
//! predicates) into an executable physical plan. This crate is the core of such a planner: the
//! relational operator model and the rule engine that rewrites trees of those operators.
//!
//! Every operator is an immutable value. Operators are paired with their inputs in an
//! [`plan::OptExpression`], and [`rules`] consume one expression shape and produce zero or more
//! equivalent expressions. Logical rewrite rules produce equivalent logical trees (predicate
//! push down, column pruning, aggregate splitting), implementation rules bind logical operators
//! to physical execution strategies.
//!
//! Searching the plan space, costing candidates and executing plans are left to callers. The
//! [`heuristic`] module carries a small top-down rewrite driver which is enough to run the rules
//! end to end.
//!
//! ## Design
//!
//! * [`column`] Column identities and column sets.
//! * [`scalar`] Scalar expression trees used inside relational operators.
//! * [`catalog`] Read only table metadata referenced by scans.
//! * [`operator`] Logical and physical relational operators.
//! * [`plan`] Plan expressions, builders and explain.
//! * [`properties`] Logical and physical properties.
//! * [`rules`] Rule contract, patterns, registry and rule implementations.
//! * [`optimizer`] Per query optimizer context and session variables.
//! * [`heuristic`] Heuristic rewrite driver.
//!
//! ## Reference
//!
//! 1. Graefe, G., 1995. The cascades framework for query optimization. IEEE Data Eng. Bull., 18(3),
//! pp.19-29.
//! 2. Soliman, M.A., Antova, L., Raghavan, V., El-Helw, A., Gu, Z., Shen, E., Caragea, G.C.,
//! Garcia-Alvarado, C., Rahman, F., Petropoulos, M. and Waas, F., 2014, June.  Orca: a modular
//! query optimizer architecture for big data. In Proceedings of the 2014 ACM SIGMOD
//! international  conference on Management of data (pp. 337-348).

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod catalog;
pub mod column;
pub mod error;
pub mod heuristic;
pub mod operator;
pub mod optimizer;
pub mod plan;
pub mod properties;
pub mod rules;
pub mod scalar;
pub mod utils;

#[cfg(test)]
mod test_utils;
