use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::operator::OperatorKind;
use crate::plan::OptExpression;
use crate::utils::TreeBuilder;

/// Matches the operator of one plan node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternMatcher {
    Kind(OperatorKind),
    /// Matches any subtree.
    Any,
}

/// Wildcard matcher, see [`PatternMatcher::Any`].
pub const ANY: PatternMatcher = PatternMatcher::Any;

impl From<OperatorKind> for PatternMatcher {
    fn from(kind: OperatorKind) -> Self {
        PatternMatcher::Kind(kind)
    }
}

/// A pattern defines how to match a sub tree of a plan.
///
/// If we want to match `Join(Filter, Scan)` pattern, the pattern tree should be defined like:
/// ```
/// use basalt::operator::OperatorKind;
/// use basalt::rules::{pattern, ANY};
///
/// pattern(OperatorKind::LogicalJoin)
///   .begin_node(OperatorKind::LogicalFilter)
///     .leaf(ANY)
///   .end_node()
///   .leaf(OperatorKind::LogicalOlapScan)
/// .build();
/// ```
///
/// The root node in pattern tree matches `Join` operator, the first child node matches
/// `Filter` operator, and the last matches `Scan`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    matcher: PatternMatcher,
    /// `None` for leaf node, which accepts any inputs.
    children: Option<Vec<Pattern>>,
}

impl Pattern {
    pub fn new_leaf<M: Into<PatternMatcher>>(matcher: M) -> Pattern {
        Pattern {
            matcher: matcher.into(),
            children: None,
        }
    }

    pub fn new<M, I>(matcher: M, children: I) -> Pattern
    where
        M: Into<PatternMatcher>,
        I: IntoIterator<Item = Pattern>,
    {
        let children = children.into_iter().collect::<Vec<Pattern>>();
        let children = if !children.is_empty() {
            Some(children)
        } else {
            None
        };

        Pattern {
            matcher: matcher.into(),
            children,
        }
    }

    pub fn matcher(&self) -> PatternMatcher {
        self.matcher
    }

    pub fn children(&self) -> Option<&[Pattern]> {
        self.children.as_deref()
    }

    /// Operator kind of the pattern root, `None` for wildcard roots.
    pub fn root_kind(&self) -> Option<OperatorKind> {
        match self.matcher {
            PatternMatcher::Kind(kind) => Some(kind),
            PatternMatcher::Any => None,
        }
    }

    /// Tests whether `expr` has the shape of this pattern.
    ///
    /// Wildcards match without looking at the subtree, so the cost is bounded by the depth of
    /// the pattern.
    pub fn matches(&self, expr: &OptExpression) -> bool {
        match self.matcher {
            PatternMatcher::Any => return true,
            PatternMatcher::Kind(kind) if kind != expr.operator().kind() => return false,
            PatternMatcher::Kind(_) => {}
        }

        match &self.children {
            None => true,
            Some(children) => {
                children.len() == expr.arity()
                    && children
                        .iter()
                        .zip(expr.inputs())
                        .all(|(pattern, input)| pattern.matches(input))
            }
        }
    }
}

pub fn pattern<M: Into<PatternMatcher>>(matcher: M) -> TreeBuilder<Pattern, PatternMatcher> {
    TreeBuilder::new(matcher.into())
}

impl From<(PatternMatcher, Vec<Pattern>)> for Pattern {
    fn from(t: (PatternMatcher, Vec<Pattern>)) -> Self {
        Pattern::new(t.0, t.1)
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.matcher {
            PatternMatcher::Kind(kind) => write!(f, "{}", kind)?,
            PatternMatcher::Any => write!(f, "*")?,
        }
        if let Some(children) = &self.children {
            write!(f, "({})", children.iter().join(", "))?;
        }
        Ok(())
    }
}
