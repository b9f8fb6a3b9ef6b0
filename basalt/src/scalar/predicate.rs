use std::fmt::{Display, Formatter};

use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::scalar::ScalarOperator;

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, AsRefStr, StrumDisplay)]
pub enum BinaryType {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "<>")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    /// Null safe equal, `<=>`.
    #[strum(serialize = "<=>")]
    EqForNull,
}

impl BinaryType {
    pub fn is_equal(self) -> bool {
        matches!(self, BinaryType::Eq | BinaryType::EqForNull)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BinaryPredicateOperator {
    binary_type: BinaryType,
    left: Box<ScalarOperator>,
    right: Box<ScalarOperator>,
}

impl BinaryPredicateOperator {
    pub fn new(binary_type: BinaryType, left: ScalarOperator, right: ScalarOperator) -> Self {
        Self {
            binary_type,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn binary_type(&self) -> BinaryType {
        self.binary_type
    }

    pub fn left(&self) -> &ScalarOperator {
        &self.left
    }

    pub fn right(&self) -> &ScalarOperator {
        &self.right
    }
}

impl Display for BinaryPredicateOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.binary_type, self.right)
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CompoundType {
    And,
    Or,
    Not,
}

/// `AND`, `OR` over two or more children, or `NOT` over exactly one.
///
/// Children are kept in the order they were given, equality is order sensitive.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CompoundPredicateOperator {
    compound_type: CompoundType,
    children: Vec<ScalarOperator>,
}

impl CompoundPredicateOperator {
    pub fn new<I: IntoIterator<Item = ScalarOperator>>(
        compound_type: CompoundType,
        children: I,
    ) -> Self {
        Self {
            compound_type,
            children: children.into_iter().collect(),
        }
    }

    pub fn compound_type(&self) -> CompoundType {
        self.compound_type
    }

    pub fn children(&self) -> &[ScalarOperator] {
        &self.children
    }
}

impl Display for CompoundPredicateOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.compound_type, self.children.as_slice()) {
            (CompoundType::Not, [child]) => write!(f, "NOT {}", child),
            (compound_type, children) => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " {} ", compound_type)?;
                    }
                    match child {
                        ScalarOperator::CompoundPredicate(_) => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct IsNullPredicateOperator {
    child: Box<ScalarOperator>,
    negated: bool,
}

impl IsNullPredicateOperator {
    pub fn new(child: ScalarOperator, negated: bool) -> Self {
        Self {
            child: Box::new(child),
            negated,
        }
    }

    pub fn child(&self) -> &ScalarOperator {
        &self.child
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl Display for IsNullPredicateOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "{} IS NOT NULL", self.child)
        } else {
            write!(f, "{} IS NULL", self.child)
        }
    }
}
