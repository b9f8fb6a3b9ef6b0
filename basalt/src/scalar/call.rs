use std::fmt::{Display, Formatter};

use arrow_schema::DataType;
use itertools::Itertools;

use crate::scalar::ScalarOperator;

/// Function call, including aggregate function calls.
///
/// Argument order is significant for equality.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CallOperator {
    fn_name: String,
    args: Vec<ScalarOperator>,
    return_type: DataType,
    distinct: bool,
}

impl CallOperator {
    pub fn new<S: Into<String>, I: IntoIterator<Item = ScalarOperator>>(
        fn_name: S,
        args: I,
        return_type: DataType,
    ) -> Self {
        Self {
            fn_name: fn_name.into(),
            args: args.into_iter().collect(),
            return_type,
            distinct: false,
        }
    }

    pub fn new_distinct<S: Into<String>, I: IntoIterator<Item = ScalarOperator>>(
        fn_name: S,
        args: I,
        return_type: DataType,
    ) -> Self {
        Self {
            distinct: true,
            ..Self::new(fn_name, args, return_type)
        }
    }

    pub fn fn_name(&self) -> &str {
        &self.fn_name
    }

    pub fn args(&self) -> &[ScalarOperator] {
        &self.args
    }

    pub fn return_type(&self) -> &DataType {
        &self.return_type
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Same function over new arguments, distinct flag cleared.
    pub fn with_args<I: IntoIterator<Item = ScalarOperator>>(&self, args: I) -> Self {
        Self {
            fn_name: self.fn_name.clone(),
            args: args.into_iter().collect(),
            return_type: self.return_type.clone(),
            distinct: false,
        }
    }
}

impl Display for CallOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.fn_name)?;
        if self.distinct {
            write!(f, "distinct ")?;
        }
        write!(f, "{})", self.args.iter().join(", "))
    }
}
