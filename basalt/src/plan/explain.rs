use std::borrow::Cow;
use std::default::Default;
use std::io::{Error, ErrorKind, Write};

use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use crate::plan::OptExpression;

impl<'a> TreeItem for &'a OptExpression {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(self.operator()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.inputs()
                .iter()
                .map(|c| &**c)
                .collect::<Vec<&'a OptExpression>>(),
        )
    }
}

/// Writes `plan` as an indented tree, one operator per line.
pub fn explain<W: Write>(plan: &OptExpression, output: &mut W) -> std::io::Result<()> {
    let config = PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    };
    write_tree_with(&plan, output, &config)
}

pub fn explain_to_string(plan: &OptExpression) -> std::io::Result<String> {
    let mut buf = Vec::new();
    explain(plan, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}
