//! Errors raised while lowering documents into a plan.

use std::fmt;

use i18n_embed::fluent::FluentLanguageLoader;

use crate::localization::{message_with_loader, with_loader};

/// Compilation failure for a document subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// An outline placeholder names a column missing from its examples.
    UnknownColumn {
        /// Outline name.
        outline: String,
        /// Placeholder name without angle brackets.
        column: String,
        /// `path[line,column]` of the examples block.
        origin: String,
    },
    /// A node carries more than one tag matching the id tag pattern.
    DuplicateIdTag {
        /// Node name.
        node: String,
        /// The competing tags.
        tags: Vec<String>,
        /// `path[line,column]` of the node.
        origin: String,
    },
}

impl CompileError {
    /// Render the error message using the provided Fluent loader.
    #[must_use]
    pub fn format_with_loader(&self, loader: &FluentLanguageLoader) -> String {
        match self {
            Self::UnknownColumn {
                outline,
                column,
                origin,
            } => message_with_loader(loader, "compile-error-unknown-column", |args| {
                args.set("outline", outline.clone());
                args.set("column", column.clone());
                args.set("origin", origin.clone());
            }),
            Self::DuplicateIdTag { node, tags, origin } => {
                message_with_loader(loader, "compile-error-duplicate-id-tag", |args| {
                    args.set("node", node.clone());
                    args.set("tags", tags.join(", "));
                    args.set("origin", origin.clone());
                })
            }
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&with_loader(|loader| self.format_with_loader(loader)))
    }
}

impl std::error::Error for CompileError {}
