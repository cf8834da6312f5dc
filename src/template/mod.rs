//! Template resolution for article generation.
//!
//! Three independent resolvers, each a pure function over text:
//!
//! - [`spintax`]: `{a|b|{c|d}}` alternatives
//! - [`grammar`]: `[[KEY]]` lookups and the `[[A_AN:...]]` article rule
//! - [`variables`]: `{{key}}` / `{{key|default}}` substitution
//!
//! [`assembler`] runs them in a fixed order.

pub mod assembler;
pub mod grammar;
pub mod spintax;
pub mod variables;

use serde::Serialize;

pub use assembler::{assemble, Assembly};
pub use grammar::{resolve_grammar, with_article, Variant};
pub use spintax::{
    parse_slots, resolve_spintax, Chooser, FirstChooser, IndexChooser, RandomChooser, Resolved,
    SeededChooser, SlotScan, SpintaxSlot,
};
pub use variables::{resolve_variables, unresolved_keys, Variables};

/// A malformed span that was left in the output as literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateWarning {
    /// `}` with no open group.
    UnmatchedClose { offset: usize },
    /// `{` that never closed.
    UnclosedGroup { offset: usize },
    /// `[[` that never closed.
    UnclosedGrammarToken { offset: usize },
}

impl TemplateWarning {
    /// Byte offset of the offending character.
    pub fn offset(&self) -> usize {
        match self {
            TemplateWarning::UnmatchedClose { offset }
            | TemplateWarning::UnclosedGroup { offset }
            | TemplateWarning::UnclosedGrammarToken { offset } => *offset,
        }
    }
}

impl std::fmt::Display for TemplateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateWarning::UnmatchedClose { offset } => {
                write!(f, "unmatched '}}' at byte {}", offset)
            }
            TemplateWarning::UnclosedGroup { offset } => {
                write!(f, "unclosed '{{' at byte {}", offset)
            }
            TemplateWarning::UnclosedGrammarToken { offset } => {
                write!(f, "unclosed '[[' at byte {}", offset)
            }
        }
    }
}
