//! Assembler: runs the three resolvers over one template.
//!
//! ```text
//! template → spintax → grammar → variables → text
//! ```
//!
//! Variables run last. Caller-supplied values (city names, niche labels,
//! anything typed into a campaign form) are inserted after all template
//! syntax is gone, so a value containing `{a|b}` or `[[KEY]]` is emitted
//! literally instead of being expanded.

use crate::template::grammar::{resolve_grammar, unclosed_tokens, Variant};
use crate::template::spintax::{resolve_spintax, Chooser};
use crate::template::variables::{resolve_variables, unresolved_keys, Variables};
use crate::template::TemplateWarning;

/// Final text for one template plus what happened on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub text: String,
    /// Output of the spintax stage alone.
    pub spintax_text: String,
    /// Chosen option text per spintax slot.
    pub choices: Vec<String>,
    /// Variable keys left unresolved in `text`.
    pub unresolved: Vec<String>,
    pub warnings: Vec<TemplateWarning>,
}

/// Assemble `template` into final text.
pub fn assemble(
    template: &str,
    variant: &Variant,
    variables: &Variables,
    chooser: &mut dyn Chooser,
) -> Assembly {
    // Stage 1: spintax
    let spun = resolve_spintax(template, chooser);
    let mut warnings = spun.warnings;

    // Stage 2: grammar
    warnings.extend(unclosed_tokens(&spun.text));
    let grammatical = resolve_grammar(&spun.text, variant);

    // Stage 3: variables
    let unresolved = unresolved_keys(&grammatical, variables);
    let text = resolve_variables(&grammatical, variables);

    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), "Template assembled with warnings");
    }

    Assembly {
        text,
        spintax_text: spun.text,
        choices: spun.choices,
        unresolved,
        warnings,
    }
}
