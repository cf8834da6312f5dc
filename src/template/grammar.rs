//! Grammar tokens: `[[KEY]]` lookups and the `[[A_AN:...]]` article rule.
//!
//! The article rule looks only at spelling: content starting with a vowel
//! letter gets "an", everything else gets "a". Words such as "university"
//! or "hour" come out wrong; templates that hit those cases should spell
//! the article out instead of using the token.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::template::TemplateWarning;

/// Grammar variant dictionary, keyed by lower_snake_case names.
pub type Variant = BTreeMap<String, String>;

static KEY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([A-Z][A-Z0-9_]*)\]\]").expect("valid key token regex"));

static ARTICLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[A_AN:(.*?)\]\]").expect("valid article token regex"));

/// Resolve `[[KEY]]` tokens from `variant`, then apply `[[A_AN:...]]` articles.
///
/// Keys missing from `variant` leave their token in place.
pub fn resolve_grammar(text: &str, variant: &Variant) -> String {
    let keyed = KEY_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let key = caps[1].to_lowercase();
        match variant.get(&key) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });

    ARTICLE_TOKEN
        .replace_all(&keyed, |caps: &Captures<'_>| with_article(&caps[1]))
        .into_owned()
}

/// Prefix `content` with "a " or "an " by its first letter.
pub fn with_article(content: &str) -> String {
    let first_letter = content
        .trim_start()
        .chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.to_ascii_lowercase());

    let article = match first_letter {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} {}", article, content)
}

/// Report `[[` openers that never close.
pub(crate) fn unclosed_tokens(text: &str) -> Vec<TemplateWarning> {
    let mut warnings = Vec::new();
    let mut rest = 0;
    while let Some(found) = text[rest..].find("[[") {
        let open = rest + found;
        match text[open + 2..].find("]]") {
            Some(close) => rest = open + 2 + close + 2,
            None => {
                warnings.push(TemplateWarning::UnclosedGrammarToken { offset: open });
                break;
            }
        }
    }
    warnings
}
