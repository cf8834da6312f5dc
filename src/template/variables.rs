//! Variable tokens: `{{key}}` and `{{key|default}}`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Values for `{{key}}` tokens.
pub type Variables = BTreeMap<String, String>;

static VARIABLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^{}|]+)(?:\|([^{}]*))?\}\}").expect("valid variable token regex")
});

/// Substitute every variable token in `text`.
///
/// A key resolves when `variables` holds a non-empty value for it (after
/// trimming the key). Otherwise the trimmed default is used if the token
/// has one, and the token is left as-is if it does not. Substituted values
/// are not scanned again.
pub fn resolve_variables(text: &str, variables: &Variables) -> String {
    VARIABLE_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            if let Some(value) = variables.get(key).filter(|v| !v.is_empty()) {
                return value.clone();
            }
            match caps.get(2) {
                Some(default) => default.as_str().trim().to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Keys of tokens that `resolve_variables` would leave unresolved.
pub fn unresolved_keys(text: &str, variables: &Variables) -> Vec<String> {
    VARIABLE_TOKEN
        .captures_iter(text)
        .filter(|caps| caps.get(2).is_none())
        .map(|caps| caps[1].trim().to_string())
        .filter(|key| variables.get(key).is_none_or(|v| v.is_empty()))
        .collect()
}
