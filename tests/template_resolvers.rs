//! End-to-end checks of the three template resolvers.

use proptest::prelude::*;
use spinweave::template::{
    assemble, parse_slots, resolve_grammar, resolve_spintax, resolve_variables, FirstChooser,
    RandomChooser, SeededChooser, Variables, Variant,
};

fn map(pairs: &[(&str, &str)]) -> Variant {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_random_spin_stays_in_valid_set() {
    let template = "{Hello|Hi} {World|Friend|{Universe|Cosmos}}";
    let valid: Vec<String> = ["Hello", "Hi"]
        .iter()
        .flat_map(|greeting| {
            ["World", "Friend", "Universe", "Cosmos"]
                .iter()
                .map(move |object| format!("{} {}", greeting, object))
        })
        .collect();

    let mut chooser = RandomChooser::new();
    for _ in 0..200 {
        let resolved = resolve_spintax(template, &mut chooser);
        assert!(valid.contains(&resolved.text), "unexpected {}", resolved.text);
        assert!(!resolved.text.contains(['{', '}']));
    }
}

#[test]
fn test_seeded_spin_is_reproducible() {
    let template = "{a|b|c}{d|e|f}{g|h|i}{j|k|l}";
    let first = resolve_spintax(template, &mut SeededChooser::new(7)).text;
    let second = resolve_spintax(template, &mut SeededChooser::new(7)).text;
    assert_eq!(first, second);
}

#[test]
fn test_variable_fallback() {
    let empty = Variables::new();
    assert_eq!(resolve_variables("{{x|default}}", &empty), "default");
    assert_eq!(resolve_variables("{{x|default}}", &map(&[("x", "v")])), "v");
    assert_eq!(resolve_variables("{{x}}", &empty), "{{x}}");
}

#[test]
fn test_article_rule() {
    let empty = Variant::new();
    assert_eq!(resolve_grammar("[[A_AN:Apple]]", &empty), "an Apple");
    assert_eq!(resolve_grammar("[[A_AN:Store]]", &empty), "a Store");
}

#[test]
fn test_grammar_substitution_keeps_double_article() {
    let variant = map(&[("pronoun", "he"), ("isare", "is")]);
    assert_eq!(
        resolve_grammar(
            "[[PRONOUN]] [[ISARE]] going to the [[A_AN:Apple]] store.",
            &variant
        ),
        "he is going to the an Apple store."
    );
}

#[test]
fn test_assemble_full_pipeline() {
    let template = "{Great|Solid} [[A_AN:{{service}}]] in {{city|your area}} [[HASHAVE]] {{missing}}.";
    let variant = map(&[("hashave", "has")]);
    let variables = map(&[("service", "inspection")]);

    let assembly = assemble(template, &variant, &variables, &mut FirstChooser);
    assert_eq!(
        assembly.text,
        "Great a inspection in your area has {{missing}}."
    );
    assert_eq!(assembly.choices, vec!["Great"]);
    assert_eq!(assembly.unresolved, vec!["missing"]);
}

#[test]
fn test_injected_values_are_not_expanded() {
    let variables = map(&[("name", "{A|B} [[PRONOUN]]")]);
    let variant = map(&[("pronoun", "she")]);
    let assembly = assemble("Hi {{name}}", &variant, &variables, &mut FirstChooser);
    assert_eq!(assembly.text, "Hi {A|B} [[PRONOUN]]");
}

#[test]
fn test_parse_slots_matches_resolution_order() {
    let scan = parse_slots("{a|{b|c}} {d|e}");
    let originals: Vec<&str> = scan.slots.iter().map(|s| s.original.as_str()).collect();
    assert_eq!(originals, vec!["{b|c}", "{a|{b|c}}", "{d|e}"]);
    assert_eq!(scan.total_combinations(), Some(8));
}

fn balanced_template() -> impl Strategy<Value = String> {
    let leaf = "[a-z ]{0,4}".prop_map(String::from);
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|opts| format!("{{{}}}", opts.join("|"))),
            prop::collection::vec(inner, 1..4).prop_map(|parts| parts.concat()),
        ]
    })
}

proptest! {
    #[test]
    fn prop_balanced_templates_resolve_without_braces(template in balanced_template(), seed in any::<u64>()) {
        let resolved = resolve_spintax(&template, &mut SeededChooser::new(seed));
        prop_assert!(!resolved.text.contains(['{', '}']), "resolved text still contains braces: {:?}", resolved.text);
        prop_assert!(resolved.warnings.is_empty());
        prop_assert_eq!(resolved.choices.len(), parse_slots(&template).slots.len());
    }
}
