//! Collection name derivation.
//!
//! A model type name such as `SomeComposedName` is split into word runs,
//! each starting at an uppercase letter, lowercased, joined with `_`, and the
//! last word is pluralized: `some_composed_names`.

use regex::Regex;
use std::sync::LazyLock;

/// Words with identical singular and plural forms.
const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "moose",
    "news",
    "aircraft",
    "metadata",
];

const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("louse", "lice"),
    ("datum", "data"),
    ("criterion", "criteria"),
    ("phenomenon", "phenomena"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("cactus", "cacti"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
    ("echo", "echoes"),
];

/// Suffix rules, tried in order. The first matching rule wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("(quiz)$", "${1}zes"),
    ("([^aeiouy]|qu)y$", "${1}ies"),
    ("(ch|sh|ss|x|z)$", "${1}es"),
    ("(us)$", "${1}es"),
    ("(ax|test|bas|cris|analys|diagnos|thes|synops)is$", "${1}es"),
    ("([^f])fe$", "${1}ves"),
    ("([lr]|ea)f$", "${1}ves"),
];

static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SUFFIX_RULES
        .iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(regex) => Some((regex, *replacement)),
            Err(err) => {
                log::error!("Invalid pluralization rule {}: {}", pattern, err);
                None
            }
        })
        .collect()
});

/// Splits a type name into lowercase word runs.
///
/// Each run starts at an uppercase letter and extends up to the next one.
/// Characters preceding the first uppercase letter do not belong to any run;
/// a name without uppercase letters is returned as a single run.
pub fn split_words(type_name: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for ch in type_name.chars() {
        if ch.is_ascii_uppercase() {
            words.push(ch.to_ascii_lowercase().to_string());
        } else if let Some(current) = words.last_mut() {
            current.push(ch.to_ascii_lowercase());
        }
    }

    if words.is_empty() && !type_name.is_empty() {
        words.push(type_name.to_ascii_lowercase());
    }
    words
}

/// Returns the English plural of a lowercase word.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    if UNCOUNTABLES.contains(&word) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULARS.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }

    for (regex, replacement) in PLURAL_RULES.iter() {
        if regex.is_match(word) {
            return regex.replace(word, *replacement).into_owned();
        }
    }

    format!("{}s", word)
}

/// Derives the collection name of a model type.
///
/// ```rust
/// use docflex::naming::collection_name;
///
/// assert_eq!(collection_name("Article"), "articles");
/// assert_eq!(collection_name("SomeComposedName"), "some_composed_names");
/// ```
pub fn collection_name(type_name: &str) -> String {
    let mut words = split_words(type_name);
    if let Some(last) = words.last_mut() {
        *last = pluralize(last);
    }
    words.join("_")
}
