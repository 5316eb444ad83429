// Text and number normalization shared by the cleaning and enrichment stages.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::UNAVAILABLE;

/// Builds a comparison key: upper case, no diacritics, only `A-Z`, `0-9` and single
/// spaces.
///
/// ```
/// use departmental_tally::normalize::simplify;
/// assert_eq!(simplify("  Río   Negro! "), "RIO NEGRO");
/// ```
pub fn simplify(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| c.is_ascii())
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_ascii_whitespace())
        .collect();
    folded.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folds a candidate label like [`simplify`] but keeps its punctuation, so that the
/// separators between candidates survive.
///
/// ```
/// use departmental_tally::normalize::fold_label;
/// assert_eq!(fold_label("José  Pérez / Ana Díaz"), "JOSE PEREZ / ANA DIAZ");
/// ```
pub fn fold_label(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| c.is_ascii() && (!c.is_ascii_control() || c.is_ascii_whitespace()))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    folded.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Two names are equivalent when their comparison keys are equal.
pub fn names_equivalent(a: &str, b: &str) -> bool {
    simplify(a) == simplify(b)
}

/// Returns the first candidate equivalent to `target`.
pub fn find_matching_name<'a, S: AsRef<str>>(target: &str, candidates: &'a [S]) -> Option<&'a S> {
    let key = simplify(target);
    candidates.iter().find(|c| simplify(c.as_ref()) == key)
}

/// Upper cases the first letter of every run of letters and lower cases the rest.
///
/// Any non-letter starts a new word, so `O'NEIL` becomes `O'Neil`.
pub fn title_case(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            res.push(c);
            in_word = false;
        }
    }
    res
}

/// Lenient decimal parsing: accepts a comma or a dot as separator and surrounding
/// whitespace. Anything that does not parse to a finite number gives zero.
pub fn parse_decimal(value: &str) -> f64 {
    match value.trim().replace(',', ".").parse::<f64>() {
        Ok(x) if x.is_finite() => x,
        _ => 0.0,
    }
}

/// Rewrites a decimal string in its shortest form with a dot separator: no sign, padding
/// zeros or exponent. Anything that does not parse gives `"0"`.
pub fn normalize_decimal(value: &str) -> String {
    let x = parse_decimal(value);
    // Also folds -0 into 0.
    if x == 0.0 {
        "0".to_string()
    } else {
        x.to_string()
    }
}

/// The table of party aliases: comparison key of a known spelling to the official label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyAliases {
    aliases: HashMap<String, String>,
    // Comparison key of every official label to the label itself. The labels are fixed
    // points of `canonical_party`.
    official: HashMap<String, String>,
}

impl PartyAliases {
    pub fn empty() -> PartyAliases {
        PartyAliases::default()
    }

    /// Builds the table from `(alias, official label)` pairs. The aliases are reduced to
    /// their comparison keys.
    pub fn new<I, K, V>(pairs: I) -> PartyAliases
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut official: HashMap<String, String> = HashMap::new();
        let mut aliases: HashMap<String, String> = HashMap::new();
        for (k, v) in pairs {
            let label = official
                .entry(simplify(v.as_ref()))
                .or_insert_with(|| v.as_ref().to_string())
                .clone();
            aliases.insert(simplify(k.as_ref()), label);
        }
        debug!(
            "PartyAliases::new: {} aliases, {} official labels",
            aliases.len(),
            official.len()
        );
        PartyAliases { aliases, official }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The official label of a party, or the title-cased name when the table does not
    /// know it.
    pub fn canonical_party(&self, raw: &str) -> String {
        let key = simplify(raw);
        self.official
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .cloned()
            .unwrap_or_else(|| title_case(raw.trim()))
    }
}

const DEPARTMENT_DISPLAY_NAMES: [(&str, &str); 19] = [
    ("ARTIGAS", "Artigas"),
    ("CANELONES", "Canelones"),
    ("CERRO LARGO", "Cerro Largo"),
    ("COLONIA", "Colonia"),
    ("DURAZNO", "Durazno"),
    ("FLORES", "Flores"),
    ("FLORIDA", "Florida"),
    ("LAVALLEJA", "Lavalleja"),
    ("MALDONADO", "Maldonado"),
    ("MONTEVIDEO", "Montevideo"),
    ("PAYSANDU", "Paysandú"),
    ("RIO NEGRO", "Río Negro"),
    ("RIVERA", "Rivera"),
    ("ROCHA", "Rocha"),
    ("SALTO", "Salto"),
    ("SAN JOSE", "San José"),
    ("SORIANO", "Soriano"),
    ("TACUAREMBO", "Tacuarembó"),
    ("TREINTA Y TRES", "Treinta y Tres"),
];

/// The official spelling of a department name, whatever its case or accents.
pub fn department_display_name(name: &str) -> String {
    let key = simplify(name);
    DEPARTMENT_DISPLAY_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, display)| display.to_string())
        .unwrap_or_else(|| title_case(name.trim()))
}

const ACCENTED_NAMES: [(&str, &str); 14] = [
    ("MARIA", "María"),
    ("JOSE", "José"),
    ("JESUS", "Jesús"),
    ("MARTIN", "Martín"),
    ("ANGEL", "Ángel"),
    ("SEBASTIAN", "Sebastián"),
    ("ANDRES", "Andrés"),
    ("RAMON", "Ramón"),
    ("CESAR", "César"),
    ("ALVARO", "Álvaro"),
    ("GERMAN", "Germán"),
    ("RAUL", "Raúl"),
    ("OSCAR", "Óscar"),
    ("JOAQUIN", "Joaquín"),
];

const CONNECTORS: [&str; 10] = ["de", "del", "la", "las", "los", "y", "e", "a", "en", "el"];

lazy_static! {
    // Separators between the first candidate of a label and the others, tried in order.
    static ref FIRST_CANDIDATE_RX: Vec<Regex> = vec![
        Regex::new(r"^([^/]+)/").unwrap(),
        Regex::new(r"(?i)^(.+?) y ").unwrap(),
        Regex::new(r"^([^-]+)-").unwrap(),
        Regex::new(r"^([^,]+),").unwrap(),
        Regex::new(r"^([^(]+)\(").unwrap(),
    ];
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Formats the name of the first candidate found in a list description.
///
/// `"MARIA DE LOS ANGELES PEREZ / JUAN GOMEZ"` gives `"María de los Angeles Perez"`.
/// Empty descriptions give [`UNAVAILABLE`].
pub fn format_candidate_name(raw: &str) -> String {
    let mut name = raw.trim();
    if name.is_empty() || name == UNAVAILABLE {
        return UNAVAILABLE.to_string();
    }
    if let Some(cap) = FIRST_CANDIDATE_RX
        .iter()
        .find_map(|rx| rx.captures(name).and_then(|c| c.get(1)))
    {
        name = cap.as_str().trim();
    }

    let lower = name.to_lowercase();
    let words: Vec<String> = lower
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let upper = word.to_uppercase();
            if let Some((_, accented)) = ACCENTED_NAMES.iter().find(|(k, _)| *k == upper) {
                accented.to_string()
            } else if i > 0 && CONNECTORS.contains(&word) {
                word.to_string()
            } else {
                word.split('\'').map(capitalize).collect::<Vec<_>>().join("'")
            }
        })
        .collect();
    if words.is_empty() {
        return UNAVAILABLE.to_string();
    }
    words.join(" ")
}
