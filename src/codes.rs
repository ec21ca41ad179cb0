//! Hierarchical inventory codes.
//!
//! Parks get a three-letter prefix, areas extend it (`BOU-NO`), species get
//! their own three-letter code, and trees combine both with a sequence
//! number: `BOU-NO-JAM-001`, or `BOU-XX-JAM-001` when the tree is outside
//! every area. Uniqueness is checked against the database through
//! [`CodeIndex`], trying candidates in a fixed order until one is free.

use crate::config::CodeSettings;
use crate::constants::{
    AREA_CODE_LEN, CODE_PAD_CHAR, GENERIC_WORDS, PARK_CODE_LEN, SPECIES_CODE_LEN, STOPWORDS,
    UNASSIGNED_AREA_SEGMENT,
};
use crate::error::{ParksError, Result};
use crate::metrics;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("trailing number pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Park,
    Area,
    Species,
    Tree,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Park => "park",
            CodeKind::Area => "area",
            CodeKind::Species => "species",
            CodeKind::Tree => "tree",
        }
    }
}

/// Lookup of codes already in use.
pub trait CodeIndex {
    fn code_exists(&self, kind: CodeKind, code: &str) -> Result<bool>;

    /// All codes of `kind` starting with `prefix`.
    fn codes_with_prefix(&self, kind: CodeKind, prefix: &str) -> Result<Vec<String>>;
}

fn fold_char(c: char) -> char {
    match c {
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        c if c.is_ascii_alphanumeric() => c,
        _ => ' ',
    }
}

/// Uppercase, accent-free, alphanumeric words separated by single spaces.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(char::to_uppercase)
        .map(fold_char)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized words with stopwords and generic place words removed, unless
/// removing them would leave nothing.
pub fn significant_words(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let all: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    let without_stopwords: Vec<&str> = all
        .iter()
        .copied()
        .filter(|w| !STOPWORDS.contains(w))
        .collect();
    if without_stopwords.is_empty() {
        return all.into_iter().map(str::to_string).collect();
    }

    let specific: Vec<&str> = without_stopwords
        .iter()
        .copied()
        .filter(|w| !GENERIC_WORDS.contains(w))
        .collect();
    let chosen = if specific.is_empty() {
        without_stopwords
    } else {
        specific
    };
    chosen.into_iter().map(str::to_string).collect()
}

fn base_from_words(words: &[String], len: usize) -> String {
    let mut code = String::with_capacity(len);
    if words.len() >= len {
        code.extend(words.iter().take(len).filter_map(|w| w.chars().next()));
    } else {
        let from_first = len - (words.len() - 1);
        code.extend(words[0].chars().take(from_first));
        code.extend(words[1..].iter().filter_map(|w| w.chars().next()));
    }
    while code.chars().count() < len {
        code.push(CODE_PAD_CHAR);
    }
    code
}

/// The unprobed code for `text`.
pub fn base_code(text: &str, len: usize) -> Result<String> {
    let words = significant_words(text);
    if words.is_empty() {
        return Err(ParksError::validation(format!(
            "cannot derive a code from '{text}'"
        )));
    }
    Ok(base_from_words(&words, len))
}

/// Every candidate for `text` in probe order, without duplicates: the base,
/// then the base with its last letter replaced by each further letter of
/// the name, then the base followed by `A`..`Z`.
pub fn candidates(text: &str, len: usize) -> Result<Vec<String>> {
    let words = significant_words(text);
    if words.is_empty() {
        return Err(ParksError::validation(format!(
            "cannot derive a code from '{text}'"
        )));
    }
    let base = base_from_words(&words, len);
    let stem: String = base.chars().take(len - 1).collect();

    let mut out = vec![base.clone()];
    let mut push = |candidate: String| {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    };

    for c in words.concat().chars().skip(1) {
        push(format!("{stem}{c}"));
    }
    for c in 'A'..='Z' {
        push(format!("{base}{c}"));
    }
    Ok(out)
}

/// Normalize a caller-supplied park prefix.
pub fn normalize_explicit_code(raw: &str) -> Result<String> {
    let code: String = normalize(raw).chars().filter(|c| *c != ' ').collect();
    if !(2..=8).contains(&code.len()) {
        return Err(ParksError::validation(format!(
            "code prefix '{raw}' must have between 2 and 8 letters or digits"
        )));
    }
    Ok(code)
}

/// Prefix shared by every tree of one species in one area (or unassigned
/// part of a park), including the trailing separator.
pub fn tree_code_prefix(area_code: Option<&str>, park_prefix: &str, species_code: &str) -> String {
    match area_code {
        Some(area) => format!("{area}-{species_code}-"),
        None => format!("{park_prefix}-{UNASSIGNED_AREA_SEGMENT}-{species_code}-"),
    }
}

pub struct CodeGenerator<'a, I: CodeIndex + ?Sized> {
    index: &'a I,
    settings: CodeSettings,
}

impl<'a, I: CodeIndex + ?Sized> CodeGenerator<'a, I> {
    pub fn new(index: &'a I, settings: CodeSettings) -> Self {
        Self { index, settings }
    }

    pub fn park_prefix(&self, park_name: &str) -> Result<String> {
        self.probe(CodeKind::Park, candidates(park_name, PARK_CODE_LEN)?)
    }

    pub fn area_code(&self, park_prefix: &str, area_name: &str) -> Result<String> {
        // `XX` marks trees outside every area and is never an area segment.
        let scoped = candidates(area_name, AREA_CODE_LEN)?
            .into_iter()
            .filter(|c| c != UNASSIGNED_AREA_SEGMENT)
            .map(|c| format!("{park_prefix}-{c}"))
            .collect();
        self.probe(CodeKind::Area, scoped)
    }

    pub fn species_code(&self, species_name: &str) -> Result<String> {
        self.probe(CodeKind::Species, candidates(species_name, SPECIES_CODE_LEN)?)
    }

    /// Next free tree code under `prefix` (see [`tree_code_prefix`]).
    pub fn tree_code(&self, prefix: &str) -> Result<String> {
        let existing = self.index.codes_with_prefix(CodeKind::Tree, prefix)?;
        let highest = existing
            .iter()
            .filter_map(|code| code.strip_prefix(prefix))
            .filter_map(|rest| TRAILING_NUMBER.captures(rest))
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        let first = highest
            .checked_add(1)
            .ok_or_else(|| ParksError::CodeExhausted {
                kind: CodeKind::Tree.as_str(),
                base: prefix.to_string(),
            })?;

        let width = self.settings.sequence_width;
        let sequences = (first..=u64::MAX).take(self.settings.max_attempts);
        let candidates = sequences.map(|seq| format!("{prefix}{seq:0width$}")).collect();
        self.probe(CodeKind::Tree, candidates)
    }

    fn probe(&self, kind: CodeKind, candidates: Vec<String>) -> Result<String> {
        let base = candidates.first().cloned().unwrap_or_default();
        let mut collisions = 0;
        for candidate in candidates.into_iter().take(self.settings.max_attempts) {
            if !self.index.code_exists(kind, &candidate)? {
                metrics::record_code_generated(kind.as_str(), collisions);
                debug!(kind = kind.as_str(), code = %candidate, collisions, "Generated code");
                return Ok(candidate);
            }
            collisions += 1;
        }
        Err(ParksError::CodeExhausted {
            kind: kind.as_str(),
            base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    impl CodeIndex for HashSet<String> {
        fn code_exists(&self, _kind: CodeKind, code: &str) -> Result<bool> {
            Ok(self.contains(code))
        }

        fn codes_with_prefix(&self, _kind: CodeKind, prefix: &str) -> Result<Vec<String>> {
            Ok(self
                .iter()
                .filter(|c| c.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn taken(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn normalize_folds_accents_and_punctuation() {
        assert_eq!(normalize("  Jardín   Botánico, Ñuñoa! "), "JARDIN BOTANICO NUNOA");
        assert_eq!(normalize("Güero's Café"), "GUERO S CAFE");
    }

    #[test]
    fn stopwords_and_generic_words_dropped() {
        assert_eq!(
            significant_words("Parque de la Solidaridad"),
            vec!["SOLIDARIDAD"]
        );
        assert_eq!(significant_words("Parque"), vec!["PARQUE"]);
        assert_eq!(significant_words("De La"), vec!["DE", "LA"]);
    }

    #[test]
    fn base_codes() {
        assert_eq!(base_code("Parque Bosque Urbano", 3).unwrap(), "BOU");
        assert_eq!(base_code("Los Colomos", 3).unwrap(), "COL");
        assert_eq!(base_code("Parque Agua Azul Grande Norte", 3).unwrap(), "AAG");
        assert_eq!(base_code("Jacaranda mimosifolia", 3).unwrap(), "JAM");
        assert_eq!(base_code("Zona Norte", 2).unwrap(), "NO");
        assert_eq!(base_code("Área de Juegos Infantiles", 2).unwrap(), "JI");
        assert_eq!(base_code("Ox", 3).unwrap(), "OXX");
        assert!(base_code("¡¡!!", 3).is_err());
    }

    #[test]
    fn candidate_order() {
        let all = candidates("Zona Norte", 2).unwrap();
        assert_eq!(&all[..4], &["NO", "NR", "NT", "NE"]);
        assert_eq!(all[4], "NOA");
        assert_eq!(all.len(), 4 + 26);
    }

    #[test]
    fn probe_skips_taken_codes() {
        let index = taken(&["BOU", "BOO"]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        // letters after the initial B: O, S, Q, ... so BOU, BOO, BOS
        assert_eq!(gen.park_prefix("Parque Bosque Urbano").unwrap(), "BOS");
    }

    #[test]
    fn area_codes_are_scoped_to_the_park() {
        let index = taken(&["BOU-NO"]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        assert_eq!(gen.area_code("BOU", "Zona Norte").unwrap(), "BOU-NR");
        assert_eq!(gen.area_code("COL", "Zona Norte").unwrap(), "COL-NO");
    }

    #[test]
    fn area_codes_skip_the_unassigned_segment() {
        let index = taken(&[]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        assert_eq!(base_code("Xochitl Xalapa", 2).unwrap(), "XX");
        assert_eq!(gen.area_code("BOU", "Xochitl Xalapa").unwrap(), "BOU-XO");
    }

    #[test]
    fn exhaustion_is_reported() {
        let index = taken(&["ABX", "ABB", "ABXA"]);
        let settings = CodeSettings {
            max_attempts: 3,
            ..CodeSettings::default()
        };
        let gen = CodeGenerator::new(&index, settings);
        // candidates: ABX (padded), ABB, ABXA, ABXB, ...
        let err = gen.species_code("Ab").unwrap_err();
        assert!(matches!(err, ParksError::CodeExhausted { kind: "species", .. }));
    }

    #[test]
    fn tree_sequences_continue_from_highest() {
        let index = taken(&[
            "BOU-NO-JAM-001",
            "BOU-NO-JAM-007",
            "BOU-NO-JAMX-050",
            "BOU-XX-JAM-020",
        ]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        let prefix = tree_code_prefix(Some("BOU-NO"), "BOU", "JAM");
        assert_eq!(gen.tree_code(&prefix).unwrap(), "BOU-NO-JAM-008");

        let unassigned = tree_code_prefix(None, "BOU", "JAM");
        assert_eq!(unassigned, "BOU-XX-JAM-");
        assert_eq!(gen.tree_code(&unassigned).unwrap(), "BOU-XX-JAM-021");

        let fresh = tree_code_prefix(None, "COL", "FIC");
        assert_eq!(gen.tree_code(&fresh).unwrap(), "COL-XX-FIC-001");
    }

    #[test]
    fn sequence_at_u64_max_is_exhausted() {
        let index = taken(&["BOU-XX-JAM-18446744073709551615"]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        let err = gen.tree_code("BOU-XX-JAM-").unwrap_err();
        assert!(matches!(err, ParksError::CodeExhausted { kind: "tree", .. }));

        let index = taken(&["BOU-XX-JAM-18446744073709551614"]);
        let gen = CodeGenerator::new(&index, CodeSettings::default());
        assert_eq!(
            gen.tree_code("BOU-XX-JAM-").unwrap(),
            "BOU-XX-JAM-18446744073709551615"
        );
    }

    #[test]
    fn explicit_codes_are_normalized() {
        assert_eq!(normalize_explicit_code(" mé-x ").unwrap(), "MEX");
        assert!(normalize_explicit_code("a").is_err());
        assert!(normalize_explicit_code("abcdefghij").is_err());
    }
}
