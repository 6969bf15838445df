// strings-scanner - core/heuristics.rs
//
// Heuristic table loading, validation, and string classification.
// Core layer: accepts TOML strings and in-memory definitions, never touches
// the filesystem. The built-in table is embedded at compile time.

use crate::core::model::HeuristicName;
use crate::util::constants;
use crate::util::error::PatternCompilationError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

// =============================================================================
// Definitions (raw input)
// =============================================================================

/// Raw heuristic table as deserialized from TOML.
///
/// Uses an array of tables so declaration order survives parsing.
#[derive(Debug, Deserialize)]
pub struct HeuristicTable {
    #[serde(default, rename = "heuristic")]
    pub heuristics: Vec<HeuristicDef>,
}

/// One named heuristic and its pattern sources, in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicDef {
    pub name: String,
    pub patterns: Vec<String>,
}

impl HeuristicDef {
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Embedded TOML source of the built-in heuristic table.
pub fn builtin_table_source() -> &'static str {
    include_str!("../../heuristics/builtin.toml")
}

/// Parse a TOML heuristic table into ordered definitions.
pub fn parse_table_toml(
    toml_content: &str,
) -> Result<Vec<HeuristicDef>, PatternCompilationError> {
    toml::from_str::<HeuristicTable>(toml_content)
        .map(|table| table.heuristics)
        .map_err(|e| PatternCompilationError::TomlParse { source: e })
}

// =============================================================================
// Compiled set
// =============================================================================

/// A heuristic name together with its compiled, start-anchored patterns.
#[derive(Debug, Clone)]
struct CompiledHeuristic {
    name: HeuristicName,
    patterns: Vec<Regex>,
}

/// Immutable, ordered set of compiled heuristics.
///
/// Built once at startup and shared read-only by the worker. Classification
/// is pure: no I/O, no interior mutability.
#[derive(Debug, Clone)]
pub struct HeuristicSet {
    heuristics: Vec<CompiledHeuristic>,
}

impl HeuristicSet {
    /// Build the built-in table (PDB, User-Agent, URL, REG).
    pub fn builtin() -> Result<Self, PatternCompilationError> {
        let defs = parse_table_toml(builtin_table_source())?;
        Self::compile(defs)
    }

    /// Validate and compile an ordered list of heuristic definitions.
    ///
    /// Fails on the first invalid definition; a partially valid table is
    /// never returned.
    pub fn compile(
        defs: impl IntoIterator<Item = HeuristicDef>,
    ) -> Result<Self, PatternCompilationError> {
        let mut seen = HashSet::new();
        let mut heuristics = Vec::new();

        for (index, def) in defs.into_iter().enumerate() {
            if def.name.is_empty() {
                return Err(PatternCompilationError::EmptyName { index });
            }
            if !seen.insert(def.name.clone()) {
                return Err(PatternCompilationError::DuplicateName {
                    heuristic: def.name,
                });
            }
            if def.patterns.is_empty() {
                return Err(PatternCompilationError::NoPatterns {
                    heuristic: def.name,
                });
            }

            let patterns = def
                .patterns
                .iter()
                .map(|source| compile_anchored(&def.name, source))
                .collect::<Result<Vec<_>, _>>()?;

            tracing::debug!(
                heuristic = %def.name,
                patterns = patterns.len(),
                "Compiled heuristic"
            );

            heuristics.push(CompiledHeuristic {
                name: HeuristicName::new(def.name),
                patterns,
            });
        }

        Ok(Self { heuristics })
    }

    /// Names of every heuristic matching `value`, in table order.
    ///
    /// A pattern matches only if a match begins at offset 0 of `value`
    /// (prefix semantics: neither a full-string match nor a search). Each
    /// name appears at most once.
    pub fn classify(&self, value: &str) -> Vec<HeuristicName> {
        self.heuristics
            .iter()
            .filter(|h| h.patterns.iter().any(|p| p.is_match(value)))
            .map(|h| h.name.clone())
            .collect()
    }

    /// Heuristic names in table order.
    pub fn names(&self) -> impl Iterator<Item = &HeuristicName> {
        self.heuristics.iter().map(|h| &h.name)
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }
}

/// Compile `source` so that it can only match starting at offset 0.
fn compile_anchored(heuristic: &str, source: &str) -> Result<Regex, PatternCompilationError> {
    if source.len() > constants::MAX_PATTERN_LENGTH {
        return Err(PatternCompilationError::PatternTooLong {
            heuristic: heuristic.to_string(),
            length: source.len(),
            max_length: constants::MAX_PATTERN_LENGTH,
        });
    }

    // Validate the bare source first so the error points at what the user wrote.
    Regex::new(source).map_err(|e| PatternCompilationError::InvalidRegex {
        heuristic: heuristic.to_string(),
        pattern: source.to_string(),
        source: e,
    })?;

    Regex::new(&format!("^(?:{source})")).map_err(|e| PatternCompilationError::InvalidRegex {
        heuristic: heuristic.to_string(),
        pattern: source.to_string(),
        source: e,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> HeuristicSet {
        HeuristicSet::builtin().unwrap()
    }

    fn names(set: &HeuristicSet, value: &str) -> Vec<String> {
        set.classify(value)
            .into_iter()
            .map(|n| n.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_builtin_table_order() {
        let set = builtin();
        let order: Vec<&str> = set.names().map(|n| n.as_str()).collect();
        assert_eq!(order, vec!["PDB", "User-Agent", "URL", "REG"]);
    }

    #[test]
    fn test_pdb_path() {
        assert_eq!(names(&builtin(), "C:\\sym\\app.pdb"), vec!["PDB"]);
    }

    #[test]
    fn test_end_anchor_is_end_of_text() {
        // `$` is absolute end of input: a trailing newline is not skipped.
        let set = builtin();
        assert_eq!(names(&set, "app.pdb"), vec!["PDB"]);
        assert!(names(&set, "app.pdb\n").is_empty());
        assert!(names(&set, "app.pdb\r\n").is_empty());
    }

    #[test]
    fn test_user_agent() {
        assert_eq!(names(&builtin(), "Mozilla/5.0 (Windows NT)"), vec!["User-Agent"]);
        // The version class is literally [0.9]: minor digit must be 0, '.' or 9.
        assert!(names(&builtin(), "Mozilla/4.5 (compatible)").is_empty());
    }

    #[test]
    fn test_url_accepts_http_and_https() {
        let set = builtin();
        assert_eq!(names(&set, "http://evil.example/payload"), vec!["URL"]);
        assert_eq!(names(&set, "https://evil.example/payload"), vec!["URL"]);
        assert!(names(&set, "ftp://evil.example/payload").is_empty());
    }

    #[test]
    fn test_registry_key() {
        assert_eq!(names(&builtin(), "HKEY_LOCAL_MACHINE\\Software\\X"), vec!["REG"]);
        // No backslash within 20 characters of the prefix.
        assert!(names(&builtin(), "HKEY_LOCAL_MACHINE").is_empty());
        assert!(names(&builtin(), "HKEY_AAAAAAAAAAAAAAAAAAAAAAAAA\\X").is_empty());
    }

    #[test]
    fn test_matching_is_anchored_at_start() {
        let set = builtin();
        // Unanchored search would find these; prefix matching must not.
        assert!(names(&set, "see http://evil.example").is_empty());
        assert!(names(&set, "ua=Mozilla/5.0").is_empty());
        assert!(names(&set, "key HKEY_CURRENT_USER\\Run").is_empty());
    }

    #[test]
    fn test_matching_is_prefix_not_full_string() {
        let set = HeuristicSet::compile(vec![HeuristicDef::new("MZ", &["MZ"])]).unwrap();
        assert_eq!(names(&set, "MZ\u{90}\u{0}rest of header"), vec!["MZ"]);
        assert!(names(&set, "xMZ").is_empty());
    }

    #[test]
    fn test_anchor_applies_to_every_alternative() {
        // Without grouping, "^a|b" would let "b" match anywhere.
        let set = HeuristicSet::compile(vec![HeuristicDef::new("AB", &["a|b"])]).unwrap();
        assert_eq!(names(&set, "b..."), vec!["AB"]);
        assert!(names(&set, "xb").is_empty());
    }

    #[test]
    fn test_multi_match_reports_each_category_once() {
        let set = builtin();
        assert_eq!(names(&set, "http://symbols.example/app.pdb"), vec!["PDB", "URL"]);
    }

    #[test]
    fn test_name_reported_once_when_several_patterns_match() {
        let set = HeuristicSet::compile(vec![HeuristicDef::new(
            "NET",
            &["http://.*", "http.*", ".*"],
        )])
        .unwrap();
        assert_eq!(names(&set, "http://x"), vec!["NET"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let set = builtin();
        assert!(set.classify("kernel32.dll").is_empty());
        assert!(set.classify("").is_empty());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let set = builtin();
        let value = "http://symbols.example/app.pdb";
        assert_eq!(set.classify(value), set.classify(value));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = HeuristicSet::compile(vec![HeuristicDef::new("BAD", &["[unclosed"])]).unwrap_err();
        match err {
            PatternCompilationError::InvalidRegex {
                heuristic, pattern, ..
            } => {
                assert_eq!(heuristic, "BAD");
                assert_eq!(pattern, "[unclosed");
            }
            other => panic!("Expected InvalidRegex, got: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchor() {
        // "a)|(b" would compile once wrapped as "^(?:a)|(b)"; it must be rejected.
        let err = HeuristicSet::compile(vec![HeuristicDef::new("ESC", &["a)|(b"])]).unwrap_err();
        assert!(matches!(err, PatternCompilationError::InvalidRegex { .. }));
    }

    #[test]
    fn test_pattern_too_long_is_rejected() {
        let long = "a".repeat(constants::MAX_PATTERN_LENGTH + 1);
        let err = HeuristicSet::compile(vec![HeuristicDef::new("LONG", &[long.as_str()])])
            .unwrap_err();
        assert!(matches!(err, PatternCompilationError::PatternTooLong { .. }));
    }

    #[test]
    fn test_heuristic_without_patterns_is_rejected() {
        let err = HeuristicSet::compile(vec![HeuristicDef::new("EMPTY", &[])]).unwrap_err();
        assert!(matches!(err, PatternCompilationError::NoPatterns { .. }));
    }

    #[test]
    fn test_duplicate_and_empty_names_are_rejected() {
        let err = HeuristicSet::compile(vec![
            HeuristicDef::new("URL", &["http://"]),
            HeuristicDef::new("URL", &["https://"]),
        ])
        .unwrap_err();
        assert!(matches!(err, PatternCompilationError::DuplicateName { .. }));

        let err = HeuristicSet::compile(vec![HeuristicDef::new("", &["x"])]).unwrap_err();
        assert!(matches!(err, PatternCompilationError::EmptyName { index: 0 }));
    }

    #[test]
    fn test_parse_table_preserves_order() {
        let toml = r#"
[[heuristic]]
name = "Z"
patterns = ["z"]

[[heuristic]]
name = "A"
patterns = ["a", "aa"]
"#;
        let defs = parse_table_toml(toml).unwrap();
        let order: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(order, vec!["Z", "A"]);
        assert_eq!(defs[1].patterns, vec!["a", "aa"]);
    }

    #[test]
    fn test_parse_table_rejects_bad_toml() {
        let err = parse_table_toml("[[heuristic]]\nname = ").unwrap_err();
        assert!(matches!(err, PatternCompilationError::TomlParse { .. }));
    }
}
