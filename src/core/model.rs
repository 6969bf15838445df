// strings-scanner - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Heuristic names
// =============================================================================

/// Name of a heuristic category, e.g. "PDB" or "URL".
///
/// Drawn from the closed set declared by the `HeuristicSet` in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeuristicName(String);

impl HeuristicName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeuristicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for HeuristicName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Content identifier
// =============================================================================

/// Lowercase hex SHA-256 of a string value's UTF-8 bytes.
///
/// Stable across batches and samples, so the reporting service can
/// deduplicate identical values independent of which heuristic matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an already-computed hex digest. Callers outside `core::fingerprint`
    /// should use `fingerprint()` instead.
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tasks and batches
// =============================================================================

/// A task as delivered by the queue transport.
///
/// Headers carry routing metadata (`type`, `stage`, `kind`); the payload is
/// left untyped until `StringBatch::from_payload` validates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Validated task payload: one sample and the strings extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBatch {
    /// Hex-encoded SHA-256 of the sample's bytes.
    pub sample_id: String,
    /// Extracted strings, in the order the extractor produced them.
    pub strings: Vec<String>,
}

// =============================================================================
// Match records
// =============================================================================

/// One (string, heuristic) match, destined for a single report call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub value: String,
    pub content_id: ContentId,
    pub heuristic: HeuristicName,
    pub sample_id: String,
}

impl MatchRecord {
    /// JSON body sent to the reporting service.
    pub fn body(&self) -> StringReport<'_> {
        StringReport {
            value: &self.value,
            sha256: self.content_id.as_str(),
            heuristic: self.heuristic.as_str(),
        }
    }
}

/// Wire shape of a report: `{"value", "sha256", "heuristic"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringReport<'a> {
    pub value: &'a str,
    pub sha256: &'a str,
    pub heuristic: &'a str,
}

// =============================================================================
// Processing results
// =============================================================================

/// Counters describing how one batch was processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub sample_id: String,
    /// Strings examined.
    pub strings_scanned: usize,
    /// (string, heuristic) matches found, before duplicate suppression.
    pub matches: usize,
    /// Report calls that succeeded.
    pub reported: usize,
    /// Report calls that failed.
    pub failed: usize,
    /// Matches not reported because the same (value, heuristic) pair was
    /// already reported in this batch.
    pub suppressed_duplicates: usize,
}
