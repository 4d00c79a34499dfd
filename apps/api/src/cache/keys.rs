//! Cache key derivation.
//!
//! Keys are `<namespace>:<segment>`. Content segments are SHA-256 digests
//! truncated to 128 bits, so logically identical inputs always share a key and
//! distinct inputs collide only with negligible probability.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub const CV_ANALYSIS: &str = "cv_analysis";
pub const JD_ANALYSIS: &str = "jd_analysis";
pub const CANDIDATE_RANKING: &str = "candidate_ranking";
pub const API: &str = "api";
pub const SESSION: &str = "session";

/// Hex characters kept from the digest (32 hex = 128 bits).
const DIGEST_HEX_LEN: usize = 32;

/// Separates the two halves of a text pair. NUL does not occur in user text.
const PAIR_SEPARATOR: char = '\u{0}';

/// Hex digest of arbitrary bytes, truncated to 128 bits.
pub fn digest(bytes: &[u8]) -> String {
    let mut hex = hex::encode(Sha256::digest(bytes));
    hex.truncate(DIGEST_HEX_LEN);
    hex
}

/// Digest of an ordered text pair, e.g. (CV text, job description text).
pub fn text_pair_digest(first: &str, second: &str) -> String {
    let mut joined = String::with_capacity(first.len() + second.len() + 1);
    joined.push_str(first);
    joined.push(PAIR_SEPARATOR);
    joined.push_str(second);
    digest(joined.as_bytes())
}

/// Recursively sorts object keys so serialization is insertion-order free.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Digest of a structured parameter object after canonicalization.
pub fn params_digest(params: &Value) -> String {
    // Serializing a `Value` cannot fail.
    let canonical = serde_json::to_string(&canonicalize(params)).unwrap_or_default();
    digest(canonical.as_bytes())
}

/// `api:<path>:<digest(params)>` for a GET response.
pub fn api_key(path: &str, params: &Value) -> String {
    format!("{API}:{path}:{}", params_digest(params))
}

pub fn cv_analysis_key(cv_text: &str, jd_text: &str) -> String {
    format!("{CV_ANALYSIS}:{}", text_pair_digest(cv_text, jd_text))
}

pub fn jd_analysis_key(jd_text: &str) -> String {
    format!("{JD_ANALYSIS}:{}", digest(jd_text.as_bytes()))
}

pub fn candidate_ranking_key(params: &Value) -> String {
    format!("{CANDIDATE_RANKING}:{}", params_digest(params))
}

pub fn session_key(user_id: &str) -> String {
    format!("{SESSION}:{user_id}")
}

/// Pattern matching every cached GET response under a path prefix.
pub fn api_prefix_pattern(path_prefix: &str) -> String {
    format!("{API}:{}*", escape_glob(path_prefix))
}

/// Escapes glob metacharacters so a literal key can be used as a pattern.
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
