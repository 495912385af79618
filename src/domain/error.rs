//! Error types for tagscope.

use thiserror::Error;

/// Error raised while parsing or rewriting a configuration fragment.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Malformed directive source text
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Strict mode rejected a top-level directive
    #[error("strict mode only allows 'match' and 'filter' tags, not '{name}'")]
    StrictMode { name: String },

    /// Tag does not resolve to the namespace prefix
    #[error("bad tag for <{name}>: {tag}. Tag must start with **, $thisns or {namespace}")]
    BadTag {
        name: String,
        tag: String,
        namespace: String,
    },

    /// Malformed `$labels(...)` or `$from(...)` macro
    #[error("bad macro use in tag '{tag}': {reason}")]
    BadMacro { tag: String, reason: String },

    /// Plugin type rejected by the allow-list
    #[error("<{name}> uses @type {kind} which is not in the allowed plugin types")]
    TypeNotAllowed { name: String, kind: String },

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
