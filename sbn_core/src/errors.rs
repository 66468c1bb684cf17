//! Error types for network construction, configuration and queries.
use thiserror::Error;

/// Structural problems with a network. A query over a malformed network
/// can never succeed, the network must be fixed first.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    #[error("variable `{0}` is already declared")]
    DuplicateVariable(String),
    #[error("variable `{0}` is not declared in the network")]
    UnknownVariable(String),
    #[error("variable `{var}` has no state `{state}`")]
    UnknownState { var: String, state: String },
    #[error("`{0}` is not a valid name, use letters, digits, `_` or `-`")]
    InvalidName(String),
    #[error("inconsistent network structure: {0}")]
    Inconsistent(String),
    #[error("variable `{0}` requires at least one state")]
    NoStates(String),
    #[error("variable `{var}` declares state `{state}` more than once")]
    DuplicateState { var: String, state: String },
    #[error("variable `{0}` cannot be its own parent")]
    SelfParent(String),
    #[error("table for `{var}` requires {expected} entries, got {got}")]
    TableShape {
        var: String,
        expected: usize,
        got: usize,
    },
    #[error("table for `{var}`: row {row} sums to {sum} (expected 1.0)")]
    RowNotNormalized { var: String, row: usize, sum: f64 },
    #[error("table for `{var}` contains an illegal probability: {value}")]
    IllegalProbability { var: String, value: f64 },
    #[error("variable `{0}` has no probability table")]
    MissingTable(String),
    #[error("variables can never be evaluated (cyclic or dangling dependency): {}", .0.join(", "))]
    Unevaluable(Vec<String>),
}

/// Errors reported to the caller of a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryErr {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("variable `{var}` has no state `{state}`")]
    UnknownState { var: String, state: String },
    #[error("sample count must be a positive integer")]
    NonPositiveSampleCount,
    #[error("thinning interval must be a positive integer")]
    NonPositiveThinning,
    #[error("malformed network: {0}")]
    Net(#[from] NetError),
    #[error("no samples were counted for `{0}`")]
    Degenerate(String),
}

/// Invalid sampler configuration values.
#[derive(Debug, Error)]
pub enum ConfErr {
    #[error("failed loading configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("configuration value `{key}` is out of range: {value}")]
    OutOfRange { key: &'static str, value: i64 },
}

/// Failures while reading a network description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErr {
    #[error("sbn parser: syntax error at: {0}")]
    Syntax(String),
    #[error("sbn parser: expected `{expected}` at: {found}")]
    Expected {
        expected: &'static str,
        found: String,
    },
    #[error("sbn parser: {0}")]
    Net(#[from] NetError),
    #[error("sbn parser: {0}")]
    Evidence(#[from] QueryErr),
}
