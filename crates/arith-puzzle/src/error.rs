use thiserror::Error;

use crate::puzzle::Operator;

/// A level configuration that cannot be used for generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level `{id}`: number range [{min}, {max}] is empty")]
    EmptyNumberRange { id: String, min: i64, max: i64 },
    #[error("level `{id}`: target range [{min}, {max}] is empty")]
    EmptyTargetRange { id: String, min: i64, max: i64 },
    #[error("level `{id}`: no operators allowed")]
    NoOperators { id: String },
    #[error("level `{id}`: maxOperations must be at least 1")]
    ZeroOperations { id: String },
    #[error("unknown level `{0}`")]
    UnknownLevel(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] LevelError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    InvalidLevel(#[from] LevelError),
    #[error("no solvable problem found after {attempts} attempts")]
    Exhausted { attempts: usize },
}

/// Rejection of a player formula. The problem stays as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("please enter a formula")]
    Empty,
    #[error("unexpected character `{ch}` at position {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("numbers cannot be typed directly (found `{0}`); use A, B, C and D")]
    Literal(String),
    #[error("only A, B, C, D are allowed as variables (found `{0}`)")]
    UnknownVariable(String),
    #[error("element {label} must be used exactly once (used {count} times)")]
    ElementUsage { label: char, count: usize },
    #[error("operator `{0}` is not allowed on this level")]
    DisallowedOperator(Operator),
    #[error("unexpected `{found}` at position {position}")]
    UnexpectedToken { found: String, position: usize },
    #[error("formula ends unexpectedly")]
    UnexpectedEnd,
    #[error("could not evaluate formula: {0}")]
    Syntax(String),
    #[error("result is not a real number")]
    NotReal,
    #[error("result is not a finite number")]
    NotFinite,
}

impl From<meval::Error> for FormulaError {
    fn from(err: meval::Error) -> Self {
        FormulaError::Syntax(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("no active problem; generate one first")]
    NoProblem,
    #[error(transparent)]
    Formula(#[from] FormulaError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}
