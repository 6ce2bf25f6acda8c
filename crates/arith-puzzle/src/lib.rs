//! Arithmetic puzzle generator.
//!
//! Picks four numbers and a target that are guaranteed to be connected by
//! at least one sequence of allowed operations, found with a bounded
//! backtracking search. Also checks the formula a player submits.

pub mod error;
pub mod formula;
pub mod generator;
pub mod level;
pub mod pruning;
pub mod puzzle;
pub mod replay;
pub mod session;
pub mod solver;

// Re-export main types
pub use error::{FormulaError, GenerateError, LevelError, LoadError, SessionError};
pub use formula::{check_formula, evaluate_formula, Verdict};
pub use generator::{GenerationReport, GeneratorConfig, ProblemGenerator, DEFAULT_MAX_ATTEMPTS};
pub use level::Level;
pub use puzzle::{NumberToken, Operator, Problem, Step, ELEMENT_COUNT, ELEMENT_LABELS};
pub use replay::{replay, verify_path, verify_problem, ReplayMetrics, ReplayResult, ReplayStatus};
pub use session::{GameSession, SubmitOutcome};
pub use solver::{find_solution, solve, SearchResult, SearchRules, SearchState};
