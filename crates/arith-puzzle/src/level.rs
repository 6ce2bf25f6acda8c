//! Difficulty levels.
//!
//! A level bundles the sampling ranges and the numeric policy the solver
//! prunes with. Levels come from the built-in presets or from a JSON file
//! using the same camelCase keys:
//!
//! ```json
//! {
//!   "id": "level1",
//!   "numberRange": [1, 20],
//!   "targetRange": [50, 100],
//!   "operators": ["+", "-"],
//!   "allowDecimals": false,
//!   "maxOperations": 3
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LevelError, LoadError};
use crate::puzzle::Operator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Inclusive range each element is sampled from
    pub number_range: (i64, i64),
    /// Inclusive range the candidate target is sampled from
    #[serde(alias = "solvableRange")]
    pub target_range: (i64, i64),
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub allow_decimals: bool,
    /// Upper bound on steps in a solution path
    pub max_operations: usize,
    #[serde(default)]
    pub can_use_sqrt: bool,
}

impl Level {
    pub fn level1() -> Self {
        Self {
            id: "level1".to_string(),
            title: "Level 1: Basic Operations".to_string(),
            description: "Single-digit and small two-digit numbers with addition and subtraction."
                .to_string(),
            number_range: (1, 20),
            target_range: (50, 100),
            operators: vec![Operator::Add, Operator::Sub],
            allow_decimals: false,
            max_operations: 3,
            can_use_sqrt: false,
        }
    }

    pub fn level2() -> Self {
        Self {
            id: "level2".to_string(),
            title: "Level 2: Intermediate Operations".to_string(),
            description: "Larger whole numbers with multiplication and exact division.".to_string(),
            number_range: (1, 100),
            target_range: (100, 500),
            operators: vec![Operator::Add, Operator::Sub, Operator::Mul, Operator::Div],
            allow_decimals: false,
            max_operations: 4,
            can_use_sqrt: false,
        }
    }

    pub fn level3() -> Self {
        Self {
            id: "level3".to_string(),
            title: "Level 3: Lower Secondary Mathematics".to_string(),
            description: "Negative numbers, decimals, small powers and square roots.".to_string(),
            number_range: (-10, 50),
            target_range: (-50, 500),
            operators: vec![
                Operator::Add,
                Operator::Sub,
                Operator::Mul,
                Operator::Div,
                Operator::Pow,
            ],
            allow_decimals: true,
            max_operations: 5,
            can_use_sqrt: true,
        }
    }

    /// All built-in levels, easiest first
    pub fn presets() -> Vec<Level> {
        vec![Self::level1(), Self::level2(), Self::level3()]
    }

    /// Find a built-in level by id
    pub fn preset(id: &str) -> Result<Level, LevelError> {
        Self::presets()
            .into_iter()
            .find(|level| level.id == id)
            .ok_or_else(|| LevelError::UnknownLevel(id.to_string()))
    }

    /// Parse and validate a level from JSON text
    pub fn from_json(json: &str) -> Result<Level, LoadError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Load and validate a level from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Level, LoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        let (min, max) = self.number_range;
        if min > max {
            return Err(LevelError::EmptyNumberRange {
                id: self.id.clone(),
                min,
                max,
            });
        }
        let (min, max) = self.target_range;
        if min > max {
            return Err(LevelError::EmptyTargetRange {
                id: self.id.clone(),
                min,
                max,
            });
        }
        if self.operators.is_empty() {
            return Err(LevelError::NoOperators {
                id: self.id.clone(),
            });
        }
        if self.max_operations == 0 {
            return Err(LevelError::ZeroOperations {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Check if a player formula may use this operator
    pub fn allows(&self, op: Operator) -> bool {
        match op {
            Operator::Sqrt => self.can_use_sqrt,
            _ => self.operators.contains(&op),
        }
    }
}
