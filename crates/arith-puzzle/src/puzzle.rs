//! Puzzle value types shared by the solver, the generator and the CLI.
//!
//! These types serialize to the same camelCase JSON shape the game front
//! end consumes (`elements`, `target`, `solution`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of elements presented to the player
pub const ELEMENT_COUNT: usize = 4;

/// Labels the player uses for the elements, in slot order
pub const ELEMENT_LABELS: [char; ELEMENT_COUNT] = ['A', 'B', 'C', 'D'];

/// Operator - matches the symbols used in level JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "^")]
    Pow,
    #[serde(rename = "sqrt")]
    Sqrt,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
        Operator::Sqrt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "^",
            Operator::Sqrt => "sqrt",
        }
    }

    /// Look up an operator by its symbol
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Check if this operator takes a single operand
    pub fn is_unary(self) -> bool {
        self == Operator::Sqrt
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A number available to the search.
///
/// A token with an `origin` is one of the original elements that has not
/// been folded into anything yet. Derived tokens carry no origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberToken {
    pub value: f64,
    pub origin: Option<usize>,
}

impl NumberToken {
    pub fn original(value: f64, slot: usize) -> Self {
        Self {
            value,
            origin: Some(slot),
        }
    }

    pub fn derived(value: f64) -> Self {
        Self {
            value,
            origin: None,
        }
    }
}

/// One combine step of a solution path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub operator: Operator,
    pub left: f64,
    /// Absent for unary steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    pub result: f64,
}

impl Step {
    pub fn binary(operator: Operator, left: f64, right: f64, result: f64) -> Self {
        Self {
            operator,
            left,
            right: Some(right),
            result,
        }
    }

    pub fn unary(operator: Operator, operand: f64, result: f64) -> Self {
        Self {
            operator,
            left: operand,
            right: None,
            result,
        }
    }

    pub fn is_unary(&self) -> bool {
        self.right.is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.right {
            Some(right) => write!(
                f,
                "{} {} {} = {}",
                self.left, self.operator, right, self.result
            ),
            None => write!(f, "{}({}) = {}", self.operator, self.left, self.result),
        }
    }
}

/// A generated puzzle. Only ever built from a successful search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub level_id: String,
    /// Elements in slot order (A, B, C, D)
    pub elements: [i64; ELEMENT_COUNT],
    pub target: i64,
    pub solution: Vec<Step>,
}

impl Problem {
    /// Get the value behind an element label ('A'..='D')
    pub fn element(&self, label: char) -> Option<i64> {
        ELEMENT_LABELS
            .iter()
            .position(|&l| l == label)
            .map(|slot| self.elements[slot])
    }

    pub fn element_values(&self) -> [f64; ELEMENT_COUNT] {
        self.elements.map(|e| e as f64)
    }

    /// Human-readable solution lines, e.g. `"5 + 3 = 8"`
    pub fn solution_lines(&self) -> Vec<String> {
        self.solution.iter().map(Step::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        let add = Step::binary(Operator::Add, 5.0, 3.0, 8.0);
        assert_eq!(add.to_string(), "5 + 3 = 8");

        let div = Step::binary(Operator::Div, 7.0, 2.0, 3.5);
        assert_eq!(div.to_string(), "7 / 2 = 3.5");

        let root = Step::unary(Operator::Sqrt, 16.0, 4.0);
        assert_eq!(root.to_string(), "sqrt(16) = 4");
    }

    #[test]
    fn test_operator_symbols() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol("%"), None);
        assert!(Operator::Sqrt.is_unary());
        assert!(!Operator::Pow.is_unary());
    }

    #[test]
    fn test_operator_json() {
        let ops: Vec<Operator> = serde_json::from_str(r#"["+", "-", "^", "sqrt"]"#).unwrap();
        assert_eq!(
            ops,
            vec![Operator::Add, Operator::Sub, Operator::Pow, Operator::Sqrt]
        );
    }

    #[test]
    fn test_problem_element_lookup() {
        let problem = Problem {
            level_id: "level1".to_string(),
            elements: [5, 3, 2, 7],
            target: 10,
            solution: Vec::new(),
        };
        assert_eq!(problem.element('A'), Some(5));
        assert_eq!(problem.element('D'), Some(7));
        assert_eq!(problem.element('E'), None);
    }

    #[test]
    fn test_unary_step_omits_right_in_json() {
        let json = serde_json::to_value(Step::unary(Operator::Sqrt, 9.0, 3.0)).unwrap();
        assert!(json.get("right").is_none());
        assert_eq!(json["operator"], "sqrt");
    }
}
