//! Player formula checking.
//!
//! A formula is written over the element labels `A`..`D`, the level's
//! operators, parentheses and (when the level allows it) `sqrt(...)`.
//! Each label must appear exactly once as a whole token and typed numbers
//! are rejected. Once it passes those checks the labels are replaced by
//! their values and the expression goes to `meval`; the result is rounded
//! the way the level displays numbers and compared with the target.

use crate::error::FormulaError;
use crate::level::Level;
use crate::pruning::matches_target;
use crate::puzzle::{Operator, Problem, ELEMENT_COUNT, ELEMENT_LABELS};

/// Decimal places kept when a level allows decimals
const DECIMAL_PLACES: i32 = 5;

/// Outcome of a well-formed submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Correct { value: f64 },
    Incorrect { value: f64, target: f64 },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct { .. })
    }

    pub fn value(&self) -> f64 {
        match *self {
            Verdict::Correct { value } | Verdict::Incorrect { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Element(usize),
    Sqrt,
    Ident,
    Number,
    Op(Operator),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    text: String,
    position: usize,
}

fn tokenize(formula: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        let start = index;

        if ch.is_whitespace() {
            index += 1;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            while index < chars.len() && (chars[index].is_alphanumeric() || chars[index] == '_') {
                index += 1;
            }
            let text: String = chars[start..index].iter().collect();
            let kind = match text.as_str() {
                "sqrt" => TokenKind::Sqrt,
                _ => match ELEMENT_LABELS.iter().position(|label| text == label.to_string()) {
                    Some(slot) => TokenKind::Element(slot),
                    None => TokenKind::Ident,
                },
            };
            tokens.push(Token {
                kind,
                text,
                position: start,
            });
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.') {
                index += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text: chars[start..index].iter().collect(),
                position: start,
            });
            continue;
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            _ => match Operator::from_symbol(ch.encode_utf8(&mut [0; 4])) {
                Some(op) => TokenKind::Op(op),
                None => {
                    return Err(FormulaError::UnexpectedChar {
                        ch,
                        position: start,
                    })
                }
            },
        };
        tokens.push(Token {
            kind,
            text: ch.to_string(),
            position: start,
        });
        index += 1;
    }

    Ok(tokens)
}

/// Usage rules that do not depend on the grammar
fn validate_tokens(tokens: &[Token], level: &Level) -> Result<(), FormulaError> {
    let mut counts = [0usize; ELEMENT_COUNT];
    for token in tokens {
        if let TokenKind::Element(slot) = token.kind {
            counts[slot] += 1;
        }
    }
    for (slot, &count) in counts.iter().enumerate() {
        if count != 1 {
            return Err(FormulaError::ElementUsage {
                label: ELEMENT_LABELS[slot],
                count,
            });
        }
    }

    for token in tokens {
        match token.kind {
            TokenKind::Ident => return Err(FormulaError::UnknownVariable(token.text.clone())),
            TokenKind::Sqrt if !level.allows(Operator::Sqrt) => {
                return Err(FormulaError::UnknownVariable(token.text.clone()))
            }
            TokenKind::Number => return Err(FormulaError::Literal(token.text.clone())),
            TokenKind::Op(op) if !level.allows(op) => {
                return Err(FormulaError::DisallowedOperator(op))
            }
            _ => {}
        }
    }
    Ok(())
}

/// `sqrt` must be applied with parentheses, `sqrt(...)`
fn check_sqrt_calls(tokens: &[Token]) -> Result<(), FormulaError> {
    for (index, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Sqrt {
            continue;
        }
        match tokens.get(index + 1) {
            Some(next) if next.kind == TokenKind::LParen => {}
            Some(next) => {
                return Err(FormulaError::UnexpectedToken {
                    found: next.text.clone(),
                    position: next.position,
                })
            }
            None => return Err(FormulaError::UnexpectedEnd),
        }
    }
    Ok(())
}

/// Rebuild the formula with each label replaced by its parenthesised value
fn substitute(tokens: &[Token], values: &[f64; ELEMENT_COUNT]) -> String {
    tokens
        .iter()
        .map(|token| match token.kind {
            TokenKind::Element(slot) => format!("({})", values[slot]),
            _ => token.text.clone(),
        })
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Validate and evaluate a formula, rounded for the level
pub fn evaluate_formula(
    formula: &str,
    values: &[f64; ELEMENT_COUNT],
    level: &Level,
) -> Result<f64, FormulaError> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(FormulaError::Empty);
    }

    let tokens = tokenize(formula)?;
    validate_tokens(&tokens, level)?;
    check_sqrt_calls(&tokens)?;

    let value = meval::eval_str(substitute(&tokens, values))?;
    if value.is_nan() {
        return Err(FormulaError::NotReal);
    }
    if !value.is_finite() {
        return Err(FormulaError::NotFinite);
    }

    let places = if level.allow_decimals { DECIMAL_PLACES } else { 0 };
    Ok(round_to(value, places))
}

/// Check a submission against the problem's target
pub fn check_formula(formula: &str, problem: &Problem, level: &Level) -> Result<Verdict, FormulaError> {
    let value = evaluate_formula(formula, &problem.element_values(), level)?;
    let target = problem.target as f64;

    if matches_target(value, target) {
        Ok(Verdict::Correct { value })
    } else {
        Ok(Verdict::Incorrect { value, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn problem(elements: [i64; 4], target: i64) -> Problem {
        Problem {
            level_id: "test".to_string(),
            elements,
            target,
            solution: Vec::new(),
        }
    }

    #[test]
    fn test_wrong_answer_is_incorrect_not_malformed() {
        let verdict = check_formula("A-B+D-C", &problem([5, 3, 2, 7], 10), &Level::level1());
        assert_eq!(
            verdict,
            Ok(Verdict::Incorrect {
                value: 7.0,
                target: 10.0
            })
        );
    }

    #[test]
    fn test_correct_answer() {
        let verdict = check_formula("(A - B) + C + D", &problem([5, 3, 2, 7], 11), &Level::level1());
        assert_eq!(verdict, Ok(Verdict::Correct { value: 11.0 }));
    }

    #[rstest]
    #[case("A+B-C-D+7", FormulaError::Literal("7".to_string()))]
    #[case("A+B+C", FormulaError::ElementUsage { label: 'D', count: 0 })]
    #[case("A+A+B+C+D", FormulaError::ElementUsage { label: 'A', count: 2 })]
    #[case("AB+C+D", FormulaError::ElementUsage { label: 'A', count: 0 })]
    #[case("A+B+C+D+E", FormulaError::UnknownVariable("E".to_string()))]
    #[case("A+B+C+d+D", FormulaError::UnknownVariable("d".to_string()))]
    #[case("A*B+C+D", FormulaError::DisallowedOperator(Operator::Mul))]
    #[case("sqrt(A)+B+C+D", FormulaError::UnknownVariable("sqrt".to_string()))]
    #[case("A+B+C+D%", FormulaError::UnexpectedChar { ch: '%', position: 7 })]
    #[case("A+B+C+", FormulaError::ElementUsage { label: 'D', count: 0 })]
    #[case("   ", FormulaError::Empty)]
    fn test_malformed_formulas_are_rejected(#[case] formula: &str, #[case] expected: FormulaError) {
        let result = check_formula(formula, &problem([5, 3, 2, 7], 10), &Level::level1());
        assert_eq!(result, Err(expected));
    }

    #[rstest]
    #[case("(A+B+C+D")]
    #[case("A+B+C+D)")]
    #[case("A+B+C+D-")]
    #[case("A+B*/C+D")]
    fn test_unparseable_formulas_are_rejected(#[case] formula: &str) {
        let result = check_formula(formula, &problem([5, 3, 2, 7], 10), &Level::level2());
        assert!(
            matches!(result, Err(FormulaError::Syntax(_))),
            "{formula}: {result:?}"
        );
    }

    #[test]
    fn test_substitute_parenthesises_values() {
        let tokens = tokenize("-A^C+sqrt(B)").unwrap();
        assert_eq!(
            substitute(&tokens, &[-5.0, 16.0, 2.0, 4.0]),
            "-(-5)^(2)+sqrt((16))"
        );
    }

    #[test]
    fn test_negative_elements_keep_their_sign() {
        // 8 - (-5 * 2) + 4
        let verdict = check_formula("B-A*C+D", &problem([-5, 8, 2, 4], 22), &Level::level3());
        assert_eq!(verdict, Ok(Verdict::Correct { value: 22.0 }));

        // -(-5)^2 is -25, not 25
        let value = evaluate_formula("-A^C+B-D", &[-5.0, 8.0, 2.0, 4.0], &Level::level3());
        assert_eq!(value, Ok(-21.0));
    }

    #[test]
    fn test_power_is_right_associative() {
        let value = evaluate_formula("A^B^C+D", &[2.0, 3.0, 2.0, 0.0], &Level::level3());
        assert_eq!(value, Ok(512.0));
    }

    #[test]
    fn test_sqrt_on_decimal_level() {
        let level = Level::level3();
        let verdict = check_formula("sqrt(A)+B-C*D", &problem([16, 3, 2, 1], 5), &level);
        assert_eq!(verdict, Ok(Verdict::Correct { value: 5.0 }));

        let result = evaluate_formula("sqrt(A-B)+C+D", &[1.0, 5.0, 0.0, 0.0], &level);
        assert_eq!(result, Err(FormulaError::NotReal));

        let result = evaluate_formula("sqrt A+B+C+D", &[1.0, 5.0, 0.0, 0.0], &level);
        assert_eq!(
            result,
            Err(FormulaError::UnexpectedToken {
                found: "A".to_string(),
                position: 5
            })
        );

        let result = evaluate_formula("A+B+C+D*sqrt", &[1.0, 5.0, 0.0, 0.0], &level);
        assert_eq!(result, Err(FormulaError::UnexpectedEnd));
    }

    #[test]
    fn test_decimal_level_keeps_five_places() {
        let value = evaluate_formula("A/B+C-D", &[1.0, 3.0, 0.0, 0.0], &Level::level3());
        assert_eq!(value, Ok(0.33333));

        let verdict = check_formula("A/B*C*D", &problem([7, 2, 1, 1], 4), &Level::level3());
        assert_eq!(
            verdict,
            Ok(Verdict::Incorrect {
                value: 3.5,
                target: 4.0
            })
        );
    }

    #[test]
    fn test_integer_level_rounds_result() {
        // 7 / 2 + 1 * 1 = 4.5 shows as 5 on an integer level
        let verdict = check_formula("A/B+C*D", &problem([7, 2, 1, 1], 5), &Level::level2());
        assert_eq!(verdict, Ok(Verdict::Correct { value: 5.0 }));
    }

    #[test]
    fn test_division_by_zero_is_not_finite() {
        let result = evaluate_formula("A/(B-C)+D", &[1.0, 2.0, 2.0, 0.0], &Level::level2());
        assert_eq!(result, Err(FormulaError::NotFinite));
    }

    #[test]
    fn test_fractional_power_of_negative_is_not_real() {
        let result = evaluate_formula("A^(B/C)+D", &[-8.0, 1.0, 2.0, 0.0], &Level::level3());
        assert_eq!(result, Err(FormulaError::NotReal));
    }

    #[test]
    fn test_tokenize_whole_identifiers() {
        let tokens = tokenize("AB + sqrt(C1)").unwrap();
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Op(Operator::Add),
                TokenKind::Sqrt,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
            ]
        );
    }
}
