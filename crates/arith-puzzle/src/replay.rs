//! Path replay with metrics tracking.
//!
//! Re-executes a solution path step by step against the original elements,
//! checking that each operand is actually available and that each result
//! follows from the level rules. Used to verify solver output and any path
//! loaded from JSON.

use crate::level::Level;
use crate::pruning::{apply_binary, apply_sqrt, is_integer, matches_target};
use crate::puzzle::{NumberToken, Problem, Step, ELEMENT_COUNT};
use crate::solver::{SearchRules, SearchState, Tokens};

/// Result status of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStatus {
    /// One value left and it equals the target
    Reached,
    /// One value left but it is not the target
    Missed,
    /// A step used a value that was not available
    MissingOperand,
    /// A step broke the level rules (operator, operand window, depth)
    IllegalStep,
    /// A step recorded a result its operands do not produce
    ResultMismatch,
    /// More than one value left after the last step
    Unreduced,
}

/// Metrics collected during replay
#[derive(Debug, Clone)]
pub struct ReplayMetrics {
    pub steps: usize,
    pub combine_steps: usize,
    pub unary_steps: usize,
    /// How often each original slot was folded into a step
    pub slot_uses: [usize; ELEMENT_COUNT],
    /// Every element, operand and result was a whole number
    pub all_integers: bool,
    pub max_magnitude: f64,
    pub final_value: Option<f64>,
}

impl Default for ReplayMetrics {
    fn default() -> Self {
        Self {
            steps: 0,
            combine_steps: 0,
            unary_steps: 0,
            slot_uses: [0; ELEMENT_COUNT],
            all_integers: true,
            max_magnitude: 0.0,
            final_value: None,
        }
    }
}

impl ReplayMetrics {
    /// Check that every original slot was used exactly once
    pub fn each_slot_used_once(&self) -> bool {
        self.slot_uses.iter().all(|&uses| uses == 1)
    }

    fn observe(&mut self, value: f64) {
        self.all_integers &= is_integer(value);
        self.max_magnitude = self.max_magnitude.max(value.abs());
    }
}

/// Result of replaying a path
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub status: ReplayStatus,
    pub metrics: ReplayMetrics,
    pub reached: bool,
    /// Index of the step that failed, if any
    pub failed_step: Option<usize>,
}

impl ReplayResult {
    fn finish(status: ReplayStatus, metrics: ReplayMetrics, failed_step: Option<usize>) -> Self {
        Self {
            status,
            reached: status == ReplayStatus::Reached,
            metrics,
            failed_step,
        }
    }
}

/// Position of a pool value matching `value`, skipping `exclude`
fn find_operand(pool: &Tokens, value: f64, exclude: Option<usize>) -> Option<usize> {
    pool.iter()
        .enumerate()
        .find(|&(index, token)| Some(index) != exclude && matches_target(token.value, value))
        .map(|(index, _)| index)
}

/// Replay a path over the elements in slot order
pub fn replay(elements: &[f64], path: &[Step], target: f64, rules: &SearchRules) -> ReplayResult {
    let mut pool: Tokens = SearchState::from_elements(elements).tokens;
    let mut metrics = ReplayMetrics::default();
    for &element in elements {
        metrics.observe(element);
    }

    for (index, step) in path.iter().enumerate() {
        metrics.steps += 1;

        if metrics.steps > rules.max_operations || step.operator.is_unary() != step.is_unary() {
            return ReplayResult::finish(ReplayStatus::IllegalStep, metrics, Some(index));
        }

        let (consumed, recomputed) = match step.right {
            None => {
                if !rules.sqrt_enabled() {
                    return ReplayResult::finish(ReplayStatus::IllegalStep, metrics, Some(index));
                }
                let Some(position) = find_operand(&pool, step.left, None) else {
                    return ReplayResult::finish(
                        ReplayStatus::MissingOperand,
                        metrics,
                        Some(index),
                    );
                };
                let operand = pool[position].value;
                metrics.unary_steps += 1;
                (vec![position], apply_sqrt(operand, rules.allow_decimals))
            }
            Some(right) => {
                if !rules.operators.contains(&step.operator) {
                    return ReplayResult::finish(ReplayStatus::IllegalStep, metrics, Some(index));
                }
                let left_position = find_operand(&pool, step.left, None);
                let right_position =
                    left_position.and_then(|left| find_operand(&pool, right, Some(left)));
                let (Some(left_position), Some(right_position)) = (left_position, right_position)
                else {
                    return ReplayResult::finish(
                        ReplayStatus::MissingOperand,
                        metrics,
                        Some(index),
                    );
                };
                let left = pool[left_position].value;
                let right = pool[right_position].value;
                metrics.combine_steps += 1;
                (
                    vec![left_position, right_position],
                    apply_binary(step.operator, left, right, rules.allow_decimals),
                )
            }
        };

        let Some(result) = recomputed else {
            return ReplayResult::finish(ReplayStatus::IllegalStep, metrics, Some(index));
        };
        if !matches_target(result, step.result) {
            return ReplayResult::finish(ReplayStatus::ResultMismatch, metrics, Some(index));
        }

        for &position in &consumed {
            if let Some(slot) = pool[position].origin {
                if let Some(uses) = metrics.slot_uses.get_mut(slot) {
                    *uses += 1;
                }
            }
            metrics.observe(pool[position].value);
        }
        metrics.observe(result);

        let mut sorted = consumed;
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        for position in sorted {
            pool.remove(position);
        }
        pool.push(NumberToken::derived(result));
    }

    if pool.len() != 1 {
        return ReplayResult::finish(ReplayStatus::Unreduced, metrics, None);
    }

    let final_value = pool[0].value;
    metrics.final_value = Some(final_value);

    let status = if matches_target(final_value, target) {
        ReplayStatus::Reached
    } else {
        ReplayStatus::Missed
    };
    ReplayResult::finish(status, metrics, None)
}

/// Simple verification: does the path reduce the elements to the target?
pub fn verify_path(elements: &[f64], path: &[Step], target: f64, rules: &SearchRules) -> bool {
    replay(elements, path, target, rules).reached
}

/// Check a generated problem against the level it claims to belong to
pub fn verify_problem(problem: &Problem, level: &Level) -> bool {
    verify_path(
        &problem.element_values(),
        &problem.solution,
        problem.target as f64,
        &SearchRules::from(level),
    )
}
