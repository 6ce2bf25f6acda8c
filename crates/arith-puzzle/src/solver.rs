//! Bounded backtracking search for one solution path.
//!
//! The search folds numbers pairwise until one is left, trying every
//! ordered pair and every allowed operator depth-first. It stops at the
//! first path whose final value matches the target. Exhausting the tree is
//! a normal outcome and yields no path.

use std::time::Instant;

use smallvec::SmallVec;
use tracing::debug;

use crate::level::Level;
use crate::pruning::{apply_binary, apply_sqrt, matches_target};
use crate::puzzle::{NumberToken, Operator, Step, ELEMENT_COUNT};

pub type Tokens = SmallVec<[NumberToken; ELEMENT_COUNT]>;

/// Rules the search prunes with, usually taken from a level
#[derive(Debug, Clone)]
pub struct SearchRules {
    pub operators: Vec<Operator>,
    /// Maximum steps in a path
    pub max_operations: usize,
    pub allow_decimals: bool,
    pub can_use_sqrt: bool,
    /// Abort after visiting this many states
    pub max_nodes: Option<usize>,
}

impl SearchRules {
    pub fn with_node_limit(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Square roots are tried only when the flag is set and the operator
    /// is listed
    pub fn sqrt_enabled(&self) -> bool {
        self.can_use_sqrt && self.operators.contains(&Operator::Sqrt)
    }
}

impl From<&Level> for SearchRules {
    fn from(level: &Level) -> Self {
        Self {
            operators: level.operators.clone(),
            max_operations: level.max_operations,
            allow_decimals: level.allow_decimals,
            can_use_sqrt: level.can_use_sqrt,
            max_nodes: None,
        }
    }
}

/// Result of one search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// First path found, if any
    pub solution: Option<Vec<Step>>,
    pub nodes_visited: usize,
    /// Whether the node limit cut the search short
    pub aborted: bool,
    pub time_elapsed_ms: u64,
}

impl SearchResult {
    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }
}

/// A node in the search. Children are built fresh, never mutated in place.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub tokens: Tokens,
    pub path: Vec<Step>,
    pub used_slots: [bool; ELEMENT_COUNT],
}

impl SearchState {
    pub fn new(tokens: impl IntoIterator<Item = NumberToken>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            path: Vec::new(),
            used_slots: [false; ELEMENT_COUNT],
        }
    }

    /// Tag elements with their slot in the order given
    pub fn from_elements(elements: &[f64]) -> Self {
        Self::new(elements.iter().enumerate().map(|(slot, &value)| {
            if slot < ELEMENT_COUNT {
                NumberToken::original(value, slot)
            } else {
                NumberToken::derived(value)
            }
        }))
    }

    fn is_consumed(&self, token: &NumberToken) -> bool {
        token
            .origin
            .and_then(|slot| self.used_slots.get(slot).copied())
            .unwrap_or(false)
    }

    /// Build the child state that replaces the tokens at `consumed` with
    /// the step's result
    fn fold(&self, consumed: &[usize], step: Step) -> SearchState {
        let mut tokens: Tokens = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(index, _)| !consumed.contains(index))
            .map(|(_, token)| *token)
            .collect();
        tokens.push(NumberToken::derived(step.result));

        let mut used_slots = self.used_slots;
        for &index in consumed {
            if let Some(slot) = self.tokens[index].origin {
                if let Some(flag) = used_slots.get_mut(slot) {
                    *flag = true;
                }
            }
        }

        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(step);

        SearchState {
            tokens,
            path,
            used_slots,
        }
    }
}

#[derive(Debug, Default)]
struct SearchStats {
    nodes_visited: usize,
    aborted: bool,
}

/// Search from an initial state for a path reaching `target`.
pub fn find_solution(initial: &SearchState, target: f64, rules: &SearchRules) -> SearchResult {
    let start_time = Instant::now();
    let mut stats = SearchStats::default();

    let solution = search(initial, target, rules, &mut stats);

    if stats.aborted {
        debug!(
            nodes = stats.nodes_visited,
            target, "search aborted at node limit"
        );
    }

    SearchResult {
        solution,
        nodes_visited: stats.nodes_visited,
        aborted: stats.aborted,
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    }
}

/// Convenience wrapper: search over plain element values
pub fn solve(elements: &[f64], target: f64, rules: &SearchRules) -> Option<Vec<Step>> {
    find_solution(&SearchState::from_elements(elements), target, rules).solution
}

fn search(
    state: &SearchState,
    target: f64,
    rules: &SearchRules,
    stats: &mut SearchStats,
) -> Option<Vec<Step>> {
    stats.nodes_visited += 1;

    match state.tokens.len() {
        0 => return None,
        1 => {
            return matches_target(state.tokens[0].value, target).then(|| state.path.clone());
        }
        _ => {}
    }

    if state.path.len() >= rules.max_operations {
        return None;
    }

    if let Some(limit) = rules.max_nodes {
        if stats.nodes_visited >= limit {
            stats.aborted = true;
            return None;
        }
    }

    let count = state.tokens.len();

    // Ordered pairs: (i, j) and (j, i) differ for - and /
    for i in 0..count {
        for j in 0..count {
            if i == j {
                continue;
            }
            let left = state.tokens[i];
            let right = state.tokens[j];
            if state.is_consumed(&left) || state.is_consumed(&right) {
                continue;
            }

            for &op in &rules.operators {
                if op.is_unary() {
                    continue;
                }
                let Some(result) = apply_binary(op, left.value, right.value, rules.allow_decimals)
                else {
                    continue;
                };

                let child = state.fold(&[i, j], Step::binary(op, left.value, right.value, result));
                if let Some(path) = search(&child, target, rules, stats) {
                    return Some(path);
                }
            }
        }
    }

    if rules.sqrt_enabled() {
        for i in 0..count {
            let operand = state.tokens[i];
            if state.is_consumed(&operand) {
                continue;
            }
            let Some(result) = apply_sqrt(operand.value, rules.allow_decimals) else {
                continue;
            };

            let child = state.fold(&[i], Step::unary(Operator::Sqrt, operand.value, result));
            if let Some(path) = search(&child, target, rules, stats) {
                return Some(path);
            }
        }
    }

    None
}
