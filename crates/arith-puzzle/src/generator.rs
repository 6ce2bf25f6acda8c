//! Generate-and-test problem generation.
//!
//! Each attempt samples four elements and a target from the level ranges
//! and asks the solver for a path. The first solvable pair wins; after
//! `max_attempts` failures generation gives up.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, trace, warn};

use crate::error::{GenerateError, LevelError};
use crate::level::Level;
use crate::puzzle::{NumberToken, Problem, ELEMENT_COUNT};
use crate::solver::{find_solution, SearchRules, SearchState, Tokens};

pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Configuration for problem generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum (elements, target) samples before giving up
    pub max_attempts: usize,
    /// Optional node budget for each attempt's search
    pub max_nodes_per_attempt: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_nodes_per_attempt: None,
        }
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub problem: Option<Problem>,
    /// Attempts made, including the successful one
    pub attempts: usize,
    pub nodes_visited: usize,
    pub time_elapsed_ms: u64,
}

pub struct ProblemGenerator<R = StdRng> {
    config: GeneratorConfig,
    rng: R,
}

impl ProblemGenerator<StdRng> {
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible problems
    pub fn seeded(config: GeneratorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl Default for ProblemGenerator<StdRng> {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl<R: Rng> ProblemGenerator<R> {
    pub fn with_rng(config: GeneratorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a solvable problem or report exhaustion
    pub fn generate(&mut self, level: &Level) -> Result<Problem, GenerateError> {
        let report = self.generate_report(level)?;
        report.problem.ok_or(GenerateError::Exhausted {
            attempts: report.attempts,
        })
    }

    /// Run generation and keep the bookkeeping, success or not.
    ///
    /// Fails only for a malformed level.
    pub fn generate_report(&mut self, level: &Level) -> Result<GenerationReport, LevelError> {
        level.validate()?;

        let start_time = Instant::now();
        let rules = SearchRules::from(level).with_node_limit(self.config.max_nodes_per_attempt);
        let mut nodes_visited = 0;
        let mut attempts = 0;

        while attempts < self.config.max_attempts {
            attempts += 1;
            let elements = self.sample_elements(level);
            let target = self.sample_target(level);

            // Shuffle so different attempts explore pairings in a different order
            let mut tokens: Tokens = elements
                .iter()
                .enumerate()
                .map(|(slot, &value)| NumberToken::original(value as f64, slot))
                .collect();
            tokens.shuffle(&mut self.rng);

            let result = find_solution(&SearchState::new(tokens), target as f64, &rules);
            nodes_visited += result.nodes_visited;
            trace!(attempts, nodes = result.nodes_visited, "generation attempt");

            if let Some(solution) = result.solution {
                info!(
                    level = %level.id,
                    attempts,
                    ?elements,
                    target,
                    steps = solution.len(),
                    "generated solvable problem"
                );
                return Ok(GenerationReport {
                    problem: Some(Problem {
                        level_id: level.id.clone(),
                        elements,
                        target,
                        solution,
                    }),
                    attempts,
                    nodes_visited,
                    time_elapsed_ms: start_time.elapsed().as_millis() as u64,
                });
            }
        }

        warn!(
            level = %level.id,
            attempts,
            "could not generate a solvable problem"
        );
        Ok(GenerationReport {
            problem: None,
            attempts,
            nodes_visited,
            time_elapsed_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    fn sample_elements(&mut self, level: &Level) -> [i64; ELEMENT_COUNT] {
        let (min, max) = level.number_range;
        std::array::from_fn(|_| self.rng.gen_range(min..=max))
    }

    fn sample_target(&mut self, level: &Level) -> i64 {
        let (min, max) = level.target_range;
        self.rng.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pruning::MAGNITUDE_LIMIT;
    use crate::puzzle::Operator;
    use crate::replay::{replay, verify_problem};
    use rstest::rstest;

    fn impossible_level() -> Level {
        Level {
            id: "impossible".to_string(),
            title: String::new(),
            description: String::new(),
            number_range: (1, 1),
            target_range: (1000, 1000),
            operators: vec![Operator::Add, Operator::Sub],
            allow_decimals: false,
            max_operations: 3,
            can_use_sqrt: false,
        }
    }

    #[rstest]
    #[case(Level::level1())]
    #[case(Level::level2())]
    #[case(Level::level3())]
    fn test_generated_problem_is_solvable(#[case] level: Level) {
        let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), 7);
        let problem = generator.generate(&level).unwrap();

        let (min, max) = level.number_range;
        assert!(problem.elements.iter().all(|e| (min..=max).contains(e)));
        let (min, max) = level.target_range;
        assert!((min..=max).contains(&problem.target));
        assert_eq!(problem.level_id, level.id);
        assert!(problem.solution.len() <= level.max_operations);
        assert!(verify_problem(&problem, &level));
    }

    #[rstest]
    #[case(Level::level1())]
    #[case(Level::level2())]
    fn test_solution_properties_hold_across_seeds(#[case] level: Level) {
        let rules = SearchRules::from(&level);
        for seed in 0..10 {
            let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), seed);
            let problem = generator.generate(&level).unwrap();
            let result = replay(
                &problem.element_values(),
                &problem.solution,
                problem.target as f64,
                &rules,
            );

            assert!(result.reached, "seed {seed}: {:?}", problem);
            assert!(result.metrics.each_slot_used_once());
            assert_eq!(result.metrics.combine_steps, ELEMENT_COUNT - 1);
            // Integer-only levels never produce fractions
            assert!(result.metrics.all_integers);
            assert!(result.metrics.max_magnitude <= MAGNITUDE_LIMIT);
            for step in &problem.solution {
                if step.operator == Operator::Div {
                    assert_ne!(step.right, Some(0.0));
                }
            }
        }
    }

    #[test]
    fn test_sqrt_level_solutions_stay_within_budget() {
        let level = Level {
            id: "roots".to_string(),
            title: String::new(),
            description: String::new(),
            number_range: (1, 20),
            target_range: (10, 60),
            operators: vec![
                Operator::Add,
                Operator::Sub,
                Operator::Mul,
                Operator::Div,
                Operator::Sqrt,
            ],
            allow_decimals: false,
            max_operations: 5,
            can_use_sqrt: true,
        };
        let rules = SearchRules::from(&level);
        assert!(rules.sqrt_enabled());

        for seed in 0..10 {
            let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), seed);
            let problem = generator.generate(&level).unwrap();
            let result = replay(
                &problem.element_values(),
                &problem.solution,
                problem.target as f64,
                &rules,
            );

            assert!(result.reached, "seed {seed}: {:?}", problem);
            assert_eq!(result.metrics.combine_steps, ELEMENT_COUNT - 1);
            assert_eq!(
                result.metrics.steps,
                result.metrics.combine_steps + result.metrics.unary_steps
            );
            assert!(result.metrics.steps <= level.max_operations);
            assert!(result.metrics.each_slot_used_once());
        }
    }

    #[test]
    fn test_same_seed_same_problem() {
        let level = Level::level2();
        let first = ProblemGenerator::seeded(GeneratorConfig::default(), 42)
            .generate(&level)
            .unwrap();
        let second = ProblemGenerator::seeded(GeneratorConfig::default(), 42)
            .generate(&level)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_impossible_level_uses_every_attempt() {
        let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), 1);
        let report = generator.generate_report(&impossible_level()).unwrap();

        assert!(report.problem.is_none());
        assert_eq!(report.attempts, DEFAULT_MAX_ATTEMPTS);

        // Every sample is [1, 1, 1, 1] -> 1000, so each attempt runs the same search
        let level = impossible_level();
        let per_attempt = find_solution(
            &SearchState::from_elements(&[1.0; ELEMENT_COUNT]),
            1000.0,
            &SearchRules::from(&level),
        );
        assert!(!per_attempt.is_solved());
        assert_eq!(
            report.nodes_visited,
            per_attempt.nodes_visited * DEFAULT_MAX_ATTEMPTS
        );

        assert_eq!(
            generator.generate(&impossible_level()),
            Err(GenerateError::Exhausted {
                attempts: DEFAULT_MAX_ATTEMPTS
            })
        );
    }

    #[test]
    fn test_custom_attempt_cap() {
        let config = GeneratorConfig {
            max_attempts: 25,
            ..Default::default()
        };
        let mut generator = ProblemGenerator::seeded(config, 3);
        assert_eq!(
            generator.generate(&impossible_level()),
            Err(GenerateError::Exhausted { attempts: 25 })
        );
    }

    #[test]
    fn test_malformed_level_fails_at_entry() {
        let mut level = impossible_level();
        level.number_range = (5, 1);
        let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), 1);

        assert!(matches!(
            generator.generate(&level),
            Err(GenerateError::InvalidLevel(LevelError::EmptyNumberRange { .. }))
        ));
    }

    #[test]
    fn test_first_attempt_success_is_reported() {
        // Every target in range is reachable: 1 + 1 + 1 + 1
        let level = Level {
            number_range: (1, 1),
            target_range: (4, 4),
            ..impossible_level()
        };
        let mut generator = ProblemGenerator::seeded(GeneratorConfig::default(), 9);
        let report = generator.generate_report(&level).unwrap();

        assert_eq!(report.attempts, 1);
        let problem = report.problem.unwrap();
        assert_eq!(problem.elements, [1, 1, 1, 1]);
        assert_eq!(problem.target, 4);
    }
}
