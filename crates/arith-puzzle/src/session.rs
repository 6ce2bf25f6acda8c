//! Game session state.
//!
//! Holds what the UI needs between calls: the chosen level, the problem on
//! screen, the score and when the problem was presented. A session is
//! created per game and replaced when the player starts over.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use crate::error::{LevelError, SessionError};
use crate::formula::{check_formula, Verdict};
use crate::generator::{GeneratorConfig, ProblemGenerator};
use crate::level::Level;
use crate::puzzle::Problem;

/// Result of an accepted submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmitOutcome {
    pub verdict: Verdict,
    /// Score after this submission
    pub score: u32,
    /// Time since the problem was presented
    pub elapsed: Duration,
}

pub struct GameSession<R = StdRng> {
    level: Level,
    generator: ProblemGenerator<R>,
    problem: Option<Problem>,
    score: u32,
    presented_at: Option<Instant>,
}

impl GameSession<StdRng> {
    pub fn new(level: Level) -> Result<Self, LevelError> {
        Self::with_generator(level, ProblemGenerator::new(GeneratorConfig::default()))
    }

    pub fn seeded(level: Level, seed: u64) -> Result<Self, LevelError> {
        Self::with_generator(
            level,
            ProblemGenerator::seeded(GeneratorConfig::default(), seed),
        )
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_generator(level: Level, generator: ProblemGenerator<R>) -> Result<Self, LevelError> {
        level.validate()?;
        Ok(Self {
            level,
            generator,
            problem: None,
            score: 0,
            presented_at: None,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Time since the current problem was presented
    pub fn elapsed(&self) -> Option<Duration> {
        self.presented_at.map(|at| at.elapsed())
    }

    /// Switch level; the current problem is dropped, the score is kept
    pub fn change_level(&mut self, level: Level) -> Result<(), LevelError> {
        level.validate()?;
        self.level = level;
        self.clear_problem();
        Ok(())
    }

    /// Replace the current problem with a freshly generated one.
    ///
    /// On failure the session is left without a problem.
    pub fn next_problem(&mut self) -> Result<&Problem, SessionError> {
        self.clear_problem();
        let problem = self.generator.generate(&self.level)?;
        self.presented_at = Some(Instant::now());
        Ok(self.problem.insert(problem))
    }

    /// Check a formula against the current problem.
    ///
    /// Rejections and wrong answers keep the problem so the player can try
    /// again. A correct answer scores and retires the problem.
    pub fn submit(&mut self, formula: &str) -> Result<SubmitOutcome, SessionError> {
        let problem = self.problem.as_ref().ok_or(SessionError::NoProblem)?;
        let verdict = check_formula(formula, problem, &self.level)?;
        let elapsed = self.elapsed().unwrap_or_default();

        if verdict.is_correct() {
            self.score += 1;
            info!(
                level = %self.level.id,
                score = self.score,
                elapsed_ms = elapsed.as_millis() as u64,
                "correct submission"
            );
            self.clear_problem();
        }

        Ok(SubmitOutcome {
            verdict,
            score: self.score,
            elapsed,
        })
    }

    fn clear_problem(&mut self) {
        self.problem = None;
        self.presented_at = None;
    }
}
