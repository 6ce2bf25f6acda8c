//! CLI entry point for the puzzle generator.
//!
//! Usage:
//!   arith-puzzle levels
//!   arith-puzzle generate [--level <id> | --level-file <path>] [options]
//!   arith-puzzle solve --target <n> [--level <id>] <elements>...
//!   arith-puzzle check --target <n> --formula <f> [--level <id>] <a> <b> <c> <d>
//!   arith-puzzle play [--level <id>] [--seed <n>]
//!
//! JSON results go to stdout, logs go to stderr (`RUST_LOG` controls them).

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use arith_puzzle::{
    check_formula, find_solution, GameSession, GeneratorConfig, Level, LoadError, Problem,
    ProblemGenerator, SearchRules, SearchState, SessionError, Step, DEFAULT_MAX_ATTEMPTS,
};

#[derive(Parser)]
#[command(name = "arith-puzzle")]
#[command(about = "Solvable four-number arithmetic puzzle generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LevelArgs {
    /// Built-in level id (level1, level2, level3)
    #[arg(long, default_value = "level1")]
    level: String,

    /// Load the level from a JSON file instead
    #[arg(long, value_name = "FILE", conflicts_with = "level")]
    level_file: Option<PathBuf>,
}

impl LevelArgs {
    fn resolve(&self) -> Result<Level, LoadError> {
        match &self.level_file {
            Some(path) => Level::load(path),
            None => Ok(Level::preset(&self.level)?),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in levels
    Levels,

    /// Generate a solvable problem
    Generate {
        #[command(flatten)]
        level: LevelArgs,

        /// Seed for reproducible problems
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum (elements, target) samples
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: usize,

        /// Node budget for each attempt's search
        #[arg(long)]
        max_nodes: Option<usize>,
    },

    /// Search for a path from the given elements to a target
    Solve {
        #[command(flatten)]
        level: LevelArgs,

        #[arg(long, allow_negative_numbers = true)]
        target: f64,

        #[arg(required = true, allow_negative_numbers = true)]
        elements: Vec<f64>,
    },

    /// Check a player formula against elements and a target
    Check {
        #[command(flatten)]
        level: LevelArgs,

        #[arg(long, allow_negative_numbers = true)]
        target: i64,

        /// Formula over A, B, C, D
        #[arg(long)]
        formula: String,

        #[arg(num_args = 4, required = true, allow_negative_numbers = true)]
        elements: Vec<i64>,
    },

    /// Play in the terminal
    Play {
        #[command(flatten)]
        level: LevelArgs,

        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Output format for a generated problem
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemOutput<'a> {
    level_id: &'a str,
    elements: [i64; 4],
    target: i64,
    solution: &'a [Step],
    steps: Vec<String>,
}

impl<'a> From<&'a Problem> for ProblemOutput<'a> {
    fn from(problem: &'a Problem) -> Self {
        Self {
            level_id: &problem.level_id,
            elements: problem.elements,
            target: problem.target,
            solution: &problem.solution,
            steps: problem.solution_lines(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput<'a> {
    generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    attempts: usize,
    nodes_visited: usize,
    time_elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<ProblemOutput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    solved: bool,
    aborted: bool,
    nodes_visited: usize,
    time_elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    solution: Option<Vec<Step>>,
    steps: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
    accepted: bool,
    correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    target: i64,
    message: String,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<i32, Box<dyn Error>> {
    match cli.command {
        Commands::Levels => {
            print_json(&Level::presets())?;
            Ok(0)
        }

        Commands::Generate {
            level,
            seed,
            max_attempts,
            max_nodes,
        } => {
            let level = level.resolve()?;
            let config = GeneratorConfig {
                max_attempts,
                max_nodes_per_attempt: max_nodes,
            };
            let mut generator = match seed {
                Some(seed) => ProblemGenerator::seeded(config, seed),
                None => ProblemGenerator::new(config),
            };

            let report = generator.generate_report(&level)?;
            let output = GenerateOutput {
                generated: report.problem.is_some(),
                reason: report.problem.is_none().then(|| {
                    format!(
                        "could not generate a solvable problem after {} attempts",
                        report.attempts
                    )
                }),
                attempts: report.attempts,
                nodes_visited: report.nodes_visited,
                time_elapsed_ms: report.time_elapsed_ms,
                problem: report.problem.as_ref().map(ProblemOutput::from),
            };
            print_json(&output)?;

            Ok(if output.generated { 0 } else { 1 })
        }

        Commands::Solve {
            level,
            target,
            elements,
        } => {
            let level = level.resolve()?;
            let rules = SearchRules::from(&level);
            let result = find_solution(&SearchState::from_elements(&elements), target, &rules);

            let output = SolveOutput {
                solved: result.is_solved(),
                aborted: result.aborted,
                nodes_visited: result.nodes_visited,
                time_elapsed_ms: result.time_elapsed_ms,
                steps: result
                    .solution
                    .iter()
                    .flatten()
                    .map(Step::to_string)
                    .collect(),
                solution: result.solution,
            };
            print_json(&output)?;

            Ok(if output.solved { 0 } else { 1 })
        }

        Commands::Check {
            level,
            target,
            formula,
            elements,
        } => {
            let level = level.resolve()?;
            let problem = Problem {
                level_id: level.id.clone(),
                elements: elements.as_slice().try_into()?,
                target,
                solution: Vec::new(),
            };

            let output = match check_formula(&formula, &problem, &level) {
                Ok(verdict) => CheckOutput {
                    accepted: true,
                    correct: verdict.is_correct(),
                    value: Some(verdict.value()),
                    target,
                    message: if verdict.is_correct() {
                        "Correct! Well done!".to_string()
                    } else {
                        format!(
                            "Incorrect. Your result was {}. Target is {}.",
                            verdict.value(),
                            target
                        )
                    },
                },
                Err(e) => CheckOutput {
                    accepted: false,
                    correct: false,
                    value: None,
                    target,
                    message: e.to_string(),
                },
            };
            print_json(&output)?;

            Ok(if output.correct { 0 } else { 1 })
        }

        Commands::Play { level, seed } => {
            let level = level.resolve()?;
            let session = match seed {
                Some(seed) => GameSession::seeded(level, seed)?,
                None => GameSession::new(level)?,
            };
            play(session)?;
            Ok(0)
        }
    }
}

fn present(session: &mut GameSession, out: &mut impl Write) -> io::Result<()> {
    match session.next_problem() {
        Ok(problem) => {
            let [a, b, c, d] = problem.elements;
            writeln!(
                out,
                "Target: {}    A = {}  B = {}  C = {}  D = {}",
                problem.target, a, b, c, d
            )
        }
        Err(e) => writeln!(
            out,
            "{}. Type `new` to try again or restart with another level.",
            e
        ),
    }
}

fn play(mut session: GameSession) -> io::Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout();

    writeln!(out, "{}", session.level().title)?;
    writeln!(out, "Use each of A, B, C, D exactly once. `new` skips, `quit` leaves.")?;
    present(&mut session, &mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "new" => present(&mut session, &mut out)?,
            formula => match session.submit(formula) {
                Ok(outcome) if outcome.verdict.is_correct() => {
                    writeln!(
                        out,
                        "Correct! Well done! ({}s)  Score: {}",
                        outcome.elapsed.as_secs(),
                        outcome.score
                    )?;
                    present(&mut session, &mut out)?;
                }
                Ok(outcome) => {
                    let target = session.problem().map(|p| p.target).unwrap_or_default();
                    writeln!(
                        out,
                        "Incorrect. Your result was {}. Target is {}.",
                        outcome.verdict.value(),
                        target
                    )?;
                }
                Err(SessionError::NoProblem) => present(&mut session, &mut out)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
        }
        out.flush()?;
    }

    writeln!(out, "Final score: {}", session.score())
}
