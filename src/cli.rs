//! # Command-Line Interface
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    engine::{Engine, STRING_SOURCE},
    errors::{print_error, ErrorCategory, ErrorKind, ZenvError},
    repl,
    validation::Validator,
};

pub mod output;

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "zenv",
    version,
    about = "Transpile Zenv dialect source into Python."
)]
pub struct ZenvArgs {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file instead of ./zenv.yaml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Transpile a single dialect file.
    File {
        /// The dialect source file.
        input: PathBuf,
        /// Where to write the target file (default: input with .py).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the target text instead of writing it.
        #[arg(long)]
        stdout: bool,
        /// Only check that the file transpiles to valid Python.
        #[arg(long)]
        check: bool,
        /// Print line, byte and per-rule statistics.
        #[arg(long)]
        stats: bool,
        /// Show a line diff between the dialect source and the target.
        #[arg(long)]
        diff: bool,
    },
    /// Transpile a string of dialect code (`-` reads stdin).
    String {
        code: String,
        /// Only check that the code transpiles to valid Python.
        #[arg(long)]
        check: bool,
    },
    /// Transpile every dialect file in a directory.
    Dir {
        /// The directory to scan.
        input: PathBuf,
        /// Output directory (default: `output_dir` from the config, inside INPUT).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Descend into subdirectories.
        #[arg(short, long)]
        recursive: bool,
        /// Only check; write nothing.
        #[arg(long)]
        check: bool,
        /// Print the batch result as JSON.
        #[arg(long)]
        json: bool,
        /// Worker threads (1 = sequential).
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// List the statement rules in priority order.
    Rules,
    /// Start an interactive transpiler shell.
    Repl,
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    NotFound = 1,
    SyntaxError = 2,
    Failure = 3,
}

impl From<&ZenvError> for ExitStatus {
    fn from(error: &ZenvError) -> Self {
        match (&error.kind, error.category()) {
            (ErrorKind::FileNotFound { .. } | ErrorKind::NotADirectory { .. }, _) => {
                ExitStatus::NotFound
            }
            (_, ErrorCategory::Syntax | ErrorCategory::Target) => ExitStatus::SyntaxError,
            (_, ErrorCategory::FileSystem) => ExitStatus::Failure,
        }
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() -> ExitStatus {
    let args = ZenvArgs::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::discover(),
    };
    let outcome = config.and_then(|config| dispatch(args.command, config));
    match outcome {
        Ok(status) => status,
        Err(e) => {
            let status = ExitStatus::from(&e);
            print_error(e);
            status
        }
    }
}

/// Installs the stderr log subscriber.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "zenv=warn",
        1 => "zenv=info",
        _ => "zenv=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(command: ArgsCommand, config: Config) -> Result<ExitStatus, ZenvError> {
    match command {
        ArgsCommand::File {
            input,
            output,
            stdout,
            check,
            stats,
            diff,
        } => {
            let engine = Engine::with_config(config);
            if check {
                return check_file(&engine, &input);
            }
            let destination = if stdout {
                None
            } else {
                Some(output_path(&engine, &input, output))
            };
            transpile_file(&engine, &input, destination.as_deref(), stats, diff)
        }

        ArgsCommand::String { code, check } => {
            let engine = Engine::with_config(config);
            let source = read_code_arg(&code)?;
            if check {
                Validator::new(&engine).validate(&source)?;
                output::print_success("code is valid");
            } else {
                print!("{}", engine.transpile(&source)?);
            }
            Ok(ExitStatus::Success)
        }

        ArgsCommand::Dir {
            input,
            output,
            recursive,
            check,
            json,
            jobs,
        } => {
            let mut config = config;
            if jobs.is_some() {
                config.jobs = jobs;
            }
            if check {
                config.validate = true;
            }
            let destination = match (check, output) {
                (true, _) => None,
                (false, Some(dir)) => Some(dir),
                (false, None) => Some(input.join(&config.output_dir)),
            };
            let engine = Engine::with_config(config);
            let result = engine.transpile_directory(&input, destination.as_deref(), recursive)?;
            if json {
                output::print_json(&result);
            } else {
                output::print_batch_summary(&result, destination.as_deref());
            }
            Ok(if result.is_success() {
                ExitStatus::Success
            } else {
                ExitStatus::SyntaxError
            })
        }

        ArgsCommand::Rules => {
            output::print_rules(Engine::with_config(config).rules());
            Ok(ExitStatus::Success)
        }

        ArgsCommand::Repl => {
            let engine = Engine::with_config(config);
            repl::run_repl(&engine).map_err(|e| ZenvError::io(Path::new("<stdin>"), e))?;
            Ok(ExitStatus::Success)
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn check_file(engine: &Engine, input: &Path) -> Result<ExitStatus, ZenvError> {
    let source = read_source(input)?;
    Validator::new(engine).validate_named(&source, &input.display().to_string())?;
    output::print_success(&format!("{} is valid", input.display()));
    Ok(ExitStatus::Success)
}

fn transpile_file(
    engine: &Engine,
    input: &Path,
    destination: Option<&Path>,
    stats: bool,
    diff: bool,
) -> Result<ExitStatus, ZenvError> {
    let target = engine.transpile_file(input, destination)?;
    match destination {
        Some(path) => output::print_success(&format!(
            "{} -> {}",
            input.display(),
            path.display()
        )),
        None => print!("{target}"),
    }

    if stats || diff {
        let source = read_source(input)?;
        if diff {
            output::print_diff(&source, &target);
        }
        if stats {
            let report = engine.transpile_with_report_named(&source, &input.display().to_string())?;
            output::print_stats(&report.stats(&source));
        }
    }
    Ok(ExitStatus::Success)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// `-o` when given (a directory receives the input's file name), otherwise
/// the input with the configured target extension.
fn output_path(engine: &Engine, input: &Path, output: Option<PathBuf>) -> PathBuf {
    let extension = &engine.config().output_extension;
    match output {
        Some(dir) if dir.is_dir() => dir
            .join(input.file_name().unwrap_or(input.as_os_str()))
            .with_extension(extension),
        Some(path) => path,
        None => input.with_extension(extension),
    }
}

fn read_source(path: &Path) -> Result<String, ZenvError> {
    if !path.exists() {
        return Err(ZenvError::file_not_found(path));
    }
    fs::read_to_string(path).map_err(|e| ZenvError::io(path, e))
}

fn read_code_arg(code: &str) -> Result<String, ZenvError> {
    if code != "-" {
        return Ok(code.to_string());
    }
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| ZenvError::io(Path::new(STRING_SOURCE), e))?;
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        ZenvArgs::command().debug_assert();
    }

    #[test]
    fn test_exit_status_mapping() {
        let missing = ZenvError::file_not_found(Path::new("nope.zv"));
        assert_eq!(ExitStatus::from(&missing), ExitStatus::NotFound);

        let syntax = Engine::new().transpile("42lol ==> 1").unwrap_err();
        assert_eq!(ExitStatus::from(&syntax), ExitStatus::SyntaxError);

        let io = ZenvError::io(Path::new("x"), io::Error::other("boom"));
        assert_eq!(ExitStatus::from(&io), ExitStatus::Failure);
    }

    #[test]
    fn test_default_output_path() {
        let engine = Engine::new();
        assert_eq!(
            output_path(&engine, Path::new("demo/hello.zv"), None),
            PathBuf::from("demo/hello.py")
        );
        assert_eq!(
            output_path(&engine, Path::new("hello.zv"), Some(PathBuf::from("out.py"))),
            PathBuf::from("out.py")
        );
    }
}
