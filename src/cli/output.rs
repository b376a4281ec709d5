//! Handles all user-facing output for the CLI.
//!
//! Colour goes through `termcolor` so it is dropped automatically when stdout
//! is not a terminal.

use std::io::Write;
use std::path::Path;

use difference::{Changeset, Difference};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{batch::BatchResult, engine::TranspileStats, rules::RuleTable};

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

pub fn print_success(message: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = write!(stdout, "✓");
    let _ = stdout.reset();
    let _ = writeln!(stdout, " {message}");
}

/// Prints a line diff from the dialect source to the target text.
pub fn print_diff(source: &str, target: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let changeset = Changeset::new(source, target, "\n");
    write_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

pub fn print_stats(stats: &TranspileStats) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    heading(&mut stdout, "Statistics");
    let _ = writeln!(
        stdout,
        "  lines:        {} -> {}",
        stats.source_lines, stats.target_lines
    );
    let _ = writeln!(
        stdout,
        "  bytes:        {} -> {}",
        stats.source_bytes, stats.target_bytes
    );
    let _ = writeln!(stdout, "  pass-through: {}", stats.pass_through);
    let _ = writeln!(stdout, "  comments:     {}", stats.comments);
    for (rule, hits) in &stats.rule_hits {
        let _ = writeln!(stdout, "  {rule:<20} {hits}");
    }
}

pub fn print_batch_summary(result: &BatchResult, output_dir: Option<&Path>) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for failure in &result.failures {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = write!(stdout, "✗");
        let _ = stdout.reset();
        let _ = writeln!(stdout, " {}: {}", failure.path.display(), failure.message);
    }

    heading(&mut stdout, "Batch Summary");
    let _ = writeln!(stdout, "  files:      {}", result.total);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = writeln!(stdout, "  transpiled: {}", result.transpiled);
    if result.errors > 0 {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
    } else {
        let _ = stdout.reset();
    }
    let _ = writeln!(stdout, "  errors:     {}", result.errors);
    let _ = stdout.reset();
    if let Some(dir) = output_dir {
        let _ = writeln!(stdout, "  output:     {}", dir.display());
    }
}

pub fn print_rules(rules: &RuleTable) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for (index, rule) in rules.rules().iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = write!(stdout, "{:>2}. {}", index + 1, rule.name());
        let _ = stdout.reset();
        let _ = writeln!(stdout, ": {}", rule.description());
        let (dialect, target) = rule.example();
        let _ = writeln!(stdout, "      {dialect}  =>  {target}");
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn heading(stdout: &mut StandardStream, title: &str) {
    let _ = stdout.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(stdout, "{title}");
    let _ = stdout.reset();
}

fn write_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                let _ = writeln!(stdout, " {}", x);
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                let _ = writeln!(stdout, "+{}", x);
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                let _ = writeln!(stdout, "-{}", x);
            }
        }
    }
}
