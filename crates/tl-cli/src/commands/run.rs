// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Run command: optimize, evaluate, report.

use std::io::{self, BufRead};
use std::process;
use std::sync::Arc;

use tl_ast::{AssertionReport, Environment, Pos};
use tl_diagnostics::{Diagnostic, ToDiagnostic};
use tl_interp::{CapturedHost, Evaluator, RunReport, RuntimeDiagnostic, StdHost};
use tl_optimizer::Optimizer;

use super::pipeline::{self, FrontendResult};
use crate::{output, show_diagnostics, Format};

/// Exit code when the program ran to completion but an assertion failed.
const EXIT_ASSERTION_FAILED: i32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Fold constants before running.
    pub optimize: bool,
    /// Run unoptimized and optimized, and require identical behavior.
    pub compare: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { optimize: true, compare: false }
    }
}

pub fn cmd_run(path: &str, opts: RunOptions, format: Format) {
    let frontend = pipeline::run_frontend(path, format);
    if opts.compare {
        run_compare(frontend, path, format);
        return;
    }

    let FrontendResult { source, mut env, mut pending } = frontend;
    if opts.optimize {
        optimize_or_exit(&mut env, &mut pending, &source, path, format);
    }

    let host = Arc::new(StdHost::new());
    let outcome = Evaluator::new(Arc::new(env), host.clone()).run();
    finish(outcome, &host.failures(), host.passed_assertions(), pending, &source, path, format);
}

/// Run the program twice on the same input: as parsed, then optimized.
///
/// Stdin is read up front so both runs see identical input. Only the
/// optimized run's output is printed.
fn run_compare(frontend: FrontendResult, path: &str, format: Format) {
    let FrontendResult { source, env, mut pending } = frontend;
    let input = read_input(io::stdin().lock());

    let plain = Observed::run(env.clone(), &input);
    let mut optimized_env = env;
    optimize_or_exit(&mut optimized_env, &mut pending, &source, path, format);
    let optimized = Observed::run(optimized_env, &input);

    for line in &optimized.output {
        println!("{}", line);
    }
    if let Some(divergence) = plain.divergence(&optimized) {
        pending.push(divergence);
        show_diagnostics(&pending, &source, path, "run", format);
        if format == Format::Human {
            eprintln!("\n{}", output::banner_fail("Compare", 1));
        }
        process::exit(1);
    }
    tracing::info!(lines = optimized.output.len(), "optimized run matches unoptimized run");

    let failures: Vec<AssertionReport> = optimized.reports.iter().filter(|r| !r.passed).cloned().collect();
    let passed = optimized.reports.len() - failures.len();
    finish(optimized.outcome, &failures, passed, pending, &source, path, format);
}

/// Every input line, up to the first read error.
fn read_input(reader: impl BufRead) -> Vec<String> {
    let mut input = Vec::new();
    for line in reader.lines() {
        match line {
            Ok(line) => input.push(line),
            Err(err) => {
                tracing::warn!(%err, lines = input.len(), "reading input failed; later lines ignored");
                break;
            }
        }
    }
    input
}

fn optimize_or_exit(env: &mut Environment, pending: &mut Vec<Diagnostic>, source: &str, path: &str, format: Format) {
    match Optimizer::new(env).optimize() {
        Ok(stats) => {
            tracing::debug!(
                folded = stats.folded_exprs,
                elided = stats.elided_calls,
                removed = stats.removed_blocks,
                "optimized {}",
                path
            );
        }
        Err(err) => {
            pending.push(err.to_diagnostic());
            show_diagnostics(pending, source, path, "optimize", format);
            if format == Format::Human {
                eprintln!("\n{}", output::banner_fail("Optimize", 1));
            }
            process::exit(1);
        }
    }
}

/// Report the outcome of a run and exit with the matching status.
fn finish(
    outcome: Result<RunReport, RuntimeDiagnostic>,
    failures: &[AssertionReport],
    passed: usize,
    mut diags: Vec<Diagnostic>,
    source: &str,
    path: &str,
    format: Format,
) {
    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            diags.push(err.to_diagnostic());
            show_diagnostics(&diags, source, path, "run", format);
            if format == Format::Human {
                eprintln!("\n{}", output::banner_fail("Run", 1));
            }
            process::exit(1);
        }
    };

    if let Some(value) = report.result.value {
        tracing::info!(ty = %report.result.ty, %value, "program returned");
    }
    diags.extend(report.leaked_tasks.iter().map(ToDiagnostic::to_diagnostic));
    diags.extend(failures.iter().map(ToDiagnostic::to_diagnostic));

    if format == Format::Json || !diags.is_empty() {
        show_diagnostics(&diags, source, path, "run", format);
    }
    if format == Format::Human && passed + failures.len() > 0 {
        let summary = format!("Assertions: {}, {}", output::passed_count(passed), output::failed_count(failures.len()));
        eprintln!("{}", output::section(&summary));
    }
    if !failures.is_empty() {
        process::exit(EXIT_ASSERTION_FAILED);
    }
}

/// Everything one captured run produced.
struct Observed {
    output: Vec<String>,
    reports: Vec<AssertionReport>,
    outcome: Result<RunReport, RuntimeDiagnostic>,
}

impl Observed {
    fn run(env: Environment, input: &[String]) -> Self {
        let host = CapturedHost::new().with_input(input.iter().cloned());
        let outcome = Evaluator::new(Arc::new(env), Arc::new(host.clone())).run();
        Self { output: host.output(), reports: host.reports(), outcome }
    }

    /// Describe the first observable difference from `other`, if any.
    fn divergence(&self, other: &Observed) -> Option<Diagnostic> {
        let base = Diagnostic::error("optimized program behaves differently").with_code("O0003");

        if let Some(line) = (0..self.output.len().max(other.output.len()))
            .find(|&i| self.output.get(i) != other.output.get(i))
        {
            let show = |l: Option<&String>| l.map_or("<no line>".to_string(), |s| format!("`{}`", s));
            return Some(base.with_note(format!(
                "output line {} is {} unoptimized, {} optimized",
                line + 1,
                show(self.output.get(line)),
                show(other.output.get(line))
            )));
        }

        let describe = |o: &Observed| match &o.outcome {
            Ok(report) => format!("completed with {} unawaited async calls", report.leaked_tasks.len()),
            Err(err) => err.to_string(),
        };
        let failed_at = |o: &Observed| -> Vec<Pos> { o.reports.iter().filter(|r| !r.passed).map(|r| r.pos).collect() };
        let same_outcome = match (&self.outcome, &other.outcome) {
            (Ok(a), Ok(b)) => a.leaked_tasks.len() == b.leaked_tasks.len(),
            (Err(a), Err(b)) => a.error.to_string() == b.error.to_string(),
            _ => false,
        };
        if !same_outcome {
            return Some(base.with_note(format!("unoptimized: {}", describe(self))).with_note(format!(
                "optimized: {}",
                describe(other)
            )));
        }
        if failed_at(self) != failed_at(other) {
            return Some(base.with_note(format!(
                "{} assertions failed unoptimized, {} optimized",
                failed_at(self).len(),
                failed_at(other).len()
            )));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_stops_at_the_first_unreadable_line() {
        let input = read_input(io::Cursor::new(b"1\n2\r\n\xff\n3\n".to_vec()));
        assert_eq!(input, ["1", "2"]);
    }
}
