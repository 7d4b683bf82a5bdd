// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Ready-made [`Host`] implementations.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tl_ast::{AssertionReport, Host};

/// Process stdio. Failed assertions are kept for the caller to report.
#[derive(Debug, Default)]
pub struct StdHost {
    passed: AtomicUsize,
    failures: Mutex<Vec<AssertionReport>>,
}

impl StdHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed_assertions(&self) -> usize {
        lock(&self.failures).len()
    }

    pub fn passed_assertions(&self) -> usize {
        self.passed.load(Ordering::SeqCst)
    }

    /// Failed assertions in the order they were reported.
    pub fn failures(&self) -> Vec<AssertionReport> {
        lock(&self.failures).clone()
    }
}

impl Host for StdHost {
    fn write_line(&self, text: &str) {
        if let Err(err) = write_line_to(&mut io::stdout().lock(), text) {
            tracing::warn!(%err, "writing program output failed; line dropped");
        }
    }

    fn read_line(&self) -> Option<String> {
        read_line_from(&mut io::stdin().lock())
    }

    fn report_assertion(&self, report: AssertionReport) {
        if report.passed {
            self.passed.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(pos = %report.pos, "{}", report.message);
        } else {
            tracing::warn!(pos = %report.pos, "{}", report.message);
            lock(&self.failures).push(report);
        }
    }
}

fn write_line_to(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text)?;
    out.flush()
}

/// One line without its terminator. End of input and read errors both give `None`.
fn read_line_from(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(err) => {
            tracing::warn!(%err, "reading program input failed; treating as end of input");
            None
        }
    }
}

/// In-memory host for embedding and tests: scripted input, captured output.
#[derive(Debug, Default, Clone)]
pub struct CapturedHost {
    output: Arc<Mutex<Vec<String>>>,
    input: Arc<Mutex<VecDeque<String>>>,
    reports: Arc<Mutex<Vec<AssertionReport>>>,
}

impl CapturedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines handed out by `read_line`, in order.
    pub fn with_input<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.input).extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn output(&self) -> Vec<String> {
        lock(&self.output).clone()
    }

    pub fn reports(&self) -> Vec<AssertionReport> {
        lock(&self.reports).clone()
    }

    pub fn failed_assertions(&self) -> usize {
        lock(&self.reports).iter().filter(|r| !r.passed).count()
    }
}

impl Host for CapturedHost {
    fn write_line(&self, text: &str) {
        lock(&self.output).push(text.to_string());
    }

    fn read_line(&self) -> Option<String> {
        lock(&self.input).pop_front()
    }

    fn report_assertion(&self, report: AssertionReport) {
        lock(&self.reports).push(report);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
