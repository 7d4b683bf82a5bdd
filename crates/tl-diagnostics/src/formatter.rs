// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rich terminal formatter for diagnostics.
//!
//! ```text
//! error[P0003]: cannot find `totl` in any visible scope
//!   --> sum.tl:4:9
//!    |
//!  4 | writeLn(totl)
//!    |         ^^^^ not found in this scope
//!    |
//!    = help: names must be declared before use
//! ```

use std::collections::BTreeMap;

use colored::Colorize;
use tl_ast::{LineMap, Pos};

use crate::{Diagnostic, LabelStyle, Severity};

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

/// A source line with its labels.
struct AnnotatedLine<'a> {
    line_num: u32,
    text: &'a str,
    annotations: Vec<Annotation<'a>>,
}

struct Annotation<'a> {
    /// 1-based.
    col_start: usize,
    width: usize,
    style: LabelStyle,
    message: Option<&'a str>,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, file_name: None, line_map: LineMap::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let annotated = self.collect_annotated_lines(diagnostic);
        let location = diagnostic.primary_pos().and_then(|pos| self.locate(pos));
        let (Some(first), Some((line, col, _))) = (annotated.first(), location) else {
            self.format_footer(&mut out, diagnostic, 2);
            return out;
        };

        let file = self.file_name.unwrap_or("<source>");
        out.push_str(&format!("  {} {}:{}:{}\n", "-->".blue(), file, line, col));

        let max_line = annotated.last().map_or(first.line_num, |a| a.line_num);
        let gutter_width = max_line.to_string().len().max(2);

        let mut prev_line_num: Option<u32> = None;
        for line in &annotated {
            match prev_line_num {
                None => out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue())),
                Some(prev) if line.line_num > prev + 1 => {
                    out.push_str(&format!("{} {}\n", " ".repeat(gutter_width), "...".blue()))
                }
                Some(_) => {}
            }
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line.line_num.to_string().blue().bold(),
                "|".blue(),
                line.text,
                width = gutter_width + 1,
            ));
            format_annotations(&mut out, line, gutter_width);
            prev_line_num = Some(line.line_num);
        }

        if !diagnostic.notes.is_empty() || diagnostic.help.is_some() {
            out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));
        }
        self.format_footer(&mut out, diagnostic, gutter_width);
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };

        match &diagnostic.code {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code.0.as_str().red().bold(),
                diagnostic.message.as_str().bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity, diagnostic.message.as_str().bold())),
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic, gutter_width: usize) {
        let indent = " ".repeat(gutter_width + 1);
        for note in &diagnostic.notes {
            out.push_str(&format!("{} {} {}: {}\n", indent, "=".cyan(), "note".cyan().bold(), note));
        }
        if let Some(help) = &diagnostic.help {
            out.push_str(&format!("{} {} {}: {}\n", indent, "=".cyan(), "help".cyan().bold(), help));
        }
    }

    /// The line, 1-based column and line text a position refers to.
    /// Line 0 marks end of input.
    fn locate(&self, pos: Pos) -> Option<(u32, usize, &'a str)> {
        if pos.line == 0 {
            let line = self.line_map.line_count();
            let text = self.line_map.line_text(self.source, line)?;
            return Some((line, text.len() + 1, text));
        }
        let text = self.line_map.line_text(self.source, pos.line)?;
        Some((pos.line, pos.column.max(1) as usize, text))
    }

    fn collect_annotated_lines<'d>(&self, diagnostic: &'d Diagnostic) -> Vec<AnnotatedLine<'d>>
    where
        'a: 'd,
    {
        let mut lines: BTreeMap<u32, AnnotatedLine<'d>> = BTreeMap::new();

        for label in &diagnostic.labels {
            let Some((line_num, col_start, text)) = self.locate(label.pos) else {
                continue;
            };
            lines
                .entry(line_num)
                .or_insert_with(|| AnnotatedLine { line_num, text, annotations: Vec::new() })
                .annotations
                .push(Annotation {
                    col_start,
                    width: token_width(text, col_start),
                    style: label.style,
                    message: label.message.as_deref(),
                });
        }

        lines.into_values().collect()
    }
}

/// Width of the word or operator starting at a 1-based column; at least 1.
fn token_width(text: &str, col: usize) -> usize {
    let rest = text.get(col.saturating_sub(1)..).unwrap_or("");
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '.';
    let width = match rest.chars().next() {
        Some(c) if is_word(c) => rest.chars().take_while(|&c| is_word(c)).count(),
        Some(c) if !c.is_whitespace() => rest.chars().take_while(|&c| !c.is_whitespace() && !is_word(c)).count(),
        _ => 1,
    };
    width.max(1)
}

fn format_annotations(out: &mut String, line: &AnnotatedLine<'_>, gutter_width: usize) {
    // Primary first, then by column.
    let mut sorted: Vec<&Annotation<'_>> = line.annotations.iter().collect();
    sorted.sort_by_key(|a| (a.style.cmp_priority(), a.col_start));

    let line_len = line.text.chars().count().max(sorted.iter().map(|a| a.col_start + a.width).max().unwrap_or(0));
    let mut underline = vec![' '; line_len + 1];
    let mut messages: Vec<(usize, LabelStyle, &str)> = Vec::new();

    for ann in &sorted {
        let ch = match ann.style {
            LabelStyle::Primary => '^',
            LabelStyle::Secondary => '-',
        };
        let start = ann.col_start - 1;
        for slot in underline.iter_mut().skip(start).take(ann.width) {
            if *slot == ' ' {
                *slot = ch;
            }
        }
        if let Some(msg) = ann.message {
            messages.push((ann.col_start, ann.style, msg));
        }
    }

    let underline: String = underline.iter().collect::<String>().trim_end().to_string();
    if underline.is_empty() {
        return;
    }
    let colored_underline = color_underline(&underline);
    let indent = " ".repeat(gutter_width + 1);

    if messages.len() <= 1 {
        match messages.first() {
            Some((_, style, msg)) => out.push_str(&format!(
                "{} {} {} {}\n",
                indent,
                "|".blue(),
                colored_underline,
                styled(msg, *style)
            )),
            None => out.push_str(&format!("{} {} {}\n", indent, "|".blue(), colored_underline)),
        }
        return;
    }

    // Several labels on one line: underline first, then one message per line.
    out.push_str(&format!("{} {} {}\n", indent, "|".blue(), colored_underline));
    messages.sort_by_key(|(col, _, _)| *col);
    for (col, style, msg) in messages.iter().rev() {
        let pipe = match style {
            LabelStyle::Primary => "|".red().bold().to_string(),
            LabelStyle::Secondary => "|".blue().to_string(),
        };
        out.push_str(&format!(
            "{} {} {}{} {}\n",
            indent,
            "|".blue(),
            " ".repeat(col.saturating_sub(1)),
            pipe,
            styled(msg, *style)
        ));
    }
}

fn styled(msg: &str, style: LabelStyle) -> String {
    match style {
        LabelStyle::Primary => msg.red().bold().to_string(),
        LabelStyle::Secondary => msg.blue().to_string(),
    }
}

impl LabelStyle {
    fn cmp_priority(&self) -> u8 {
        match self {
            LabelStyle::Primary => 0,
            LabelStyle::Secondary => 1,
        }
    }
}

/// Color the underline characters (^ in red, - in blue).
fn color_underline(s: &str) -> String {
    let mut result = String::new();
    let mut current = None;
    let mut run = String::new();

    for ch in s.chars() {
        let kind = matches!(ch, '^' | '-').then_some(ch);
        if kind != current && !run.is_empty() {
            result.push_str(&flush_run(&run, current));
            run.clear();
        }
        run.push(ch);
        current = kind;
    }
    if !run.is_empty() {
        result.push_str(&flush_run(&run, current));
    }
    result
}

fn flush_run(run: &str, kind: Option<char>) -> String {
    match kind {
        Some('^') => run.red().bold().to_string(),
        Some('-') => run.blue().to_string(),
        _ => run.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(source: &str, diag: &Diagnostic) -> String {
        colored::control::set_override(false);
        DiagnosticFormatter::new(source).with_file_name("demo.tl").format(diag)
    }

    #[test]
    fn renders_location_source_and_caret() {
        let src = "var total: int = 1\nwriteLn(totl)";
        let diag = Diagnostic::error("cannot find `totl` in any visible scope")
            .with_code("P0003")
            .with_primary(Pos::new(2, 9), "not found in this scope")
            .with_help("names must be declared before use");
        let out = plain(src, &diag);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "error[P0003]: cannot find `totl` in any visible scope");
        assert_eq!(lines[1], "  --> demo.tl:2:9");
        assert_eq!(lines[3], "  2 | writeLn(totl)");
        assert_eq!(lines[4], "    |         ^^^^ not found in this scope");
        assert_eq!(lines.last().copied(), Some("    = help: names must be declared before use"));
    }

    #[test]
    fn end_of_input_points_past_the_last_line() {
        let src = "fun f() {\n writeLn(1)";
        let diag = Diagnostic::error("expected '}', found end of file").with_primary(Pos::new(0, 0), "unexpected here");
        let out = plain(src, &diag);
        assert!(out.contains("2 |  writeLn(1)"), "{}", out);
        assert!(out.contains("^ unexpected here"), "{}", out);
    }

    #[test]
    fn diagnostics_without_labels_have_no_source_block() {
        let diag = Diagnostic::error("`writeLn` is already declared in this scope").with_note("from the prelude");
        let out = plain("", &diag);
        assert!(!out.contains("-->"));
        assert!(out.contains("= note: from the prelude"));
    }

    #[test]
    fn operator_width() {
        assert_eq!(token_width("a := b", 3), 2);
        assert_eq!(token_width("x + 1.5", 5), 3);
        assert_eq!(token_width("", 1), 1);
    }
}
