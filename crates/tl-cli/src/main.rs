// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! tl CLI - phase inspection and file runner.

mod commands;
mod help;
mod output;

use std::env;
use std::process;

use tl_diagnostics::formatter::DiagnosticFormatter;
use tl_diagnostics::{json, Diagnostic};
use tracing::level_filters::LevelFilter;

use commands::run::RunOptions;

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

/// Flags accepted before or after the command.
struct GlobalFlags {
    format: Format,
    verbosity: i8,
}

fn main() {
    output::init();

    let (flags, args) = match split_global_flags(env::args().skip(1)) {
        Ok(split) => split,
        Err(msg) => {
            eprintln!("{}: {}", output::error_label(), msg);
            process::exit(1);
        }
    };
    init_logging(flags.verbosity);

    let Some(cmd) = args.first() else {
        help::print_usage();
        return;
    };
    let rest = &args[1..];
    let format = flags.format;

    match cmd.as_str() {
        "lex" => commands::inspect::cmd_lex(require_file(rest, "lex"), format),
        "parse" => commands::inspect::cmd_parse(require_file(rest, "parse"), format),
        "optimize" => commands::inspect::cmd_optimize(require_file(rest, "optimize"), format),
        "run" => {
            let mut opts = RunOptions::default();
            let mut file = None;
            for arg in rest {
                match arg.as_str() {
                    "--no-optimize" => opts.optimize = false,
                    "--compare" => opts.compare = true,
                    flag if flag.starts_with('-') => {
                        eprintln!("{}: unknown flag for `run`: {}", output::error_label(), flag);
                        help::print_run_usage();
                        process::exit(1);
                    }
                    path => file = Some(path),
                }
            }
            let Some(path) = file else {
                help::print_run_usage();
                process::exit(1);
            };
            commands::run::cmd_run(path, opts, format);
        }
        "help" | "--help" | "-h" => help::print_usage(),
        "version" | "--version" | "-V" => {
            println!("{} {}", output::title("tl"), output::version(env!("CARGO_PKG_VERSION")));
        }
        other if other.ends_with(".tl") => commands::run::cmd_run(other, RunOptions::default(), format),
        other => {
            eprintln!("{}: unknown command: {}", output::error_label(), other);
            help::print_usage();
            process::exit(1);
        }
    }
}

/// Pull `--format`, `-v` and `-q` out of the argument list.
fn split_global_flags(mut args: impl Iterator<Item = String>) -> Result<(GlobalFlags, Vec<String>), String> {
    let mut flags = GlobalFlags { format: Format::Human, verbosity: 0 };
    let mut rest = Vec::new();

    while let Some(arg) = args.next() {
        let format_value = match arg.as_str() {
            "--format" => Some(args.next().ok_or("`--format` needs a value: human or json")?),
            other => other.strip_prefix("--format=").map(str::to_string),
        };
        if let Some(value) = format_value {
            flags.format = match value.as_str() {
                "human" => Format::Human,
                "json" => Format::Json,
                other => return Err(format!("unknown format `{}`, expected human or json", other)),
            };
            continue;
        }
        match arg.as_str() {
            "--json" => flags.format = Format::Json,
            "-v" | "--verbose" => flags.verbosity += 1,
            "-q" | "--quiet" => flags.verbosity -= 1,
            _ => rest.push(arg),
        }
    }
    Ok((flags, rest))
}

/// Install the stderr subscriber. `TL_LOG` wins over `-v`/`-q`.
fn init_logging(verbosity: i8) {
    let from_flags = match verbosity {
        i8::MIN..=-1 => LevelFilter::ERROR,
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let level = env::var("TL_LOG").ok().and_then(|v| v.parse::<LevelFilter>().ok()).unwrap_or(from_flags);

    tracing_subscriber::fmt().with_max_level(level).with_target(false).with_writer(std::io::stderr).init();
}

fn require_file<'a>(rest: &'a [String], cmd: &str) -> &'a str {
    match rest.first() {
        Some(path) => path,
        None => {
            eprintln!("Usage: {} {}", output::command(&format!("tl {}", cmd)), output::arg("<file.tl>"));
            process::exit(1);
        }
    }
}

/// Print diagnostics in the requested format.
///
/// Human output goes to stderr. JSON reports go to stdout, one per phase.
pub fn show_diagnostics(diags: &[Diagnostic], source: &str, path: &str, phase: &str, format: Format) {
    match format {
        Format::Human => {
            let formatter = DiagnosticFormatter::new(source).with_file_name(path);
            for diag in diags {
                eprintln!("{}", formatter.format(diag));
            }
        }
        Format::Json => {
            let report = json::to_json_report(diags, source, path, phase);
            println!("{}", json::to_json_string(&report));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(args: &[&str]) -> Result<(GlobalFlags, Vec<String>), String> {
        split_global_flags(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn global_flags_anywhere() {
        let (flags, rest) = split(&["run", "--format", "json", "demo.tl", "-v", "-v"]).unwrap();
        assert_eq!(flags.format, Format::Json);
        assert_eq!(flags.verbosity, 2);
        assert_eq!(rest, ["run", "demo.tl"]);

        let (flags, rest) = split(&["-q", "--format=human", "lex", "a.tl"]).unwrap();
        assert_eq!(flags.format, Format::Human);
        assert_eq!(flags.verbosity, -1);
        assert_eq!(rest, ["lex", "a.tl"]);
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(split(&["--format", "xml", "lex"]).is_err());
        assert!(split(&["lex", "--format"]).is_err());
    }
}
