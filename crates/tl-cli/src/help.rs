// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Usage text.

use colored::Colorize;

use crate::output;

pub fn print_usage() {
    println!(
        "{} {} - a small scripting language with scoped declarations",
        output::title("tl"),
        output::version(env!("CARGO_PKG_VERSION"))
    );
    println!();
    println!("{}: {} {} {}", "Usage".yellow(), output::command("tl"), output::arg("<command>"), output::arg("[args]"));

    println!();
    println!("{}", output::section_header("Running:"));
    println!("  {} {}         Optimize and run a program", output::command("run"), output::arg("<file>"));
    println!("      {}      Run without constant folding", output::arg("--no-optimize"));
    println!("      {}          Run both ways and check they agree", output::arg("--compare"));
    println!("  {}                  Same as {}", output::arg("<file.tl>"), output::command("run"));

    println!();
    println!("{}", output::section_header("Compilation Phases:"));
    println!("  {} {}         Tokenize a file and print tokens", output::command("lex"), output::arg("<file>"));
    println!("  {} {}       Parse a file and print the tree", output::command("parse"), output::arg("<file>"));
    println!("  {} {}    Fold constants and print the result", output::command("optimize"), output::arg("<file>"));

    println!();
    println!("{}", output::section_header("Options:"));
    println!("  {}  Diagnostic format (default: human)", output::arg("--format human|json"));
    println!("  {}            More log output (repeat for trace)", output::arg("-v, --verbose"));
    println!("  {}              Errors only", output::arg("-q, --quiet"));

    println!();
    println!("{}", output::section_header("Environment:"));
    println!("  {}       Log level filter (error, warn, info, debug, trace, off)", output::arg("TL_LOG"));
    println!("  {}     Disable colors", output::arg("NO_COLOR"));
    println!("  {}  Force colors", output::arg("FORCE_COLOR"));
}

pub fn print_run_usage() {
    println!(
        "{}: {} {} {}",
        "Usage".yellow(),
        output::command("tl run"),
        output::arg("[--no-optimize | --compare]"),
        output::arg("<file.tl>")
    );
}
