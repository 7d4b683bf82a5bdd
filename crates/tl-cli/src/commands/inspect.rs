// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Phase inspection commands: lex, parse, optimize.

use std::process;

use colored::Colorize;
use tl_ast::Environment;
use tl_diagnostics::ToDiagnostic;
use tl_optimizer::Optimizer;

use super::pipeline;
use crate::{output, show_diagnostics, Format};

pub fn cmd_lex(path: &str, format: Format) {
    let source = pipeline::read_source(path);
    let tokens = pipeline::lex(&source, path, format);

    if format == Format::Json {
        show_diagnostics(&[], &source, path, "lex", format);
        return;
    }
    println!("{}\n", output::section(&format!("Tokens ({})", tokens.len())));
    for tok in &tokens {
        println!("{:4}:{:<3} {:<12} {}", tok.line, tok.column, format!("{:?}", tok.kind), tok.text.dimmed());
    }
    println!("\n{}", output::banner_ok(&format!("Lex: {} tokens", tokens.len())));
}

pub fn cmd_parse(path: &str, format: Format) {
    let frontend = pipeline::run_frontend(path, format);

    if format == Format::Json {
        show_diagnostics(&frontend.pending, &frontend.source, path, "parse", format);
        return;
    }
    print_program(&frontend.env);
    println!("\n{}", output::banner_ok("Parse"));
}

pub fn cmd_optimize(path: &str, format: Format) {
    let mut frontend = pipeline::run_frontend(path, format);

    let stats = match Optimizer::new(&mut frontend.env).optimize() {
        Ok(stats) => stats,
        Err(err) => {
            frontend.pending.push(err.to_diagnostic());
            show_diagnostics(&frontend.pending, &frontend.source, path, "optimize", format);
            if format == Format::Human {
                eprintln!("\n{}", output::banner_fail("Optimize", 1));
            }
            process::exit(1);
        }
    };

    if format == Format::Json {
        show_diagnostics(&frontend.pending, &frontend.source, path, "optimize", format);
        return;
    }
    print_program(&frontend.env);
    println!(
        "\n{}",
        output::banner_ok(&format!(
            "Optimize: {} folded, {} calls elided, {} blocks removed",
            stats.folded_exprs, stats.elided_calls, stats.removed_blocks
        ))
    );
}

/// Top-level nodes, then the body of every user function.
fn print_program(env: &Environment) {
    println!("{}\n", output::section(&format!("Program ({} nodes)", env.root.nodes.len())));
    for node in &env.root.nodes {
        println!("{:#?}", node);
    }

    for fun in env.functions.iter().filter(|f| !f.is_native()) {
        let Some(body) = fun.block() else { continue };
        println!("\n{}\n", output::section(&format!("fun {} ({} nodes)", fun.name, body.nodes.len())));
        for node in &body.nodes {
            println!("{:#?}", node);
        }
    }
}
