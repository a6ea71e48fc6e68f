//! mwp CLI - polynomial growth-bound analysis of C programs
//!
//! Parses the input (optionally through the C preprocessor), runs the
//! mwp-analysis on every function, prints the bounds and writes the result
//! as JSON.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use console::style;
use mwp_cli::{cpp, file_io, parser};
use mwp_core::analysis;
use std::fs;
use std::path::PathBuf;

/// Polynomial growth-bound (mwp) analysis of C programs
#[derive(Parser)]
#[command(name = "mwp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to C source code file
    file: Option<PathBuf>,

    /// File for storing the analysis result
    #[arg(long)]
    outfile: Option<PathBuf>,

    /// Save log messages into a file
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Skip writing the result to a file
    #[arg(long)]
    no_save: bool,

    /// Disable execution of the C preprocessor on the input file
    #[arg(long)]
    no_cpp: bool,

    /// Path to the C preprocessor on your system
    #[arg(long, env = "MWP_CPP", default_value = "gcc")]
    cpp: String,

    /// Arguments to pass to the C preprocessor
    #[arg(long, default_value = "-E")]
    cpp_args: String,

    /// Always run the analysis to completion, even without any bound
    #[arg(long)]
    fin: bool,

    /// Require supported syntax: skip functions using anything else
    #[arg(long)]
    strict: bool,

    /// Also analyze every loop independently
    #[arg(long)]
    loops: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.logfile.as_deref());

    let Some(file) = cli.file.clone() else {
        let _ = Cli::command().print_help();
        std::process::exit(1);
    };

    if let Err(e) = run(&cli, &file) {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

fn run(cli: &Cli, file: &PathBuf) -> Result<()> {
    let source = if cli.no_cpp {
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?
    } else {
        cpp::preprocess(file, &cli.cpp, &cli.cpp_args)?
    };
    let program = parser::parse(&source)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let mut result = analysis::run(&program, cli.fin, cli.strict);
    if cli.loops {
        let loops = analysis::run_loops(&program, cli.strict);
        result.loops = loops.loops;
    }

    for func in &result.functions {
        if func.infinite {
            println!(
                "{} {}: no polynomial bound exists",
                style("✗").red().bold(),
                func.name
            );
            for (input, output) in &func.inf_flows {
                println!("    infinite flow: {input} -> {output}");
            }
        } else if let Some(bound) = &func.bound {
            println!("{} {}: {bound}", style("✓").green().bold(), func.name);
        }
    }
    for lp in &result.loops {
        let classes: Vec<String> = lp
            .classes
            .iter()
            .map(|(var, class)| format!("{var}:{class}"))
            .collect();
        println!("  loop {} -> {}", lp.loop_code, classes.join(" "));
    }

    if !cli.no_save {
        let out = cli
            .outfile
            .clone()
            .unwrap_or_else(|| file_io::default_file_out(file));
        file_io::save_result(&out, &result)?;
    }
    Ok(())
}

fn init_logger(logfile: Option<&std::path::Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp(None).format_target(false);
    if let Some(path) = logfile {
        match fs::File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("cannot open log file {}: {e}", path.display()),
        }
    }
    builder.init();
}
