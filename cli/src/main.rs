//! pdfstrip CLI - header, footer and watermark removal for PDF files

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use pdfstrip::{CleanOptions, CleanOutcome, FileCleaner};

#[derive(Parser)]
#[command(name = "pdfstrip")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Remove headers, footers, page numbers and watermarks from PDF files", long_about = None)]
struct Cli {
    /// Input PDF files
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", env = "PDFSTRIP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// JSON file with cleaning options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Header threshold as a fraction of page height
    #[arg(long, value_name = "FRACTION")]
    header_fraction: Option<f64>,

    /// Footer threshold as a fraction of page height
    #[arg(long, value_name = "FRACTION")]
    footer_fraction: Option<f64>,

    /// Leave page annotations in place
    #[arg(long)]
    keep_annotations: bool,

    /// Print cleaning reports as JSON
    #[arg(long)]
    json: bool,

    /// Log per-page and per-stream decisions
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective cleaning options as JSON
    Config,

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match &cli.command {
        Some(Commands::Config) => cmd_config(&cli),
        Some(Commands::Version) => {
            cmd_version();
            Ok(true)
        }
        None if cli.inputs.is_empty() => {
            println!("{}", "Usage: pdfstrip <FILE>...".yellow());
            println!("       pdfstrip --help for more information");
            Ok(true)
        }
        None => cmd_clean(&cli),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Build cleaning options: config file first, then command-line overrides.
fn build_options(cli: &Cli) -> Result<CleanOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => CleanOptions::from_json_file(path)?,
        None => CleanOptions::default(),
    };

    if let Some(dir) = &cli.output_dir {
        options = options.with_output_dir(dir);
    }
    if let Some(fraction) = cli.header_fraction {
        options = options.with_header_fraction(fraction);
    }
    if let Some(fraction) = cli.footer_fraction {
        options = options.with_footer_fraction(fraction);
    }
    if cli.keep_annotations {
        options = options.keep_annotations();
    }

    options.validate()?;
    log::debug!("Cleaning options: {:?}", options);
    Ok(options)
}

fn cmd_config(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let options = build_options(cli)?;
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(true)
}

/// Returns `Ok(false)` when any file failed.
fn cmd_clean(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let cleaner = FileCleaner::new(build_options(cli)?);

    let outcomes = if cli.inputs.len() > 1 && !cli.json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Cleaning {} files...", cli.inputs.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        let outcomes = cleaner.clean_all(&cli.inputs);
        pb.finish_and_clear();
        outcomes
    } else {
        cleaner.clean_all(&cli.inputs)
    };

    if cli.json {
        print_json(&cli.inputs, &outcomes)?;
    } else {
        for (input, outcome) in cli.inputs.iter().zip(&outcomes) {
            print_outcome(input, outcome);
        }
    }

    Ok(outcomes.iter().all(|outcome| outcome.success))
}

fn print_outcome(input: &std::path::Path, outcome: &CleanOutcome) {
    if !outcome.success {
        println!("{} {}", "✗".red().bold(), input.display());
        println!("  {}", outcome.message.red());
        return;
    }

    println!("{} {}", "✓".green().bold(), input.display());
    println!("  {}", outcome.message);
    if let Some(report) = &outcome.report {
        let totals = &report.totals;
        println!(
            "  {} {} pages, {} operators, {} streams, {} skipped pages",
            "├─".dimmed(),
            report.pages,
            totals.operators_removed,
            totals.streams_removed,
            totals.pages_skipped
        );
        if let Some(reduction) = report.size_reduction() {
            println!("  {} {:.1}% smaller", "├─".dimmed(), reduction);
        }
    }
    if let Some(path) = &outcome.output_path {
        println!("  {} {}", "└─".dimmed(), path.display().to_string().cyan());
    }
}

fn print_json(
    inputs: &[PathBuf],
    outcomes: &[CleanOutcome],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = Vec::with_capacity(outcomes.len());
    for (input, outcome) in inputs.iter().zip(outcomes) {
        let report = match &outcome.report {
            Some(report) => serde_json::to_value(report)?,
            None => serde_json::Value::Null,
        };
        entries.push(json!({
            "file": input,
            "success": outcome.success,
            "message": outcome.message,
            "output_path": outcome.output_path,
            "report": report,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfstrip".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF header, footer and watermark removal tool");
    println!();
    println!("License: MIT");
}
