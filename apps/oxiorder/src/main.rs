use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{LevelFilter, debug, info};
use oxiorder_graph::{DiscoveryOptions, DiscoveryOutcome};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oxiorder")]
#[command(about = "Dependency-first file ordering for JavaScript/TypeScript workspaces", long_about = None)]
struct Cli {
    /// Log discovery progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every source file, dependencies first
    Order(DiscoveryOptions),
    /// Print workspace packages, dependencies first
    Packages(DiscoveryOptions),
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn discover(options: DiscoveryOptions) -> Result<DiscoveryOutcome> {
    let root = options.root.clone();
    oxiorder_graph::run_discovery(options).with_context(|| match root {
        Some(root) => format!("Failed to discover dependency order under {}", root.display()),
        None => "Failed to discover dependency order".to_string(),
    })
}

fn print_footer<W: Write>(writer: &mut W, start: Instant, outcome: &DiscoveryOutcome) -> Result<()> {
    writeln!(
        writer,
        "\n{} Finished in {}ms on {} files across {} packages.",
        "●".bright_blue(),
        start.elapsed().as_millis().to_string().cyan(),
        outcome.files_analyzed.to_string().cyan(),
        outcome.packages.len().to_string().cyan()
    )?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("Parsed CLI arguments: {:?}", cli.command);

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let start = Instant::now();

    match cli.command {
        Commands::Order(options) => {
            info!("Computing migration order");
            let outcome = discover(options)?;
            debug!("Ordered {} files", outcome.order.files.len());

            if outcome.order.files.is_empty() {
                oxiorder_graph::print_no_files_message(&mut stdout, &outcome)?;
            } else {
                oxiorder_graph::print_order(&mut stdout, &outcome)?;
            }
            print_footer(&mut stdout, start, &outcome)
        }
        Commands::Packages(options) => {
            info!("Computing package order");
            let outcome = discover(options)?;
            oxiorder_graph::print_packages(&mut stdout, &outcome)?;
            print_footer(&mut stdout, start, &outcome)
        }
    }
}
