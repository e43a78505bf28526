//! Hobart CLI binary.
//!
//! Prepares the discretionary accruals sample and reports on it.

use clap::{Parser, Subcommand};
use hobart::accruals::{AccrualEstimates, AccrualModelKind};
use hobart::output::variable_label;
use hobart::PipelineConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: discretionary accruals for Compustat firm-years", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "config/hobart.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analysis sample from the Compustat extract
    Prepare,

    /// Estimate a single accrual model and write its table
    Estimate {
        /// Model to estimate (mj or dd)
        #[arg(long)]
        model: AccrualModelKind,
    },

    /// Descriptive statistics and correlations of the analysis sample
    Analyze,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config)?;

    match cli.command {
        Commands::Prepare => prepare(&config),
        Commands::Estimate { model } => estimate(&config, model),
        Commands::Analyze => analyze(&config),
    }
}

fn prepare(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Preparing analysis sample...");
    let prepared = match hobart::prepare(config) {
        Ok(prepared) => {
            pb.finish_with_message(format!(
                "Wrote {} firm-years to {}",
                prepared.sample.height(),
                config.paths.sample.display()
            ));
            prepared
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    println!();
    for estimates in &prepared.estimates {
        print_summary(estimates);
    }

    Ok(())
}

fn estimate(config: &PipelineConfig, model: AccrualModelKind) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Estimating accruals...");
    let estimates = match hobart::estimate(config, model) {
        Ok(estimates) => {
            pb.finish_with_message(format!(
                "Wrote {} to {}",
                model.name(),
                hobart::accruals_path(&config.paths, model).display()
            ));
            estimates
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    println!();
    print_summary(&estimates);
    Ok(())
}

fn analyze(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Building analysis report...");
    let report = match hobart::analyze(config) {
        Ok(report) => {
            pb.finish_with_message(format!(
                "Wrote report to {}",
                config.paths.results_dir.display()
            ));
            report
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    println!("\nSample: {}\n", report.info);
    println!("{}", report.descriptive);

    println!("Variables:");
    for variable in &report.descriptive.rows {
        println!("  {:<14} {}", variable.variable, variable_label(&variable.variable));
    }

    Ok(())
}

fn print_summary(estimates: &AccrualEstimates) {
    let summary = &estimates.summary;
    println!("{}", estimates.model.name());
    println!("  Industry-years:  {}", summary.groups);
    println!("    fitted:        {}", summary.fitted);
    println!("    too small:     {}", summary.undersized);
    println!("    failed:        {}", summary.failed);
    println!("  Firm-years:      {}", summary.observations);
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}
