use anyhow::{Context, Result};
use bldd_core::{scan_directory, write_report, Report, ReportFormat};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled};

/// Inventory the shared libraries ELF executables depend on
#[derive(Parser)]
#[command(
    name = "bldd",
    about = "Report dynamic library usage of ELF executables under a directory",
    version,
    author
)]
struct Cli {
    /// Directory to scan for ELF files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Output file for the report
    #[arg(short, long, default_value = "report.txt")]
    output: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print a per-architecture summary table
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Architecture")]
    architecture: String,
    #[tabled(rename = "Libraries")]
    libraries: usize,
    #[tabled(rename = "Executables")]
    executables: usize,
    #[tabled(rename = "Most used")]
    most_used: String,
}

fn print_summary(report: &Report) {
    if report.is_empty() {
        println!("No dynamically linked ELF executables found.");
        return;
    }

    let rows = report.architectures.iter().map(|arch| SummaryRow {
        architecture: arch.architecture.to_string(),
        libraries: arch.libraries.len(),
        executables: arch.executable_count(),
        most_used: arch
            .libraries
            .first()
            .map(|usage| format!("{} ({})", usage.library, usage.executables.len()))
            .unwrap_or_default(),
    });
    println!("{}", Table::new(rows));
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = scan_directory(&cli.dir).context("Error scanning directory")?;
    log::info!(
        "{} ELF files recorded, {} files skipped",
        outcome.stats.recorded,
        outcome.stats.skipped()
    );

    write_report(&outcome.report, &cli.output, cli.format.into())
        .context("Error generating report")?;

    if cli.summary {
        print_summary(&outcome.report);
    }
    println!(
        "Report generated successfully in {}",
        cli.output.display().to_string().bold()
    );

    Ok(())
}
