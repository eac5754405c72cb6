//! Report printers for each output format

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use netcalc_cidr::{Report, Table};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

pub fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print_human(report),
        OutputFormat::Json => print_json(report, true)?,
        OutputFormat::JsonCompact => print_json(report, false)?,
        OutputFormat::Csv => print_csv(report)?,
    }
    Ok(())
}

fn print_human(report: &Report) {
    for line in human_lines(report) {
        println!("{}", line);
    }
}

/// Table lines; widths are fixed before the header is coloured
fn human_lines(report: &Report) -> Vec<String> {
    let table = Table::new(report.rows());
    let header = table.header();
    let rule = "─".repeat(header.chars().count());

    let mut lines = Vec::with_capacity(report.rows().len() + 2);
    lines.push(header.bold().cyan().to_string());
    lines.push(rule.dimmed().to_string());
    lines.extend(table.rows());
    lines
}

fn print_json(report: &Report, pretty: bool) -> Result<()> {
    println!("{}", json_string(report, pretty)?);
    Ok(())
}

fn json_string(report: &Report, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

fn print_csv(report: &Report) -> Result<()> {
    write_csv(report, std::io::stdout())
}

fn write_csv<W: std::io::Write>(report: &Report, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in report.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
