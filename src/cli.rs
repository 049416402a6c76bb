use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean and explore company layoff datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deduplicate and standardize a layoffs CSV, writing the cleaned table
    Clean(CleanArgs),
    /// Clean a layoffs CSV and print the exploratory aggregate reports
    Report(ReportArgs),
    /// Write the built-in cleaning rules as an editable YAML file
    Rules(RulesArgs),
}

/// What to do with a date that matches none of the accepted formats.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum DatePolicy {
    /// Fail the whole run
    #[default]
    Abort,
    /// Clear the date and keep the row
    Null,
    /// Drop the row
    Skip,
}

/// Options shared by every command that loads and cleans an input file.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file overriding the built-in cleaning rules
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Handling of dates that cannot be parsed
    #[arg(long = "on-bad-date", value_enum, default_value = "abort")]
    pub date_policy: DatePolicy,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
#[value(rename_all = "kebab-case")]
pub enum ReportKind {
    Peaks,
    DateRange,
    Company,
    Industry,
    Country,
    Stage,
    Year,
    Month,
    Rolling,
    CompanyYear,
    TopCompanies,
}

impl ReportKind {
    pub fn all() -> &'static [ReportKind] {
        &[
            ReportKind::Peaks,
            ReportKind::DateRange,
            ReportKind::Company,
            ReportKind::Industry,
            ReportKind::Country,
            ReportKind::Stage,
            ReportKind::Year,
            ReportKind::Month,
            ReportKind::Rolling,
            ReportKind::CompanyYear,
            ReportKind::TopCompanies,
        ]
    }

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Peaks => "peaks",
            ReportKind::DateRange => "date-range",
            ReportKind::Company => "company",
            ReportKind::Industry => "industry",
            ReportKind::Country => "country",
            ReportKind::Stage => "stage",
            ReportKind::Year => "year",
            ReportKind::Month => "month",
            ReportKind::Rolling => "rolling",
            ReportKind::CompanyYear => "company-year",
            ReportKind::TopCompanies => "top-companies",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Reports to run (repeatable; defaults to all)
    #[arg(long = "report", value_enum, action = clap::ArgAction::Append)]
    pub reports: Vec<ReportKind>,
    /// Companies to keep per year in the top-companies report
    #[arg(long, default_value_t = 5)]
    pub top: usize,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: ReportFormat,
    /// Directory receiving one CSV file per report (required for --format csv)
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Validate this rules file instead of writing the defaults
    #[arg(long, conflicts_with = "output")]
    pub check: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
