pub mod clean;
pub mod cli;
pub mod dedup;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod record;
pub mod report;
pub mod rules;
pub mod standardize;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, RulesArgs},
    rules::CleaningRules,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("layoffs_cleaner", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => clean::execute(&args),
        Commands::Report(args) => report::execute(&args),
        Commands::Rules(args) => handle_rules(&args),
    }
}

fn handle_rules(args: &RulesArgs) -> Result<()> {
    if let Some(path) = &args.check {
        let rules = CleaningRules::load(path)?;
        info!(
            "Rules in {:?} are valid: {} industry, {} location, {} country rule(s)",
            path,
            rules.industry.len(),
            rules.location.len(),
            rules.country.len()
        );
        return Ok(());
    }
    let rules = CleaningRules::default();
    match &args.output {
        Some(path) => {
            rules
                .save(path)
                .with_context(|| format!("Writing default rules to {path:?}"))?;
            info!("Default cleaning rules written to {:?}", path);
        }
        None => print!("{}", rules.to_yaml_string()?),
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
