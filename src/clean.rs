use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{CleanArgs, DatePolicy, InputArgs},
    dedup, io_utils,
    loader::Loader,
    record::{Column, WorkingTable},
    rules::CleaningRules,
    standardize::{StandardizeSummary, Standardizer},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub standardize: StandardizeSummary,
    pub rows_written: usize,
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let (table, summary) = clean_input(&args.input)?;
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input.input, args.input.delimiter);
    let output_path = args.output.as_deref();
    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output_delimiter, input_delimiter);
    write_table(&table, output_path, output_delimiter)?;
    info!(
        "Cleaned {} row(s) into {} ({} duplicate(s) removed) -> {}",
        summary.rows_loaded,
        table.len(),
        summary.duplicates_removed,
        output_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(())
}

/// Loads the input named by `args` and runs it through the cleaning stages.
pub fn clean_input(args: &InputArgs) -> Result<(WorkingTable, CleanSummary)> {
    let rules = CleaningRules::load_or_default(args.rules.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut table = Loader::new(&rules.null_tokens).load_path(&args.input, delimiter, encoding)?;
    let summary = clean_table(&mut table, &rules, args.date_policy)
        .with_context(|| format!("Cleaning {:?}", args.input))?;
    Ok((table, summary))
}

/// Deduplicates then standardizes `table` in place.
///
/// Rows that only differ before standardization (padding, spelling, date
/// format) collapse in a second deduplication pass, so the cleaned table has
/// unique business keys and cleaning it again changes nothing.
pub fn clean_table(
    table: &mut WorkingTable,
    rules: &CleaningRules,
    date_policy: DatePolicy,
) -> Result<CleanSummary> {
    let standardizer = Standardizer::new(rules, date_policy)?;
    let rows_loaded = table.len();
    let mut duplicates_removed = dedup::deduplicate(table);
    let standardize = standardizer.apply(table)?;
    duplicates_removed += dedup::deduplicate(table);
    Ok(CleanSummary {
        rows_loaded,
        duplicates_removed,
        standardize,
        rows_written: table.len(),
    })
}

pub fn write_table(table: &WorkingTable, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    io_utils::write_rows(
        &mut writer,
        &WorkingTable::headers(&Column::CLEANED),
        &table.rows(&Column::CLEANED),
    )
}
