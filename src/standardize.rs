//! Column rewrites applied to the working table after deduplication.
//!
//! Every step is a fixed point: running [`Standardizer::apply`] over its own
//! output reports zero changes. Backfill runs after the industry rewrites so
//! it copies canonical labels.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{
    cli::DatePolicy,
    error::PipelineError,
    record::{LayoffRecord, RecordDate, WorkingTable},
    rules::{CleaningRules, CompiledRules, RuleTable},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardizeSummary {
    pub companies_trimmed: usize,
    pub industries_blanked: usize,
    pub industries_canonicalized: usize,
    pub locations_canonicalized: usize,
    pub countries_canonicalized: usize,
    pub dates_parsed: usize,
    pub dates_nulled: usize,
    pub rows_with_bad_dates_dropped: usize,
    pub industries_backfilled: usize,
    pub rows_without_signal_dropped: usize,
    pub populations_updated: usize,
}

impl StandardizeSummary {
    pub fn total_changes(&self) -> usize {
        self.companies_trimmed
            + self.industries_blanked
            + self.industries_canonicalized
            + self.locations_canonicalized
            + self.countries_canonicalized
            + self.dates_parsed
            + self.dates_nulled
            + self.rows_with_bad_dates_dropped
            + self.industries_backfilled
            + self.rows_without_signal_dropped
            + self.populations_updated
    }
}

pub struct Standardizer {
    rules: CompiledRules,
    date_formats: Vec<String>,
    date_policy: DatePolicy,
}

impl Standardizer {
    pub fn new(rules: &CleaningRules, date_policy: DatePolicy) -> Result<Self, PipelineError> {
        Ok(Self {
            rules: rules.compile()?,
            date_formats: rules.date_formats.clone(),
            date_policy,
        })
    }

    pub fn apply(&self, table: &mut WorkingTable) -> Result<StandardizeSummary> {
        let mut summary = StandardizeSummary::default();
        for record in &mut table.records {
            if trim_company(record) {
                summary.companies_trimmed += 1;
            }
            if blank_industry_to_null(record) {
                summary.industries_blanked += 1;
            }
            if rewrite(&self.rules.industry, &mut record.industry) {
                summary.industries_canonicalized += 1;
            }
            if rewrite(&self.rules.location, &mut record.location) {
                summary.locations_canonicalized += 1;
            }
            if rewrite(&self.rules.country, &mut record.country) {
                summary.countries_canonicalized += 1;
            }
        }
        info!(
            "Trimmed {} company name(s); canonicalized {} industry, {} location, {} country value(s)",
            summary.companies_trimmed,
            summary.industries_canonicalized,
            summary.locations_canonicalized,
            summary.countries_canonicalized
        );

        self.parse_dates(table, &mut summary)?;
        summary.industries_backfilled = backfill_industry(table);
        summary.rows_without_signal_dropped = drop_rows_without_signal(table);
        summary.populations_updated = derive_total_population(table);
        info!(
            "Standardization finished with {} row(s) and {} change(s)",
            table.len(),
            summary.total_changes()
        );
        Ok(summary)
    }

    fn parse_dates(&self, table: &mut WorkingTable, summary: &mut StandardizeSummary) -> Result<()> {
        let mut keep = Vec::with_capacity(table.len());
        for record in &mut table.records {
            let Some(RecordDate::Text(raw)) = &record.date else {
                keep.push(true);
                continue;
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                record.date = None;
                summary.dates_nulled += 1;
                keep.push(true);
                continue;
            }
            match parse_date(trimmed, &self.date_formats) {
                Some(date) => {
                    record.date = Some(RecordDate::Date(date));
                    summary.dates_parsed += 1;
                    keep.push(true);
                }
                None => match self.date_policy {
                    DatePolicy::Abort => {
                        return Err(PipelineError::InvalidDate {
                            row: record.source_row,
                            value: raw.clone(),
                            formats: self.date_formats.join(", "),
                        }
                        .into());
                    }
                    DatePolicy::Null => {
                        warn!("Row {}: clearing unparsable date '{raw}'", record.source_row);
                        record.date = None;
                        summary.dates_nulled += 1;
                        keep.push(true);
                    }
                    DatePolicy::Skip => {
                        warn!("Row {}: dropping row with unparsable date '{raw}'", record.source_row);
                        summary.rows_with_bad_dates_dropped += 1;
                        keep.push(false);
                    }
                },
            }
        }
        let mut flags = keep.into_iter();
        table.records.retain(|_| flags.next().unwrap_or(true));
        info!(
            "Parsed {} date(s), nulled {}, dropped {} row(s) with bad dates",
            summary.dates_parsed, summary.dates_nulled, summary.rows_with_bad_dates_dropped
        );
        Ok(())
    }
}

fn trim_company(record: &mut LayoffRecord) -> bool {
    let trimmed = record.company.trim();
    if trimmed.len() == record.company.len() {
        return false;
    }
    record.company = trimmed.to_string();
    true
}

fn blank_industry_to_null(record: &mut LayoffRecord) -> bool {
    if record
        .industry
        .as_deref()
        .is_some_and(|value| value.trim().is_empty())
    {
        record.industry = None;
        true
    } else {
        false
    }
}

fn rewrite(table: &RuleTable, cell: &mut Option<String>) -> bool {
    let Some(value) = cell.as_deref() else {
        return false;
    };
    match table.rewrite(value) {
        Some(replacement) => {
            debug!("Rewriting '{value}' -> '{replacement}'");
            *cell = Some(replacement.to_string());
            true
        }
        None => false,
    }
}

pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Fills missing industries from the first known industry of the same
/// (company, location). Rows with a null location never pair.
pub fn backfill_industry(table: &mut WorkingTable) -> usize {
    let fills: Vec<(usize, String)> = {
        let mut known: HashMap<(&str, &str), &str> = HashMap::new();
        for record in &table.records {
            if let (Some(location), Some(industry)) =
                (record.location.as_deref(), record.industry.as_deref())
            {
                known
                    .entry((record.company.as_str(), location))
                    .or_insert(industry);
            }
        }
        table
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.industry.is_none())
            .filter_map(|(idx, record)| {
                let location = record.location.as_deref()?;
                known
                    .get(&(record.company.as_str(), location))
                    .map(|industry| (idx, industry.to_string()))
            })
            .collect()
    };

    let filled = fills.len();
    for (idx, industry) in fills {
        let record = &mut table.records[idx];
        debug!(
            "Row {}: backfilled industry '{industry}' for {}",
            record.source_row, record.company
        );
        record.industry = Some(industry);
    }
    info!("Backfilled {filled} missing industry value(s)");
    filled
}

/// Removes rows where neither the headcount nor the percentage is known.
pub fn drop_rows_without_signal(table: &mut WorkingTable) -> usize {
    let before = table.len();
    table
        .records
        .retain(|record| record.total_laid_off.is_some() || record.has_percentage());
    let removed = before - table.len();
    info!("Dropped {removed} row(s) without layoff figures");
    removed
}

pub fn total_population(total_laid_off: Option<i64>, percentage: Option<Decimal>) -> Option<i64> {
    let percentage = percentage.filter(|p| !p.is_zero())?;
    Decimal::from(total_laid_off?)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(percentage)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

pub fn derive_total_population(table: &mut WorkingTable) -> usize {
    let mut updated = 0usize;
    for record in &mut table.records {
        let derived = total_population(record.total_laid_off, record.percentage());
        if derived != record.total_population {
            record.total_population = derived;
            updated += 1;
        }
    }
    debug!("Derived total_population for {updated} row(s)");
    updated
}
