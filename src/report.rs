//! Read-only exploratory reports over a cleaned layoffs table.
//!
//! Sums skip null headcounts. A group made only of nulls has a null sum and
//! sorts after every real sum; ties fall back to the group key.

use std::{cmp::Ordering, collections::HashMap, fs, hash::Hash, path::Path};

use anyhow::{Context, Result, anyhow};
use chrono::Datelike;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    clean,
    cli::{ReportArgs, ReportFormat, ReportKind},
    io_utils,
    record::{DATE_OUTPUT_FORMAT, LayoffRecord, WorkingTable},
    table,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Report {
    pub name: &'static str,
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    fn new(kind: ReportKind, title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: kind.slug(),
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    if args.format == ReportFormat::Csv && args.output_dir.is_none() {
        return Err(anyhow!("--format csv requires --output-dir"));
    }
    let (table, _) = clean::clean_input(&args.input)?;
    let kinds: Vec<ReportKind> = if args.reports.is_empty() {
        ReportKind::all().to_vec()
    } else {
        args.reports.iter().copied().unique().collect()
    };
    let reports = kinds
        .iter()
        .map(|kind| build_report(*kind, &table, args.top))
        .collect::<Vec<_>>();

    match args.format {
        ReportFormat::Table => {
            for (idx, report) in reports.iter().enumerate() {
                if idx > 0 {
                    println!();
                }
                println!("{}", report.title);
                table::print_table(&report.headers, &report.rows);
            }
        }
        ReportFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(&reports).context("Serializing reports to JSON")?;
            println!("{rendered}");
        }
        ReportFormat::Csv => {
            let dir = args
                .output_dir
                .as_deref()
                .ok_or_else(|| anyhow!("--format csv requires --output-dir"))?;
            write_csv_reports(dir, &reports)?;
        }
    }
    info!("Rendered {} report(s) over {} row(s)", reports.len(), table.len());
    Ok(())
}

pub fn write_csv_reports(dir: &Path, reports: &[Report]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
    for report in reports {
        let path = dir.join(format!("{}.csv", report.name));
        let mut writer = io_utils::open_csv_writer(Some(path.as_path()), io_utils::DEFAULT_CSV_DELIMITER)?;
        io_utils::write_rows(&mut writer, &report.headers, &report.rows)
            .with_context(|| format!("Writing report {path:?}"))?;
    }
    info!("Wrote {} report file(s) to {:?}", reports.len(), dir);
    Ok(())
}

pub fn build_report(kind: ReportKind, table: &WorkingTable, top: usize) -> Report {
    let records = table.records.as_slice();
    match kind {
        ReportKind::Peaks => peaks(records),
        ReportKind::DateRange => date_range(records),
        ReportKind::Company => sum_by_text(kind, "Layoffs by company", "company", records, |r| {
            Some(r.company.clone())
        }),
        ReportKind::Industry => {
            sum_by_text(kind, "Layoffs by industry", "industry", records, |r| {
                r.industry.clone()
            })
        }
        ReportKind::Country => sum_by_text(kind, "Layoffs by country", "country", records, |r| {
            r.country.clone()
        }),
        ReportKind::Stage => sum_by_text(kind, "Layoffs by stage", "stage", records, |r| {
            r.stage.clone()
        }),
        ReportKind::Year => by_year(records),
        ReportKind::Month => by_month(records),
        ReportKind::Rolling => rolling_total(records),
        ReportKind::CompanyYear => by_company_year(records),
        ReportKind::TopCompanies => top_companies_per_year(records, top),
    }
}

fn add(acc: Option<i64>, value: Option<i64>) -> Option<i64> {
    match (acc, value) {
        (acc, None) => acc,
        (None, Some(value)) => Some(value),
        (Some(acc), Some(value)) => Some(acc.saturating_add(value)),
    }
}

fn render(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Sums `total_laid_off` per key; rows for which `key` yields `None` are skipped.
fn group_sums<K, F>(records: &[LayoffRecord], key: F) -> Vec<(K, Option<i64>)>
where
    K: Hash + Eq,
    F: Fn(&LayoffRecord) -> Option<K>,
{
    records
        .iter()
        .filter_map(|record| key(record).map(|k| (k, record.total_laid_off)))
        .into_grouping_map()
        .fold(None, |acc, _key, value| add(acc, value))
        .into_iter()
        .collect()
}

fn by_sum_desc<K: Ord>(left: &(K, Option<i64>), right: &(K, Option<i64>)) -> Ordering {
    let by_sum = match (left.1, right.1) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_sum.then_with(|| left.0.cmp(&right.0))
}

/// Dense ranks for values already sorted best-first: ties share a rank and
/// the next distinct value takes the next integer.
pub fn dense_rank<T: PartialEq>(sorted: &[T]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut rank = 0usize;
    for (idx, value) in sorted.iter().enumerate() {
        if idx == 0 || sorted[idx - 1] != *value {
            rank += 1;
        }
        ranks.push(rank);
    }
    ranks
}

fn peaks(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(
        ReportKind::Peaks,
        "Largest single layoff",
        &["max_total_laid_off", "max_percentage_laid_off"],
    );
    let max_total = records.iter().filter_map(|r| r.total_laid_off).max();
    let max_percentage = records.iter().filter_map(LayoffRecord::percentage).max();
    report.rows.push(vec![
        render(max_total),
        max_percentage
            .map(|p| p.normalize().to_string())
            .unwrap_or_default(),
    ]);
    report
}

fn date_range(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(ReportKind::DateRange, "Date range", &["min_date", "max_date"]);
    let dates = records.iter().filter_map(LayoffRecord::parsed_date);
    let (min, max) = match dates.minmax().into_option() {
        Some((min, max)) => (
            min.format(DATE_OUTPUT_FORMAT).to_string(),
            max.format(DATE_OUTPUT_FORMAT).to_string(),
        ),
        None => (String::new(), String::new()),
    };
    report.rows.push(vec![min, max]);
    report
}

fn sum_by_text<F>(
    kind: ReportKind,
    title: &str,
    column: &str,
    records: &[LayoffRecord],
    key: F,
) -> Report
where
    F: Fn(&LayoffRecord) -> Option<String>,
{
    let mut report = Report::new(kind, title, &[column, "total_laid_off"]);
    let mut sums = group_sums(records, |record| Some(key(record)));
    sums.sort_by(by_sum_desc);
    report.rows = sums
        .into_iter()
        .map(|(group, sum)| vec![group.unwrap_or_default(), render(sum)])
        .collect();
    report
}

fn by_year(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(ReportKind::Year, "Layoffs by year", &["year", "total_laid_off"]);
    let mut sums = group_sums(records, |record| {
        Some(record.parsed_date().map(|d| d.year()))
    });
    // Newest year first, undated rows last.
    sums.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    report.rows = sums
        .into_iter()
        .map(|(year, sum)| vec![render(year.map(i64::from)), render(sum)])
        .collect();
    report
}

fn monthly_sums(records: &[LayoffRecord]) -> Vec<(String, Option<i64>)> {
    let mut sums = group_sums(records, |record| {
        record.parsed_date().map(|d| d.format("%Y-%m").to_string())
    });
    sums.sort_by(|a, b| a.0.cmp(&b.0));
    sums
}

fn by_month(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(
        ReportKind::Month,
        "Layoffs by month",
        &["month", "total_laid_off"],
    );
    report.rows = monthly_sums(records)
        .into_iter()
        .map(|(month, sum)| vec![month, render(sum)])
        .collect();
    report
}

fn rolling_total(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(
        ReportKind::Rolling,
        "Rolling total of layoffs by month",
        &["month", "total_laid_off", "rolling_total"],
    );
    let mut running = None;
    for (month, sum) in monthly_sums(records) {
        running = add(running, sum);
        report.rows.push(vec![month, render(sum), render(running)]);
    }
    report
}

fn company_year_sums(records: &[LayoffRecord]) -> Vec<((String, Option<i32>), Option<i64>)> {
    let mut sums = group_sums(records, |record| {
        Some((record.company.clone(), record.parsed_date().map(|d| d.year())))
    });
    sums.sort_by(by_sum_desc);
    sums
}

fn by_company_year(records: &[LayoffRecord]) -> Report {
    let mut report = Report::new(
        ReportKind::CompanyYear,
        "Layoffs by company and year",
        &["company", "year", "total_laid_off"],
    );
    report.rows = company_year_sums(records)
        .into_iter()
        .map(|((company, year), sum)| vec![company, render(year.map(i64::from)), render(sum)])
        .collect();
    report
}

fn top_companies_per_year(records: &[LayoffRecord], top: usize) -> Report {
    let mut report = Report::new(
        ReportKind::TopCompanies,
        format!("Top {top} companies per year"),
        &["year", "company", "total_laid_off", "ranking"],
    );
    let mut per_year: HashMap<i32, Vec<(String, i64)>> = HashMap::new();
    for ((company, year), sum) in company_year_sums(records) {
        if let (Some(year), Some(sum)) = (year, sum) {
            per_year.entry(year).or_default().push((company, sum));
        }
    }
    for year in per_year.keys().copied().sorted() {
        let companies = &per_year[&year];
        let totals: Vec<i64> = companies.iter().map(|(_, sum)| *sum).collect();
        for ((company, sum), rank) in companies.iter().zip(dense_rank(&totals)) {
            if rank > top {
                break;
            }
            report.rows.push(vec![
                year.to_string(),
                company.clone(),
                sum.to_string(),
                rank.to_string(),
            ]);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordDate;
    use chrono::NaiveDate;

    fn row(company: &str, industry: Option<&str>, total: Option<i64>, date: &str) -> LayoffRecord {
        LayoffRecord {
            company: company.into(),
            industry: industry.map(str::to_string),
            total_laid_off: total,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(RecordDate::Date),
            ..Default::default()
        }
    }

    fn sample() -> WorkingTable {
        WorkingTable::new(vec![
            row("Amazon", Some("Retail"), Some(10000), "2023-01-04"),
            row("Google", Some("Consumer"), Some(12000), "2023-01-20"),
            row("Meta", Some("Consumer"), Some(11000), "2022-11-09"),
            row("Amazon", Some("Retail"), Some(8000), "2022-11-16"),
            row("Tiny", None, None, "2022-11-20"),
            row("Undated", Some("Retail"), Some(5), ""),
        ])
    }

    #[test]
    fn dense_rank_shares_ties_without_gaps() {
        assert_eq!(dense_rank(&[30, 30, 20, 10, 10, 5]), vec![1, 1, 2, 3, 3, 4]);
        assert!(dense_rank::<i64>(&[]).is_empty());
    }

    #[test]
    fn company_sums_descend_with_null_sums_last() {
        let report = build_report(ReportKind::Company, &sample(), 5);
        assert_eq!(report.headers, vec!["company", "total_laid_off"]);
        assert_eq!(report.rows[0], vec!["Amazon", "18000"]);
        assert_eq!(report.rows[1], vec!["Google", "12000"]);
        assert_eq!(report.rows.last().unwrap(), &vec!["Tiny".to_string(), String::new()]);
    }

    #[test]
    fn industry_report_keeps_null_group() {
        let report = build_report(ReportKind::Industry, &sample(), 5);
        assert_eq!(report.rows[0], vec!["Consumer", "23000"]);
        assert!(report.rows.iter().any(|r| r[0].is_empty()));
    }

    #[test]
    fn rolling_total_accumulates_chronologically() {
        let report = build_report(ReportKind::Rolling, &sample(), 5);
        assert_eq!(
            report.rows,
            vec![
                vec!["2022-11", "19000", "19000"],
                vec!["2023-01", "22000", "41000"],
            ]
        );
    }

    #[test]
    fn date_range_and_peaks() {
        let table = sample();
        let range = build_report(ReportKind::DateRange, &table, 5);
        assert_eq!(range.rows[0], vec!["2022-11-09", "2023-01-20"]);
        let peaks = build_report(ReportKind::Peaks, &table, 5);
        assert_eq!(peaks.rows[0], vec!["12000", ""]);
    }

    #[test]
    fn top_companies_use_dense_rank_per_year() {
        let mut table = sample();
        table.records.push(row("Meta", Some("Consumer"), Some(1000), "2022-12-01"));
        table.records.push(row("Twitter", Some("Consumer"), Some(12000), "2022-11-04"));
        let report = build_report(ReportKind::TopCompanies, &table, 2);
        assert_eq!(
            report.rows,
            vec![
                vec!["2022", "Meta", "12000", "1"],
                vec!["2022", "Twitter", "12000", "1"],
                vec!["2022", "Amazon", "8000", "2"],
                vec!["2023", "Google", "12000", "1"],
                vec!["2023", "Amazon", "10000", "2"],
            ]
        );
    }

    #[test]
    fn year_report_puts_undated_rows_last() {
        let report = build_report(ReportKind::Year, &sample(), 5);
        assert_eq!(report.rows[0], vec!["2023", "22000"]);
        assert_eq!(report.rows[1], vec!["2022", "19000"]);
        assert_eq!(report.rows[2], vec!["", "5"]);
    }
}
