//! The layoff record, its columns, and the in-memory working table.

use std::fmt;

use chrono::NaiveDate;
use heck::ToSnakeCase;
use rust_decimal::Decimal;

pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Company,
    Location,
    Industry,
    TotalLaidOff,
    PercentageLaidOff,
    Date,
    Stage,
    Country,
    FundsRaisedMillions,
    TotalPopulation,
}

impl Column {
    /// Columns every source file must provide, in canonical order.
    pub const SOURCE: [Column; 9] = [
        Column::Company,
        Column::Location,
        Column::Industry,
        Column::TotalLaidOff,
        Column::PercentageLaidOff,
        Column::Date,
        Column::Stage,
        Column::Country,
        Column::FundsRaisedMillions,
    ];

    /// Columns written by the `clean` command.
    pub const CLEANED: [Column; 10] = [
        Column::Company,
        Column::Location,
        Column::Industry,
        Column::TotalLaidOff,
        Column::PercentageLaidOff,
        Column::Date,
        Column::Stage,
        Column::Country,
        Column::FundsRaisedMillions,
        Column::TotalPopulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Company => "company",
            Column::Location => "location",
            Column::Industry => "industry",
            Column::TotalLaidOff => "total_laid_off",
            Column::PercentageLaidOff => "percentage_laid_off",
            Column::Date => "date",
            Column::Stage => "stage",
            Column::Country => "country",
            Column::FundsRaisedMillions => "funds_raised_millions",
            Column::TotalPopulation => "total_population",
        }
    }

    /// Resolves a raw header such as `Total Laid Off` to its column.
    pub fn from_header(header: &str) -> Option<Column> {
        let normalized = header.trim().trim_start_matches('\u{feff}').to_snake_case();
        Column::CLEANED
            .into_iter()
            .find(|column| column.name() == normalized)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A date cell: source text until the Standardizer parses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordDate {
    Text(String),
    Date(NaiveDate),
}

impl RecordDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RecordDate::Date(date) => Some(*date),
            RecordDate::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDate::Text(text) => f.write_str(text),
            RecordDate::Date(date) => write!(f, "{}", date.format(DATE_OUTPUT_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoffRecord {
    pub company: String,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_laid_off: Option<String>,
    pub date: Option<RecordDate>,
    pub stage: Option<String>,
    pub country: Option<String>,
    pub funds_raised_millions: Option<Decimal>,
    pub total_population: Option<i64>,
    /// Line number in the source file, header being line 1.
    pub source_row: usize,
}

/// The nine source columns, compared with null equal to null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessKey<'a> {
    company: &'a str,
    location: Option<&'a str>,
    industry: Option<&'a str>,
    total_laid_off: Option<i64>,
    percentage_laid_off: Option<&'a str>,
    date: Option<&'a RecordDate>,
    stage: Option<&'a str>,
    country: Option<&'a str>,
    funds_raised_millions: Option<Decimal>,
}

impl LayoffRecord {
    pub fn business_key(&self) -> BusinessKey<'_> {
        BusinessKey {
            company: &self.company,
            location: self.location.as_deref(),
            industry: self.industry.as_deref(),
            total_laid_off: self.total_laid_off,
            percentage_laid_off: self.percentage_laid_off.as_deref(),
            date: self.date.as_ref(),
            stage: self.stage.as_deref(),
            country: self.country.as_deref(),
            funds_raised_millions: self.funds_raised_millions,
        }
    }

    /// Percentage as a number; `None` when missing, blank, or not numeric.
    pub fn percentage(&self) -> Option<Decimal> {
        let raw = self.percentage_laid_off.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse::<Decimal>().ok()
    }

    pub fn has_percentage(&self) -> bool {
        self.percentage_laid_off
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_ref().and_then(RecordDate::as_date)
    }

    /// Renders a cell the way the cleaned CSV stores it; nulls become empty.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Company => self.company.clone(),
            Column::Location => self.location.clone().unwrap_or_default(),
            Column::Industry => self.industry.clone().unwrap_or_default(),
            Column::TotalLaidOff => display_opt(self.total_laid_off),
            Column::PercentageLaidOff => self.percentage_laid_off.clone().unwrap_or_default(),
            Column::Date => display_opt(self.date.as_ref()),
            Column::Stage => self.stage.clone().unwrap_or_default(),
            Column::Country => self.country.clone().unwrap_or_default(),
            Column::FundsRaisedMillions => {
                display_opt(self.funds_raised_millions.map(|d| d.normalize()))
            }
            Column::TotalPopulation => display_opt(self.total_population),
        }
    }
}

fn display_opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// The one mutable table every pipeline stage operates on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingTable {
    pub records: Vec<LayoffRecord>,
}

impl WorkingTable {
    pub fn new(records: Vec<LayoffRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(columns: &[Column]) -> Vec<String> {
        columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn rows(&self, columns: &[Column]) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| columns.iter().map(|c| record.cell(*c)).collect())
            .collect()
    }
}
