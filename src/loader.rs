//! Loads a layoffs CSV into a [`WorkingTable`] without cleaning anything.

use std::{io::Read, path::Path, str::FromStr};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    error::PipelineError,
    io_utils,
    record::{Column, LayoffRecord, RecordDate, WorkingTable},
};

/// Maps each known column to its position in the input header.
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    positions: Vec<(Column, usize)>,
}

impl HeaderLayout {
    pub fn resolve(headers: &[String]) -> Result<Self, PipelineError> {
        let mut positions: Vec<(Column, usize)> = Vec::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let column = Column::from_header(header).ok_or_else(|| {
                PipelineError::UnexpectedColumn {
                    header: header.clone(),
                    position: idx + 1,
                }
            })?;
            if positions.iter().any(|(seen, _)| *seen == column) {
                return Err(PipelineError::DuplicateColumn(column.name()));
            }
            positions.push((column, idx));
        }
        for required in Column::SOURCE {
            if !positions.iter().any(|(column, _)| *column == required) {
                return Err(PipelineError::MissingColumn(required.name()));
            }
        }
        Ok(Self { positions })
    }

    fn get<'a>(&self, row: &'a [String], column: Column) -> &'a str {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, idx)| row.get(*idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub struct Loader<'a> {
    null_tokens: &'a [String],
}

impl<'a> Loader<'a> {
    pub fn new(null_tokens: &'a [String]) -> Self {
        Self { null_tokens }
    }

    pub fn load_path(
        &self,
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<WorkingTable> {
        info!(
            "Loading '{}' with delimiter '{}'",
            path.display(),
            crate::printable_delimiter(delimiter)
        );
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let table = self
            .load_reader(&mut reader, encoding)
            .with_context(|| format!("Loading {path:?}"))?;
        info!("Loaded {} row(s) from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn load_reader<R: Read>(
        &self,
        reader: &mut csv::Reader<R>,
        encoding: &'static Encoding,
    ) -> Result<WorkingTable> {
        let headers = io_utils::reader_headers(reader, encoding)?;
        let layout = HeaderLayout::resolve(&headers)?;
        debug!("Resolved header layout: {:?}", layout.positions);

        let mut records = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let source_row = row_idx + 2;
            let record = record.with_context(|| format!("Reading row {source_row}"))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {source_row}"))?;
            records.push(self.parse_row(&layout, &decoded, source_row)?);
        }
        Ok(WorkingTable::new(records))
    }

    fn parse_row(
        &self,
        layout: &HeaderLayout,
        row: &[String],
        source_row: usize,
    ) -> Result<LayoffRecord, PipelineError> {
        let text = |column| self.text(layout.get(row, column));
        Ok(LayoffRecord {
            company: layout.get(row, Column::Company).to_string(),
            location: text(Column::Location),
            industry: text(Column::Industry),
            total_laid_off: self.number(layout, row, Column::TotalLaidOff, source_row)?,
            percentage_laid_off: text(Column::PercentageLaidOff),
            date: text(Column::Date).map(RecordDate::Text),
            stage: text(Column::Stage),
            country: text(Column::Country),
            funds_raised_millions: self.number(
                layout,
                row,
                Column::FundsRaisedMillions,
                source_row,
            )?,
            total_population: None,
            source_row,
        })
    }

    fn is_null_token(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        self.null_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(trimmed))
    }

    /// Text cells load verbatim; only null tokens become `None`.
    fn text(&self, raw: &str) -> Option<String> {
        if self.is_null_token(raw) {
            None
        } else {
            Some(raw.to_string())
        }
    }

    fn number<T: FromStr>(
        &self,
        layout: &HeaderLayout,
        row: &[String],
        column: Column,
        source_row: usize,
    ) -> Result<Option<T>, PipelineError> {
        let raw = layout.get(row, column);
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.is_null_token(trimmed) {
            return Ok(None);
        }
        trimmed
            .parse::<T>()
            .map(Some)
            .map_err(|_| PipelineError::InvalidNumber {
                row: source_row,
                column: column.name(),
                value: raw.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;
    use rust_decimal::Decimal;

    const HEADER: &str = "company,location,industry,total_laid_off,percentage_laid_off,date,stage,country,funds_raised_millions";

    fn load(body: &str) -> Result<WorkingTable> {
        let tokens = vec!["NULL".to_string()];
        let input = format!("{HEADER}\n{body}");
        let mut reader = csv::ReaderBuilder::new().from_reader(input.as_bytes());
        Loader::new(&tokens).load_reader(&mut reader, UTF_8)
    }

    #[test]
    fn loads_rows_verbatim_with_null_tokens() {
        let table = load(" Acme ,SF,,NULL,0.1,3/6/2023,Series B,United States,12.5\n").unwrap();
        assert_eq!(table.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.company, " Acme ");
        assert_eq!(record.industry.as_deref(), Some(""));
        assert_eq!(record.total_laid_off, None);
        assert_eq!(record.percentage_laid_off.as_deref(), Some("0.1"));
        assert_eq!(record.date, Some(RecordDate::Text("3/6/2023".into())));
        assert_eq!(record.funds_raised_millions, Some(Decimal::new(125, 1)));
        assert_eq!(record.source_row, 2);
    }

    #[test]
    fn rejects_non_numeric_headcount() {
        let err = load("Acme,SF,Retail,lots,,,,US,\n").unwrap_err();
        let domain = err.downcast_ref::<PipelineError>().expect("pipeline error");
        assert!(matches!(
            domain,
            PipelineError::InvalidNumber { row: 2, column: "total_laid_off", .. }
        ));
    }

    #[test]
    fn header_layout_reports_missing_and_unknown_columns() {
        let headers = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let missing = HeaderLayout::resolve(&headers(&["company", "location"])).unwrap_err();
        assert!(matches!(missing, PipelineError::MissingColumn("industry")));

        let unknown = HeaderLayout::resolve(&headers(&["company", "employees"])).unwrap_err();
        assert!(matches!(
            unknown,
            PipelineError::UnexpectedColumn { position: 2, .. }
        ));

        let duplicate = HeaderLayout::resolve(&headers(&["company", "Company"])).unwrap_err();
        assert!(matches!(duplicate, PipelineError::DuplicateColumn("company")));
    }

    #[test]
    fn accepts_reordered_columns_and_total_population() {
        let input = "date,company,location,industry,total_laid_off,percentage_laid_off,stage,country,funds_raised_millions,total_population\n2023-01-05,Acme,NY,Retail,10,5,Seed,US,1,999\n";
        let tokens = vec!["NULL".to_string()];
        let mut reader = csv::ReaderBuilder::new().from_reader(input.as_bytes());
        let table = Loader::new(&tokens).load_reader(&mut reader, UTF_8).unwrap();
        let record = &table.records[0];
        assert_eq!(record.company, "Acme");
        assert_eq!(record.total_laid_off, Some(10));
        assert_eq!(record.total_population, None);
    }
}
