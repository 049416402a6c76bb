use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use layoffs_cleaner::{
    clean::clean_table,
    cli::{DatePolicy, ReportKind},
    record::{LayoffRecord, RecordDate, WorkingTable},
    report::build_report,
    rules::CleaningRules,
};

const COMPANIES: &[&str] = &["Amazon", " Meta", "Google ", "Coinbase", "Kry", "Trivago"];
const LOCATIONS: &[&str] = &["Seattle", "SF Bay Area", "MalmÃ¶", "DÃ¼sseldorf", "FlorianÃ³polis"];
const INDUSTRIES: &[&str] = &["Retail", "", "Crypto Currency", "Travel"];

fn generate_table(rows: usize) -> WorkingTable {
    let records = (0..rows)
        .map(|i| LayoffRecord {
            company: COMPANIES[i % COMPANIES.len()].to_string(),
            location: Some(LOCATIONS[i % LOCATIONS.len()].to_string()),
            industry: Some(INDUSTRIES[i % INDUSTRIES.len()].to_string()),
            total_laid_off: (i % 7 != 0).then_some((i % 997) as i64),
            percentage_laid_off: (i % 5 != 0).then(|| format!("0.{:02}", i % 100)),
            date: Some(RecordDate::Text(format!(
                "{}/{}/{}",
                i % 12 + 1,
                i % 28 + 1,
                2020 + i % 4
            ))),
            stage: Some("Post-IPO".to_string()),
            country: Some("United States of America".to_string()),
            funds_raised_millions: Some(((i % 300) as i64).into()),
            total_population: None,
            source_row: i + 2,
        })
        .collect();
    WorkingTable::new(records)
}

fn bench_clean(c: &mut Criterion) {
    let rules = CleaningRules::default();
    let table = generate_table(20_000);
    c.bench_function("clean_table_20k", |b| {
        b.iter_batched(
            || table.clone(),
            |mut table| clean_table(&mut table, &rules, DatePolicy::Abort).expect("clean"),
            BatchSize::LargeInput,
        )
    });

    let mut cleaned = table.clone();
    clean_table(&mut cleaned, &rules, DatePolicy::Abort).expect("clean");
    c.bench_function("reports_20k", |b| {
        b.iter(|| {
            ReportKind::all()
                .iter()
                .map(|kind| build_report(*kind, &cleaned, 5).rows.len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_clean);
criterion_main!(benches);
