use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::EnrichedRecord;
use crate::config::{AnalysisConfig, DuplicatePolicy, MalformedRowPolicy};
use crate::error::{AnalysisError, Result};
use crate::schema::{derived, input};

/// One country's row, after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub coffee_consumption: f64,
    pub happiness_score: f64,
    pub continent: Option<String>,
    pub daily_coffee_cups: Option<f64>,
}

/// A row left out under the `skip` / `keep-first` policies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedRow {
    pub row: usize,
    pub reason: String,
}

/// Loaded records plus whatever was excluded on the way in.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub excluded: Vec<ExcludedRow>,
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Load the configured data file.
pub fn load(config: &AnalysisConfig) -> Result<Dataset> {
    load_csv(&config.data_file, config)
}

pub fn load_csv(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Dataset> {
    let df = read_csv_as_strings(path.as_ref(), &config.columns)?;
    debug!(
        path = %path.as_ref().display(),
        rows = df.height(),
        "read input file"
    );
    from_frame(&df, config)
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names and applies the configured renames.
pub fn read_csv_as_strings(path: &Path, rename: &BTreeMap<String, String>) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    if !rename.is_empty() {
        let old: Vec<&str> = rename.keys().map(|s| s.as_str()).collect();
        let new: Vec<&str> = rename.values().map(|s| s.as_str()).collect();
        // Absent source columns are ignored; require_columns reports what is still missing.
        df = df.lazy().rename(old, new, false).collect()?;
    }

    Ok(df)
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(AnalysisError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Column as String dtype, or `None` when the frame does not have it.
fn string_column(df: &DataFrame, name: &str) -> Result<Option<Column>> {
    match df.column(name) {
        Ok(c) => Ok(Some(c.cast(&DataType::String)?)),
        Err(_) => Ok(None),
    }
}

/// Coerce a string frame into records, applying the row and duplicate policies.
pub fn from_frame(df: &DataFrame, config: &AnalysisConfig) -> Result<Dataset> {
    require_columns(df, &input::REQUIRED)?;

    let missing = |name: &str| AnalysisError::MissingColumn(name.to_string());
    let country_col = string_column(df, input::COUNTRY)?.ok_or_else(|| missing(input::COUNTRY))?;
    let coffee_col = string_column(df, input::COFFEE_CONSUMPTION)?
        .ok_or_else(|| missing(input::COFFEE_CONSUMPTION))?;
    let happiness_col = string_column(df, input::HAPPINESS_SCORE)?
        .ok_or_else(|| missing(input::HAPPINESS_SCORE))?;
    let continent_col = string_column(df, input::CONTINENT)?;
    let cups_col = string_column(df, input::DAILY_COFFEE_CUPS)?;

    let raw = RawColumns {
        countries: country_col.str()?,
        coffee: coffee_col.str()?,
        happiness: happiness_col.str()?,
        continents: continent_col.as_ref().map(|c| c.str()).transpose()?,
        cups: cups_col.as_ref().map(|c| c.str()).transpose()?,
    };

    let mut dataset = Dataset::default();
    let mut seen: HashSet<String> = HashSet::new();

    for i in 0..df.height() {
        let row = i + 1;
        let record = match raw.record(i, row) {
            Ok(record) => record,
            Err(err @ AnalysisError::MalformedRow { .. }) => match config.malformed_rows {
                MalformedRowPolicy::Fail => return Err(err),
                MalformedRowPolicy::Skip => {
                    warn!(row, "excluding malformed row: {err}");
                    dataset.excluded.push(ExcludedRow {
                        row,
                        reason: err.to_string(),
                    });
                    continue;
                }
            },
            Err(err) => return Err(err),
        };

        if !seen.insert(record.country.clone()) {
            match config.duplicate_countries {
                DuplicatePolicy::Fail => {
                    return Err(AnalysisError::DuplicateCountry {
                        country: record.country,
                        row,
                    })
                }
                DuplicatePolicy::KeepFirst => {
                    warn!(row, country = %record.country, "skipping duplicate country");
                    dataset.excluded.push(ExcludedRow {
                        row,
                        reason: format!("duplicate country '{}'", record.country),
                    });
                    continue;
                }
            }
        }

        dataset.records.push(record);
    }

    Ok(dataset)
}

struct RawColumns<'a> {
    countries: &'a StringChunked,
    coffee: &'a StringChunked,
    happiness: &'a StringChunked,
    continents: Option<&'a StringChunked>,
    cups: Option<&'a StringChunked>,
}

impl RawColumns<'_> {
    fn record(&self, i: usize, row: usize) -> Result<Record> {
        let country = self.countries.get(i).map(str::trim).unwrap_or("");
        if country.is_empty() {
            return Err(malformed(row, input::COUNTRY, ""));
        }
        let daily_coffee_cups = match self.cups.and_then(|c| c.get(i)).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_number(Some(raw), row, input::DAILY_COFFEE_CUPS, true)?),
        };
        Ok(Record {
            country: country.to_string(),
            coffee_consumption: parse_number(
                self.coffee.get(i),
                row,
                input::COFFEE_CONSUMPTION,
                true,
            )?,
            happiness_score: parse_number(self.happiness.get(i), row, input::HAPPINESS_SCORE, false)?,
            continent: self
                .continents
                .and_then(|c| c.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            daily_coffee_cups,
        })
    }
}

fn malformed(row: usize, column: &str, value: &str) -> AnalysisError {
    AnalysisError::MalformedRow {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_number(raw: Option<&str>, row: usize, column: &str, non_negative: bool) -> Result<f64> {
    let raw = raw.map(str::trim).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && (!non_negative || v >= 0.0) => Ok(v),
        _ => Err(malformed(row, column, raw)),
    }
}

// ── Enriched output ─────────────────────────────────────────────────────────

/// Input columns plus every derived column, one row per record.
pub fn enriched_frame(records: &[EnrichedRecord]) -> Result<DataFrame> {
    let countries: Vec<&str> = records.iter().map(|r| r.country()).collect();
    let coffee: Vec<f64> = records.iter().map(|r| r.coffee()).collect();
    let happiness: Vec<f64> = records.iter().map(|r| r.happiness()).collect();
    let continents: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.record.continent.as_deref())
        .collect();
    let cups: Vec<Option<f64>> = records.iter().map(|r| r.record.daily_coffee_cups).collect();
    let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let high_coffee: Vec<bool> = records.iter().map(|r| r.is_high_coffee).collect();
    let high_happiness: Vec<bool> = records.iter().map(|r| r.is_high_happiness).collect();
    let intersection: Vec<bool> = records
        .iter()
        .map(|r| r.is_high_coffee && r.is_high_happiness)
        .collect();
    let partitions: Vec<&str> = records.iter().map(|r| r.partition.as_str()).collect();

    let df = DataFrame::new(vec![
        Column::new(input::COUNTRY.into(), countries),
        Column::new(input::COFFEE_CONSUMPTION.into(), coffee),
        Column::new(input::HAPPINESS_SCORE.into(), happiness),
        Column::new(input::CONTINENT.into(), continents),
        Column::new(input::DAILY_COFFEE_CUPS.into(), cups),
        Column::new(derived::COFFEE_CATEGORY.into(), categories),
        Column::new(derived::HIGH_COFFEE.into(), high_coffee),
        Column::new(derived::HIGH_HAPPINESS.into(), high_happiness),
        Column::new(derived::INTERSECTION.into(), intersection),
        Column::new(derived::PARTITION.into(), partitions),
    ])?;
    Ok(df)
}

/// Write the enriched frame as CSV with a header row.
pub fn write_enriched_csv<W: std::io::Write>(records: &[EnrichedRecord], writer: &mut W) -> Result<()> {
    let mut df = enriched_frame(records)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{enrich, Partition};

    fn frame(rows: &[[&str; 5]]) -> DataFrame {
        let col = |i: usize| -> Vec<&str> { rows.iter().map(|r| r[i]).collect() };
        DataFrame::new(vec![
            Column::new(input::COUNTRY.into(), col(0)),
            Column::new(input::COFFEE_CONSUMPTION.into(), col(1)),
            Column::new(input::HAPPINESS_SCORE.into(), col(2)),
            Column::new(input::CONTINENT.into(), col(3)),
            Column::new(input::DAILY_COFFEE_CUPS.into(), col(4)),
        ])
        .unwrap()
    }

    #[test]
    fn parses_clean_rows() {
        let df = frame(&[
            ["Finland", "12.0", "7.8", "Europe", "4.0"],
            ["Brazil", " 5.8 ", "6.3", "South America", ""],
        ]);
        let ds = from_frame(&df, &AnalysisConfig::default()).unwrap();
        assert_eq!(ds.records.len(), 2);
        assert!(ds.excluded.is_empty());
        assert_eq!(ds.records[1].coffee_consumption, 5.8);
        assert_eq!(ds.records[1].daily_coffee_cups, None);
        assert_eq!(ds.records[0].continent.as_deref(), Some("Europe"));
    }

    #[test]
    fn non_numeric_fails_by_default() {
        let df = frame(&[
            ["Finland", "12.0", "7.8", "Europe", "4.0"],
            ["Nowhere", "lots", "6.3", "Europe", "1.0"],
        ]);
        let err = from_frame(&df, &AnalysisConfig::default()).unwrap_err();
        match err {
            AnalysisError::MalformedRow { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, input::COFFEE_CONSUMPTION);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_policy_reports_excluded_rows() {
        let df = frame(&[
            ["Finland", "12.0", "7.8", "Europe", "4.0"],
            ["Nowhere", "", "6.3", "Europe", "1.0"],
            ["Nanland", "1.0", "NaN", "Europe", "1.0"],
            ["Negaland", "-1.0", "5.0", "Europe", "1.0"],
        ]);
        let config = AnalysisConfig {
            malformed_rows: MalformedRowPolicy::Skip,
            ..AnalysisConfig::default()
        };
        let ds = from_frame(&df, &config).unwrap();
        assert_eq!(ds.records.len(), 1);
        let rows: Vec<usize> = ds.excluded.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn duplicate_country_policies() {
        let df = frame(&[
            ["Finland", "12.0", "7.8", "Europe", "4.0"],
            ["Finland", "11.0", "7.7", "Europe", "4.0"],
        ]);
        let err = from_frame(&df, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateCountry { row: 2, .. }));

        let config = AnalysisConfig {
            duplicate_countries: DuplicatePolicy::KeepFirst,
            ..AnalysisConfig::default()
        };
        let ds = from_frame(&df, &config).unwrap();
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.records[0].coffee_consumption, 12.0);
        assert_eq!(ds.excluded.len(), 1);
    }

    #[test]
    fn missing_required_column() {
        let df = DataFrame::new(vec![
            Column::new(input::COUNTRY.into(), vec!["Finland"]),
            Column::new(input::HAPPINESS_SCORE.into(), vec!["7.8"]),
        ])
        .unwrap();
        let err = from_frame(&df, &AnalysisConfig::default()).unwrap_err();
        assert!(
            matches!(err, AnalysisError::MissingColumn(ref c) if c == input::COFFEE_CONSUMPTION)
        );
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let df = DataFrame::new(vec![
            Column::new(input::COUNTRY.into(), vec!["Finland"]),
            Column::new(input::COFFEE_CONSUMPTION.into(), vec!["12.0"]),
            Column::new(input::HAPPINESS_SCORE.into(), vec!["7.8"]),
        ])
        .unwrap();
        let ds = from_frame(&df, &AnalysisConfig::default()).unwrap();
        assert_eq!(ds.records[0].continent, None);
        assert_eq!(ds.records[0].daily_coffee_cups, None);
    }

    #[test]
    fn enriched_frame_has_derived_columns() {
        let df = frame(&[
            ["Finland", "12.0", "7.8", "Europe", "4.0"],
            ["Ethiopia", "2.5", "4.2", "Africa", "2.0"],
        ]);
        let config = AnalysisConfig::default();
        let ds = from_frame(&df, &config).unwrap();
        let enriched = enrich(&ds.records, &config);
        assert_eq!(enriched[1].partition, Partition::CoffeeOnly);

        let out = enriched_frame(&enriched).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 10);
        let parts = out.column(derived::PARTITION).unwrap().str().unwrap();
        assert_eq!(parts.get(0), Some("both"));
        assert_eq!(parts.get(1), Some("coffee_only"));
        let cats = out.column(derived::COFFEE_CATEGORY).unwrap().str().unwrap();
        assert_eq!(cats.get(0), Some("Very High"));

        let mut buf = Vec::new();
        write_enriched_csv(&enriched, &mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("Country,Coffee_Consumption_Per_Capita_KG"));
        assert!(header.ends_with("Partition"));
        assert_eq!(csv.lines().count(), 3);
    }
}
