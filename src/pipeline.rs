//! End-to-end orchestration: load → enrich → summarize → render.
//!
//! [`analyze`] is pure with respect to the output directory; [`run`] writes
//! every artifact. Each artifact is written independently, so a failure
//! leaves the earlier ones in place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{enrich, EnrichedRecord};
use crate::config::AnalysisConfig;
use crate::dataset::{self, Dataset, ExcludedRow};
use crate::error::{AnalysisError, Result};
use crate::report::Report;
use crate::schema::{artifact, input};
use crate::summary::{category_counts, ranked, summarize, CategoryCount, DatasetSummary, Listing};
use crate::visualization;

/// Everything derived from one dataset under one configuration.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<EnrichedRecord>,
    pub summary: DatasetSummary,
    pub categories: Vec<CategoryCount>,
    pub excluded: Vec<ExcludedRow>,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: DatasetSummary,
    /// Paths written, in write order.
    pub artifacts: Vec<PathBuf>,
    pub excluded_rows: usize,
}

#[derive(Serialize)]
struct ListingEntry<'a> {
    country: &'a str,
    coffee_consumption: f64,
    happiness_score: f64,
}

#[derive(Serialize)]
struct Listings<'a> {
    high_coffee: Vec<ListingEntry<'a>>,
    high_happiness: Vec<ListingEntry<'a>>,
    both: Vec<ListingEntry<'a>>,
    coffee_only: Vec<ListingEntry<'a>>,
    happiness_only: Vec<ListingEntry<'a>>,
    neither: Vec<ListingEntry<'a>>,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    coffee_threshold: f64,
    happiness_threshold: f64,
    #[serde(flatten)]
    summary: &'a DatasetSummary,
    categories: &'a [CategoryCount],
    excluded_rows: &'a [ExcludedRow],
    listings: Listings<'a>,
}

impl Analysis {
    /// Machine-readable summary. Undefined statistics serialize as `null`.
    pub fn summary_json(&self, config: &AnalysisConfig) -> Result<String> {
        let [high_coffee, high_happiness, both, coffee_only, happiness_only, neither] =
            Listing::ALL.map(|l| self.listing(l));

        let doc = SummaryDocument {
            coffee_threshold: config.coffee_threshold,
            happiness_threshold: config.happiness_threshold,
            summary: &self.summary,
            categories: &self.categories,
            excluded_rows: &self.excluded,
            listings: Listings {
                high_coffee,
                high_happiness,
                both,
                coffee_only,
                happiness_only,
                neither,
            },
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    fn listing(&self, listing: Listing) -> Vec<ListingEntry<'_>> {
        ranked(&self.records, listing)
            .into_iter()
            .map(|r| ListingEntry {
                country: r.country(),
                coffee_consumption: r.coffee(),
                happiness_score: r.happiness(),
            })
            .collect()
    }

    pub fn report<'a>(&'a self, config: &'a AnalysisConfig) -> Report<'a> {
        Report::new(self, config)
    }
}

/// Validate the configuration, load the data file and derive everything.
/// Nothing is written.
pub fn analyze(config: &AnalysisConfig) -> Result<Analysis> {
    config.validate()?;
    let dataset = dataset::load(config)?;
    analyze_dataset(dataset, config)
}

/// Derive everything from records that are already loaded.
pub fn analyze_dataset(dataset: Dataset, config: &AnalysisConfig) -> Result<Analysis> {
    let Dataset { records, excluded } = dataset;
    if records.is_empty() {
        return Err(AnalysisError::DegenerateInput(format!(
            "no usable records in {} ({} rows excluded)",
            config.data_file.display(),
            excluded.len()
        )));
    }
    if !excluded.is_empty() {
        warn!(excluded = excluded.len(), "rows excluded while loading");
    }

    let records = enrich(&records, config);
    let summary = summarize(&records)?;
    let categories = category_counts(&records, &config.categories);

    info!(
        total = summary.total,
        high_coffee = summary.high_coffee,
        high_happiness = summary.high_happiness,
        correlation = ?summary.correlation,
        "analysis complete"
    );

    Ok(Analysis {
        records,
        summary,
        categories,
        excluded,
    })
}

/// Analyze and write every artifact into the configured output directory.
pub fn run(config: &AnalysisConfig) -> Result<RunOutcome> {
    let analysis = analyze(config)?;
    let artifacts = write_artifacts(&analysis, config, &config.output_dir)?;
    info!(
        output_dir = %config.output_dir.display(),
        artifacts = artifacts.len(),
        "run finished"
    );
    Ok(RunOutcome {
        summary: analysis.summary,
        artifacts,
        excluded_rows: analysis.excluded.len(),
    })
}

/// Write charts, report, summary and enriched CSV for an existing analysis.
pub fn write_artifacts(
    analysis: &Analysis,
    config: &AnalysisConfig,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .map_err(|e| AnalysisError::artifact("output directory", output_dir, e))?;

    let mut written = Vec::new();

    let charts = visualization::all_charts(&analysis.records, &analysis.summary, config);
    if !charts.iter().any(|c| c.file_name == artifact::BUBBLE_CHART) {
        warn!("no row has {}; skipping bubble chart", input::DAILY_COFFEE_CUPS);
    }
    for chart in &charts {
        let html = chart.to_html()?;
        written.push(write_artifact(output_dir, chart.file_name, html.as_bytes())?);
    }

    let report = analysis.report(config).to_string();
    written.push(write_artifact(output_dir, artifact::REPORT, report.as_bytes())?);

    let summary = analysis.summary_json(config)?;
    written.push(write_artifact(output_dir, artifact::SUMMARY, summary.as_bytes())?);

    let mut csv = Vec::new();
    dataset::write_enriched_csv(&analysis.records, &mut csv)?;
    written.push(write_artifact(output_dir, artifact::ENRICHED, &csv)?);

    Ok(written)
}

fn write_artifact(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|e| AnalysisError::artifact(name, &path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
    Ok(path)
}
