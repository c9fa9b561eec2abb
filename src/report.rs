//! Plain-text analysis report.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::classify::Partition;
use crate::config::AnalysisConfig;
use crate::pipeline::Analysis;
use crate::summary::{ranked, Listing};
use crate::visualization::correlation_label;

const TITLE: &str = "Batloon Coffee Happiness Analysis";

/// Renders through `Display`; `to_string()` gives the file contents.
pub struct Report<'a> {
    analysis: &'a Analysis,
    config: &'a AnalysisConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(analysis: &'a Analysis, config: &'a AnalysisConfig) -> Self {
        Self {
            analysis,
            config,
            generated_at: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    fn heading(&self, listing: Listing) -> String {
        match listing {
            Listing::HighCoffee => format!(
                "Countries with high coffee consumption (≥{:.2} kg):",
                self.config.coffee_threshold
            ),
            Listing::HighHappiness => format!(
                "Countries with high happiness (≥{:.2}):",
                self.config.happiness_threshold
            ),
            Listing::Partition(Partition::Both) => {
                "Countries with both high coffee consumption and high happiness:".to_string()
            }
            Listing::Partition(Partition::CoffeeOnly) => {
                "Countries with high coffee consumption only (not high happiness):".to_string()
            }
            Listing::Partition(Partition::HappinessOnly) => {
                "Countries with high happiness only (not high coffee consumption):".to_string()
            }
            Listing::Partition(Partition::Neither) => {
                "Countries with neither high coffee consumption nor high happiness:".to_string()
            }
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.analysis.summary;
        let c = self.config;

        writeln!(f, "{TITLE}")?;
        writeln!(f, "{}", "=".repeat(TITLE.chars().count()))?;
        writeln!(
            f,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Data file: {}", c.data_file.display())?;

        writeln!(f)?;
        writeln!(f, "Analysis Summary:")?;
        writeln!(f, "Total countries in dataset: {}", s.total)?;
        writeln!(
            f,
            "Countries with high coffee consumption (≥{} kg): {}",
            c.coffee_threshold, s.high_coffee
        )?;
        writeln!(
            f,
            "Countries with high happiness (≥{}): {}",
            c.happiness_threshold, s.high_happiness
        )?;
        writeln!(
            f,
            "Countries with both: {}",
            s.partition(Partition::Both).count
        )?;
        writeln!(f, "Excluded rows: {}", self.analysis.excluded.len())?;

        writeln!(f)?;
        writeln!(f, "Partitions:")?;
        for p in &s.partitions {
            writeln!(
                f,
                "  {}: {} ({:.1}%)",
                p.partition.label(),
                p.count,
                p.percentage
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Consumption categories:")?;
        for cat in &self.analysis.categories {
            writeln!(f, "  {}: {}", cat.label, cat.count)?;
        }

        writeln!(f)?;
        writeln!(f, "Correlation (Pearson r): {}", correlation_label(s.correlation))?;
        match &s.fit {
            Some(fit) => writeln!(
                f,
                "Linear fit: happiness = {:.3} * coffee + {:.3}",
                fit.slope, fit.intercept
            )?,
            None => writeln!(f, "Linear fit: undefined")?,
        }
        writeln!(
            f,
            "Medians: coffee {:.2} kg/capita, happiness {:.2}",
            s.coffee_median, s.happiness_median
        )?;

        for listing in Listing::ALL {
            writeln!(f)?;
            writeln!(f, "{}", self.heading(listing))?;
            let members = ranked(&self.analysis.records, listing);
            if members.is_empty() {
                writeln!(f, "  (none)")?;
            }
            for r in members {
                writeln!(
                    f,
                    "{}: {:.2} kg/capita, Happiness: {:.2}",
                    r.country(),
                    r.coffee(),
                    r.happiness()
                )?;
            }
        }
        Ok(())
    }
}
