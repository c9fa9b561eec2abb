use serde::Serialize;

use crate::classify::{EnrichedRecord, Partition};
use crate::config::CategoryTable;
use crate::error::{AnalysisError, Result};
use crate::stats::{self, LinearFit};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionSummary {
    pub partition: Partition,
    pub count: usize,
    /// `count / total * 100`, unrounded.
    pub percentage: f64,
    pub mean_coffee: Option<f64>,
    pub mean_happiness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Dataset-level aggregate. `correlation` and `fit` are `None` when a field
/// has zero variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub high_coffee: usize,
    pub high_happiness: usize,
    /// One entry per partition, in `Partition::ALL` order.
    pub partitions: [PartitionSummary; 4],
    pub correlation: Option<f64>,
    pub fit: Option<LinearFit>,
    pub coffee_median: f64,
    pub happiness_median: f64,
}

impl DatasetSummary {
    pub fn partition(&self, partition: Partition) -> &PartitionSummary {
        &self.partitions[partition.index()]
    }
}

/// Compute the aggregate. Fails on an empty record set, where percentages
/// and correlation have no meaning.
pub fn summarize(records: &[EnrichedRecord]) -> Result<DatasetSummary> {
    if records.is_empty() {
        return Err(AnalysisError::DegenerateInput(
            "no records to summarize".to_string(),
        ));
    }
    let total = records.len();

    let coffee: Vec<f64> = records.iter().map(|r| r.coffee()).collect();
    let happiness: Vec<f64> = records.iter().map(|r| r.happiness()).collect();

    let partitions = Partition::ALL.map(|partition| {
        let members: Vec<&EnrichedRecord> =
            records.iter().filter(|r| r.partition == partition).collect();
        let member_coffee: Vec<f64> = members.iter().map(|r| r.coffee()).collect();
        let member_happiness: Vec<f64> = members.iter().map(|r| r.happiness()).collect();
        PartitionSummary {
            partition,
            count: members.len(),
            percentage: members.len() as f64 / total as f64 * 100.0,
            mean_coffee: stats::mean(&member_coffee),
            mean_happiness: stats::mean(&member_happiness),
        }
    });

    let degenerate = || AnalysisError::DegenerateInput("no records to summarize".to_string());

    Ok(DatasetSummary {
        total,
        high_coffee: records.iter().filter(|r| r.is_high_coffee).count(),
        high_happiness: records.iter().filter(|r| r.is_high_happiness).count(),
        partitions,
        correlation: stats::pearson(&coffee, &happiness),
        fit: stats::linear_fit(&coffee, &happiness),
        coffee_median: stats::median(&coffee).ok_or_else(degenerate)?,
        happiness_median: stats::median(&happiness).ok_or_else(degenerate)?,
    })
}

/// Record count per category label, in table rank order.
pub fn category_counts(records: &[EnrichedRecord], table: &CategoryTable) -> Vec<CategoryCount> {
    table
        .labels()
        .into_iter()
        .map(|label| CategoryCount {
            label: label.to_string(),
            count: records.iter().filter(|r| r.category == label).count(),
        })
        .collect()
}

// ── Ranked listings ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Coffee,
    Happiness,
}

/// A subset of countries and the field it is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    HighCoffee,
    HighHappiness,
    Partition(Partition),
}

impl Listing {
    pub const ALL: [Listing; 6] = [
        Listing::HighCoffee,
        Listing::HighHappiness,
        Listing::Partition(Partition::Both),
        Listing::Partition(Partition::CoffeeOnly),
        Listing::Partition(Partition::HappinessOnly),
        Listing::Partition(Partition::Neither),
    ];

    pub fn includes(self, record: &EnrichedRecord) -> bool {
        match self {
            Listing::HighCoffee => record.is_high_coffee,
            Listing::HighHappiness => record.is_high_happiness,
            Listing::Partition(p) => record.partition == p,
        }
    }

    pub fn sort_field(self) -> SortField {
        match self {
            Listing::HighHappiness | Listing::Partition(Partition::HappinessOnly) => {
                SortField::Happiness
            }
            _ => SortField::Coffee,
        }
    }
}

/// Members of `listing`, descending by its sort field, ties by country name.
pub fn ranked(records: &[EnrichedRecord], listing: Listing) -> Vec<&EnrichedRecord> {
    let key = |r: &EnrichedRecord| match listing.sort_field() {
        SortField::Coffee => r.coffee(),
        SortField::Happiness => r.happiness(),
    };
    let mut members: Vec<&EnrichedRecord> =
        records.iter().filter(|r| listing.includes(r)).collect();
    members.sort_by(|a, b| {
        key(b)
            .total_cmp(&key(a))
            .then_with(|| a.country().cmp(b.country()))
    });
    members
}
