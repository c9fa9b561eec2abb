//! Classification and partition engine.
//!
//! Pure functions: a record's consumption value is bucketed through the
//! category table, both continuous fields are tested against their thresholds,
//! and the two flags select one of four partitions.

use serde::Serialize;

use crate::config::{AnalysisConfig, CategoryTable};
use crate::dataset::Record;
use crate::schema::partition as names;

/// The four-way split induced by the high-coffee and high-happiness flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Both,
    CoffeeOnly,
    HappinessOnly,
    Neither,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::Both,
        Partition::CoffeeOnly,
        Partition::HappinessOnly,
        Partition::Neither,
    ];

    pub fn of(is_high_coffee: bool, is_high_happiness: bool) -> Self {
        match (is_high_coffee, is_high_happiness) {
            (true, true) => Partition::Both,
            (true, false) => Partition::CoffeeOnly,
            (false, true) => Partition::HappinessOnly,
            (false, false) => Partition::Neither,
        }
    }

    /// Stable machine name, as written to the enriched frame.
    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Both => names::BOTH,
            Partition::CoffeeOnly => names::COFFEE_ONLY,
            Partition::HappinessOnly => names::HAPPINESS_ONLY,
            Partition::Neither => names::NEITHER,
        }
    }

    /// Human-readable label for reports and chart legends.
    pub fn label(self) -> &'static str {
        match self {
            Partition::Both => "Both High",
            Partition::CoffeeOnly => "High Coffee Consumption Only",
            Partition::HappinessOnly => "High Happiness Only",
            Partition::Neither => "Neither",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Partition::Both => 0,
            Partition::CoffeeOnly => 1,
            Partition::HappinessOnly => 2,
            Partition::Neither => 3,
        }
    }
}

/// Index of the first table entry whose cutoff is `<= value`, or `None` when
/// the value sits below every cutoff (or is NaN).
pub fn bucket(value: f64, table: &CategoryTable) -> Option<usize> {
    table.entries().iter().position(|e| value >= e.cutoff)
}

/// Category label for a consumption value. Ties resolve to the cutoff's own
/// label; values below every cutoff get the table's fallback.
pub fn classify<'t>(value: f64, table: &'t CategoryTable) -> &'t str {
    match bucket(value, table) {
        Some(i) => &table.entries()[i].label,
        None => table.fallback(),
    }
}

/// Inclusive threshold tests. NaN fails both.
pub fn flag_thresholds(
    record: &Record,
    coffee_threshold: f64,
    happiness_threshold: f64,
) -> (bool, bool) {
    (
        record.coffee_consumption >= coffee_threshold,
        record.happiness_score >= happiness_threshold,
    )
}

/// A record plus everything the engine derives from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: Record,
    pub category: String,
    pub is_high_coffee: bool,
    pub is_high_happiness: bool,
    pub partition: Partition,
}

impl EnrichedRecord {
    pub fn country(&self) -> &str {
        &self.record.country
    }

    pub fn coffee(&self) -> f64 {
        self.record.coffee_consumption
    }

    pub fn happiness(&self) -> f64 {
        self.record.happiness_score
    }
}

pub fn enrich_record(record: &Record, config: &AnalysisConfig) -> EnrichedRecord {
    let category = classify(record.coffee_consumption, &config.categories).to_string();
    let (is_high_coffee, is_high_happiness) =
        flag_thresholds(record, config.coffee_threshold, config.happiness_threshold);
    EnrichedRecord {
        record: record.clone(),
        category,
        is_high_coffee,
        is_high_happiness,
        partition: Partition::of(is_high_coffee, is_high_happiness),
    }
}

pub fn enrich(records: &[Record], config: &AnalysisConfig) -> Vec<EnrichedRecord> {
    records.iter().map(|r| enrich_record(r, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryCutoff;
    use proptest::prelude::*;

    fn table() -> CategoryTable {
        CategoryTable::new(
            vec![
                CategoryCutoff::new("High", 3.0),
                CategoryCutoff::new("Moderate", 1.0),
                CategoryCutoff::new("Low", 0.5),
                CategoryCutoff::new("Very Low", 0.0),
            ],
            "Very Low",
        )
        .unwrap()
    }

    fn record(coffee: f64, happiness: f64) -> Record {
        Record {
            country: "Testland".to_string(),
            coffee_consumption: coffee,
            happiness_score: happiness,
            continent: None,
            daily_coffee_cups: None,
        }
    }

    #[test]
    fn tie_resolves_to_own_bucket() {
        assert_eq!(classify(3.0, &table()), "High");
        assert_eq!(classify(1.0, &table()), "Moderate");
        assert_eq!(classify(0.0, &table()), "Very Low");
    }

    #[test]
    fn between_cutoffs() {
        assert_eq!(classify(2.99, &table()), "Moderate");
        assert_eq!(classify(0.7, &table()), "Low");
        assert_eq!(classify(42.0, &table()), "High");
    }

    #[test]
    fn below_every_cutoff_uses_fallback() {
        let t = CategoryTable::new(
            vec![
                CategoryCutoff::new("Heavy", 5.0),
                CategoryCutoff::new("Light", 1.0),
            ],
            "Trace",
        )
        .unwrap();
        assert_eq!(classify(0.2, &t), "Trace");
        assert_eq!(bucket(0.2, &t), None);
        assert_eq!(classify(f64::NAN, &t), "Trace");
    }

    #[test]
    fn reference_table_buckets() {
        let t = CategoryTable::reference();
        assert_eq!(classify(14.0, &t), "Exceptionally High");
        assert_eq!(classify(12.0, &t), "Very High");
        assert_eq!(classify(4.5, &t), "High");
        assert_eq!(classify(0.3, &t), "Very Low");
    }

    #[test]
    fn coffee_only_scenario() {
        let flags = flag_thresholds(&record(2.5, 5.0), 2.0, 6.0);
        assert_eq!(flags, (true, false));
        assert_eq!(Partition::of(flags.0, flags.1), Partition::CoffeeOnly);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(flag_thresholds(&record(2.0, 6.0), 2.0, 6.0), (true, true));
        assert_eq!(
            flag_thresholds(&record(1.999, 5.999), 2.0, 6.0),
            (false, false)
        );
    }

    #[test]
    fn nan_fails_both_predicates() {
        assert_eq!(
            flag_thresholds(&record(f64::NAN, f64::NAN), 2.0, 6.0),
            (false, false)
        );
    }

    #[test]
    fn partition_lookup_is_exhaustive() {
        assert_eq!(Partition::of(true, true), Partition::Both);
        assert_eq!(Partition::of(true, false), Partition::CoffeeOnly);
        assert_eq!(Partition::of(false, true), Partition::HappinessOnly);
        assert_eq!(Partition::of(false, false), Partition::Neither);
        for (i, p) in Partition::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn enrich_fills_every_field() {
        let config = AnalysisConfig::default();
        let enriched = enrich_record(&record(4.5, 7.2), &config);
        assert_eq!(enriched.category, "High");
        assert!(enriched.is_high_coffee);
        assert!(enriched.is_high_happiness);
        assert_eq!(enriched.partition, Partition::Both);
    }

    proptest! {
        #[test]
        fn classify_is_monotonic(a in 0.0f64..30.0, b in 0.0f64..30.0) {
            let t = CategoryTable::reference();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let rank = |v: f64| bucket(v, &t).unwrap_or(t.entries().len());
            // Lower index means a higher category.
            prop_assert!(rank(hi) <= rank(lo));
        }

        #[test]
        fn fallback_iff_below_every_cutoff(v in -5.0f64..30.0) {
            let t = CategoryTable::new(
                vec![
                    CategoryCutoff::new("Heavy", 5.0),
                    CategoryCutoff::new("Light", 1.0),
                ],
                "Trace",
            )
            .unwrap();
            let below_all = t.entries().iter().all(|e| v < e.cutoff);
            prop_assert_eq!(classify(v, &t) == "Trace", below_all);
        }

        #[test]
        fn exactly_one_partition(c in 0.0f64..20.0, h in 0.0f64..10.0) {
            let (hc, hh) = flag_thresholds(&record(c, h), 2.0, 6.0);
            let p = Partition::of(hc, hh);
            let hits = Partition::ALL.iter().filter(|q| **q == p).count();
            prop_assert_eq!(hits, 1);
            prop_assert_eq!(hc && hh, p == Partition::Both);
        }
    }
}
