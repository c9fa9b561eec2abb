//! Column-name constants for the coffee/happiness dataset.
//! Single source of truth for the loader, the enriched frame and the charts.

// ── Input columns ───────────────────────────────────────────────────────────
pub mod input {
    pub const COUNTRY: &str = "Country";
    pub const COFFEE_CONSUMPTION: &str = "Coffee_Consumption_Per_Capita_KG";
    pub const HAPPINESS_SCORE: &str = "Happiness_Score";
    pub const CONTINENT: &str = "Continent";
    pub const DAILY_COFFEE_CUPS: &str = "Daily_Coffee_Cups";

    pub const REQUIRED: [&str; 3] = [COUNTRY, COFFEE_CONSUMPTION, HAPPINESS_SCORE];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const COFFEE_CATEGORY: &str = "Coffee_Category";
    pub const HIGH_COFFEE: &str = "High_Coffee";
    pub const HIGH_HAPPINESS: &str = "High_Happiness";
    pub const INTERSECTION: &str = "Intersection";
    pub const PARTITION: &str = "Partition";
}

// ── Partition values ────────────────────────────────────────────────────────
pub mod partition {
    pub const BOTH: &str = "both";
    pub const COFFEE_ONLY: &str = "coffee_only";
    pub const HAPPINESS_ONLY: &str = "happiness_only";
    pub const NEITHER: &str = "neither";
}

// ── Artifact file names ─────────────────────────────────────────────────────
pub mod artifact {
    pub const COFFEE_MAP: &str = "coffee_consumption_map.html";
    pub const HAPPINESS_MAP: &str = "happiness_map.html";
    pub const INTERSECTION_MAP: &str = "intersection_map.html";
    pub const QUADRANT_PLOT: &str = "quadrant_plot.html";
    pub const CORRELATION_PLOT: &str = "correlation_plot.html";
    pub const BUBBLE_CHART: &str = "bubble_chart.html";
    pub const REPORT: &str = "analysis_report.txt";
    pub const SUMMARY: &str = "summary.json";
    pub const ENRICHED: &str = "enriched.csv";
}

/// Group label for rows that carry no continent.
pub const UNKNOWN_CONTINENT: &str = "Unknown";
