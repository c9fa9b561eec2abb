//! Coffee consumption versus happiness: threshold classification, partition
//! statistics, choropleth and scatter charts, and a text report.
//!
//! The engine (`classify`, `stats`, `summary`) is pure; `dataset` loads and
//! exports frames with polars; `visualization` and `report` render results;
//! `pipeline` ties the stages together for the CLI and the Python bindings.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod stats;
pub mod summary;
pub mod visualization;

#[cfg(feature = "python")]
mod python;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, run, Analysis, RunOutcome};

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyModule;

/// Export column and artifact names as Python submodules.
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let columns = PyModule::new(m.py(), "columns")?;
    columns.add("COUNTRY", schema::input::COUNTRY)?;
    columns.add("COFFEE_CONSUMPTION", schema::input::COFFEE_CONSUMPTION)?;
    columns.add("HAPPINESS_SCORE", schema::input::HAPPINESS_SCORE)?;
    columns.add("CONTINENT", schema::input::CONTINENT)?;
    columns.add("DAILY_COFFEE_CUPS", schema::input::DAILY_COFFEE_CUPS)?;
    columns.add("COFFEE_CATEGORY", schema::derived::COFFEE_CATEGORY)?;
    columns.add("HIGH_COFFEE", schema::derived::HIGH_COFFEE)?;
    columns.add("HIGH_HAPPINESS", schema::derived::HIGH_HAPPINESS)?;
    columns.add("INTERSECTION", schema::derived::INTERSECTION)?;
    columns.add("PARTITION", schema::derived::PARTITION)?;
    m.add_submodule(&columns)?;

    let partition = PyModule::new(m.py(), "partition")?;
    partition.add("BOTH", schema::partition::BOTH)?;
    partition.add("COFFEE_ONLY", schema::partition::COFFEE_ONLY)?;
    partition.add("HAPPINESS_ONLY", schema::partition::HAPPINESS_ONLY)?;
    partition.add("NEITHER", schema::partition::NEITHER)?;
    m.add_submodule(&partition)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn coffee_happiness(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::CoffeeAnalysis>()?;
    add_schema_exports(m)?;
    Ok(())
}
