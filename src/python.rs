use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::config::AnalysisConfig;
use crate::dataset;
use crate::pipeline::{self, Analysis};

#[pyclass]
pub struct CoffeeAnalysis {
    config: AnalysisConfig,
    analysis: Analysis,
}

#[pymethods]
impl CoffeeAnalysis {
    /// Load configuration (reference defaults when no path is given), read the
    /// data file and run the analysis. Nothing is written.
    #[new]
    #[pyo3(signature = (config_path=None, data_file=None))]
    fn new(config_path: Option<PathBuf>, data_file: Option<PathBuf>) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(path) = data_file {
            config.data_file = path;
        }
        let analysis = pipeline::analyze(&config)?;
        Ok(Self { config, analysis })
    }

    /// Input columns plus category, flags and partition.
    #[getter]
    fn enriched(&self) -> PyResult<PyDataFrame> {
        let df = dataset::enriched_frame(&self.analysis.records)?;
        Ok(PyDataFrame(df))
    }

    #[getter]
    fn excluded_rows(&self) -> usize {
        self.analysis.excluded.len()
    }

    fn summary_json(&self) -> PyResult<String> {
        Ok(self.analysis.summary_json(&self.config)?)
    }

    fn report(&self) -> String {
        self.analysis.report(&self.config).to_string()
    }

    /// Write every artifact; returns the written paths.
    #[pyo3(signature = (output_dir=None))]
    fn render(&self, output_dir: Option<PathBuf>) -> PyResult<Vec<String>> {
        let dir = output_dir.unwrap_or_else(|| self.config.output_dir.clone());
        let written = pipeline::write_artifacts(&self.analysis, &self.config, &dir)?;
        Ok(written
            .into_iter()
            .map(|p| p.display().to_string())
            .collect())
    }
}
