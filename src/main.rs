//! `coffee-happiness` command-line entry point.
//!
//! ```bash
//! coffee-happiness                         # same as `run`
//! coffee-happiness --config analysis.toml run
//! coffee-happiness --coffee-threshold 3 report
//! coffee-happiness export enriched.csv
//! ```

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use coffee_happiness::config::ThresholdOverrides;
use coffee_happiness::{dataset, logging, pipeline, AnalysisConfig};

#[derive(Parser)]
#[command(
    name = "coffee-happiness",
    version,
    about = "Coffee consumption versus happiness: charts, summary and report"
)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct Overrides {
    /// TOML configuration file. Reference defaults are used when omitted.
    /// Threshold flags stand in for thresholds the file leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Input CSV file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory that receives the charts and report
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Consumption at or above this value (kg/capita) counts as high
    #[arg(long, global = true)]
    coffee_threshold: Option<f64>,

    /// Score at or above this value counts as high
    #[arg(long, global = true)]
    happiness_threshold: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// Write every chart, the report, summary.json and enriched.csv
    Run,
    /// Print the text report to stdout
    Report,
    /// Print the JSON summary to stdout
    Summary,
    /// Write the enriched table as CSV
    Export {
        /// Destination file
        path: PathBuf,
    },
    /// Validate the configuration and print the effective settings
    CheckConfig,
}

impl Overrides {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let thresholds = ThresholdOverrides {
            coffee: self.coffee_threshold,
            happiness: self.happiness_threshold,
        };
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load_with(path, thresholds)?,
            None => AnalysisConfig::default(),
        };
        if let Some(data) = &self.data {
            config.data_file = data.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(t) = self.coffee_threshold {
            config.coffee_threshold = t;
        }
        if let Some(t) = self.happiness_threshold {
            config.happiness_threshold = t;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = cli.overrides.resolve()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let outcome = pipeline::run(&config)?;
            println!(
                "Wrote {} artifacts to {}",
                outcome.artifacts.len(),
                config.output_dir.display()
            );
            if outcome.excluded_rows > 0 {
                println!("Excluded rows: {}", outcome.excluded_rows);
            }
        }
        Command::Report => {
            let analysis = pipeline::analyze(&config)?;
            print!("{}", analysis.report(&config));
        }
        Command::Summary => {
            let analysis = pipeline::analyze(&config)?;
            println!("{}", analysis.summary_json(&config)?);
        }
        Command::Export { path } => {
            let analysis = pipeline::analyze(&config)?;
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            dataset::write_enriched_csv(&analysis.records, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = analysis.records.len(), "exported enriched table");
        }
        Command::CheckConfig => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("# configuration is valid");
            print!("{rendered}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from([
            "coffee-happiness",
            "--coffee-threshold",
            "3.5",
            "--output-dir",
            "out",
            "report",
        ]);
        let config = cli.overrides.resolve().unwrap();
        assert_eq!(config.coffee_threshold, 3.5);
        assert_eq!(config.happiness_threshold, 6.0);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(matches!(cli.command, Some(Command::Report)));
    }

    #[test]
    fn threshold_flag_completes_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "coffee_threshold = 2.5\n").unwrap();
        let cli = Cli::parse_from([
            "coffee-happiness",
            "--config",
            path.to_str().unwrap(),
            "--happiness-threshold",
            "6.5",
        ]);
        let config = cli.overrides.resolve().unwrap();
        assert_eq!(config.coffee_threshold, 2.5);
        assert_eq!(config.happiness_threshold, 6.5);
    }

    #[test]
    fn non_finite_override_is_rejected() {
        let cli = Cli::parse_from(["coffee-happiness", "--happiness-threshold", "NaN"]);
        assert!(cli.overrides.resolve().is_err());
    }
}
