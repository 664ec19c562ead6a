//! Poultry Weight CLI Module
//!
//! Command-line interface for training, prediction and data inspection.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::{correlation_matrix, describe, detect_outliers};
use crate::config::PredictorConfig;
use crate::persistence::{self, ModelStore, PersistedBundle};
use crate::preprocessing::{records_to_frame, FeaturePreparer, RawRecord, TARGET_COLUMN};
use crate::reporting::MetricsReporter;
use crate::session::Session;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn indent(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "poultry-weight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict poultry weight from environmental and feed data")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding saved models (overrides the configuration)
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration from `--config` (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> anyhow::Result<PredictorConfig> {
        let mut config = match &self.config {
            Some(path) => PredictorConfig::from_json_file(path)?,
            None => PredictorConfig::default(),
        };
        if let Some(dir) = &self.model_dir {
            config = config.with_model_dir(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model on a CSV of sensor readings, feed intake and weights
    Train {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(short, long)]
        test_fraction: Option<f64>,

        /// Seed for the train/test shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Polynomial degree
        #[arg(long)]
        degree: Option<usize>,

        /// Name to save the model under (default: poultry_model_<timestamp>)
        #[arg(short, long)]
        name: Option<String>,

        /// Train and report without saving
        #[arg(long)]
        no_save: bool,
    },

    /// Predict weights for every row of a CSV
    Predict {
        /// Saved model name or path to an artifact
        #[arg(short, long)]
        model: String,

        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV with a "Predicted Weight" column appended
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict the weight for one set of readings
    Estimate {
        /// Saved model name or path to an artifact
        #[arg(short, long)]
        model: String,

        #[arg(long)]
        internal_temp: f64,

        #[arg(long)]
        humidity: f64,

        #[arg(long)]
        air_temp: f64,

        #[arg(long)]
        wind_speed: f64,

        #[arg(long)]
        feed_intake: f64,
    },

    /// List saved models
    Models,

    /// Summarize a training CSV: statistics, correlations and outliers
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// IQR multiplier for outlier fences
        #[arg(long, default_value = "1.5")]
        iqr_k: f64,
    },
}

/// Column appended to prediction output
pub const PREDICTION_COLUMN: &str = "Predicted Weight";

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let df = match ext {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };

    Ok(df)
}

/// Load a model given either a stored name or a path to an artifact
pub fn resolve_model(store: &ModelStore, model: &str) -> anyhow::Result<PersistedBundle> {
    let as_path = Path::new(model);
    let bundle = if as_path.is_file() {
        persistence::load(as_path)?
    } else {
        store.load_named(model)?
    };
    Ok(bundle)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    config: PredictorConfig,
    data_path: &Path,
    test_fraction: Option<f64>,
    seed: Option<u64>,
    degree: Option<usize>,
    name: Option<&str>,
    save: bool,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = config;
    if let Some(seed) = seed {
        config = config.with_random_state(Some(seed));
    }
    if let Some(degree) = degree {
        config = config.with_degree(degree);
    }
    let store = ModelStore::from_config(&config);
    let mut session = Session::new(config)?;

    step_run("Loading data");
    let start = Instant::now();
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run("Cleaning");
    let report = session.load_table(&df)?;
    step_done(&format!("{} rows kept, {} dropped", report.rows_out, report.dropped_rows.len()));

    step_run(&format!("Training degree-{} polynomial", session.config().degree.to_string().cyan()));
    let start = Instant::now();
    session.train(test_fraction)?;
    step_done(&format!("{:?}", start.elapsed()));

    let report = session.training_report()?;

    section("Metrics");
    indent(&MetricsReporter::metrics_summary(&report.metrics));
    println!(
        "  {:<10} {} train / {} test",
        muted("Split"),
        report.n_train,
        report.n_test
    );

    section("Predictions (test preview)");
    indent(&MetricsReporter::preview_table(&report.preview));

    section("Feature importance");
    indent(&MetricsReporter::importance_table(&report.importance, Some(10)));

    if save {
        let path = session.save(&store, name)?;
        println!();
        println!("  {} Saved model to {}", ok("✓"), path.display().to_string().white());
    }
    println!();
    Ok(())
}

pub fn cmd_predict(
    config: &PredictorConfig,
    model: &str,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");
    let store = ModelStore::from_config(config);

    step_run("Loading model");
    let bundle = resolve_model(&store, model)?;
    step_done(&format!("trained {}", bundle.trained_at.format("%Y-%m-%d %H:%M:%S UTC")));

    step_run("Loading data");
    let mut df = load_data(data_path)?;
    step_done(&format!("{} rows", df.height()));

    let predictions = bundle.predict(&df)?;

    if df.get_column_names().iter().any(|c| c.as_str() == TARGET_COLUMN) {
        // Labelled input: score it as well
        let (metrics, _) = bundle.evaluate(&df)?;
        section("Metrics");
        indent(&MetricsReporter::metrics_summary(&metrics));
    }

    df.with_column(Column::new(PREDICTION_COLUMN.into(), predictions.to_vec()))?;

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            println!("  {} Wrote {} predictions to {}", ok("✓"), predictions.len(), path.display());
        }
        None => {
            section("Predictions");
            for (i, p) in predictions.iter().enumerate() {
                println!("  {:>6}  {:.2}", muted(&i.to_string()), p);
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_estimate(config: &PredictorConfig, model: &str, record: RawRecord) -> anyhow::Result<()> {
    let store = ModelStore::from_config(config);
    let bundle = resolve_model(&store, model)?;
    let df = records_to_frame(&[record])?;
    let prediction = bundle.predict(&df)?;

    section("Estimate");
    println!(
        "  {:<18} {}",
        muted("Predicted weight"),
        format!("{:.2}", prediction[0]).white().bold()
    );
    println!();
    Ok(())
}

pub fn cmd_models(config: &PredictorConfig) -> anyhow::Result<()> {
    section("Models");
    let store = ModelStore::from_config(config);
    let names = store.list()?;

    if names.is_empty() {
        println!("  {}", dim(&format!("no models in {}", store.root().display())));
    }
    for name in names {
        match store.load_named(&name) {
            Ok(bundle) => {
                let r2 = bundle
                    .metrics
                    .map(|m| format!("R² {:.4}", m.r2))
                    .unwrap_or_else(|| "unscored".to_string());
                println!(
                    "  {:<36} {}  {}",
                    name.white(),
                    muted(&bundle.trained_at.format("%Y-%m-%d %H:%M").to_string()),
                    r2
                );
            }
            Err(e) => println!("  {:<36} {}", name.white(), e.to_string().yellow()),
        }
    }
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path, iqr_k: f64) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_data(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    let preparer = FeaturePreparer::new();
    let (clean, report) = preparer.preprocess_with_report(&df)?;
    if !report.dropped_rows.is_empty() {
        println!(
            "  {} {} rows with missing values are excluded below",
            "!".yellow(),
            report.dropped_rows.len()
        );
    }

    section("Statistics");
    println!(
        "  {:<16} {:>10} {:>10} {:>10} {:>10} {:>10}",
        muted("Column"), muted("Mean"), muted("Std"), muted("Min"), muted("Median"), muted("Max")
    );
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
    for stats in describe(&clean)? {
        println!(
            "  {:<16} {:>10} {:>10} {:>10} {:>10} {:>10}",
            stats.name,
            fmt(stats.mean),
            fmt(stats.std),
            fmt(stats.min),
            fmt(stats.median),
            fmt(stats.max)
        );
    }

    section(&format!("Correlation with {}", TARGET_COLUMN));
    let corr = correlation_matrix(&clean)?;
    for name in preparer.feature_columns() {
        if let Some(r) = corr.get(name, TARGET_COLUMN) {
            println!("  {:<16} {:>8.4}", name, r);
        }
    }

    section(&format!("Outliers (IQR × {})", iqr_k));
    for name in clean.get_column_names() {
        let outliers = detect_outliers(&clean, name.as_str(), iqr_k)?;
        println!(
            "  {:<16} {:>4} outside [{:.2}, {:.2}]",
            name.as_str(),
            outliers.n_outliers(),
            outliers.lower_fence,
            outliers.upper_fence
        );
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_data_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Internal Temp,Int Humidity,Air Temp,Wind Speed,Feed Intake,Weight").unwrap();
        writeln!(file, "30.1,60,25,2.5,110,1.8").unwrap();
        writeln!(file, "29.4,58,24,3.0,105,1.7").unwrap();

        let df = load_data(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn test_load_data_unsupported() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(load_data(file.path()).is_err());
    }

    fn write_training_csv(path: &Path, n: usize) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "Internal Temp,Int Humidity,Air Temp,Wind Speed,Feed Intake,Weight").unwrap();
        for i in 0..n {
            let i = i as f64;
            let temp = 28.0 + 3.0 * (i * 0.7).sin();
            let humidity = 60.0 + 8.0 * (i * 0.3).cos();
            let air = 22.0 + 4.0 * (i * 0.11 + 1.0).sin();
            let wind = 2.0 + 1.5 * (i * 1.3).cos();
            let feed = 80.0 + (i % 37.0) * 2.0;
            let weight = 0.3 + 0.01 * feed + 0.002 * humidity;
            writeln!(file, "{},{},{},{},{},{}", temp, humidity, air, wind, feed, weight).unwrap();
        }
    }

    #[test]
    fn test_predict_fails_on_unscorable_labels() {
        let dir = tempfile::tempdir().unwrap();
        let config = PredictorConfig::default().with_model_dir(dir.path().join("models"));

        let train_csv = dir.path().join("train.csv");
        write_training_csv(&train_csv, 40);
        cmd_train(config.clone(), &train_csv, None, None, None, Some("flock"), true).unwrap();

        let labelled = dir.path().join("labelled.csv");
        let mut file = std::fs::File::create(&labelled).unwrap();
        writeln!(file, "Internal Temp,Int Humidity,Air Temp,Wind Speed,Feed Intake,Weight").unwrap();
        writeln!(file, "30.1,60,25,2.5,110,heavy").unwrap();
        drop(file);

        let output = dir.path().join("out.csv");
        let err = cmd_predict(&config, "flock", &labelled, Some(&output)).unwrap_err();
        assert!(err.to_string().contains("Weight"), "unexpected error: {}", err);
        assert!(!output.exists());
    }

    #[test]
    fn test_predict_writes_output_for_labelled_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = PredictorConfig::default().with_model_dir(dir.path().join("models"));

        let train_csv = dir.path().join("train.csv");
        write_training_csv(&train_csv, 40);
        cmd_train(config.clone(), &train_csv, None, None, None, Some("flock"), true).unwrap();

        let output = dir.path().join("out.csv");
        cmd_predict(&config, "flock", &train_csv, Some(&output)).unwrap();

        let scored = load_data(&output).unwrap();
        assert_eq!(scored.height(), 40);
        assert!(scored.column(PREDICTION_COLUMN).is_ok());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "poultry-weight",
            "--model-dir",
            "/tmp/flock",
            "train",
            "--data",
            "farm.csv",
            "--test-fraction",
            "0.25",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/tmp/flock"));
        match cli.command {
            Commands::Train { test_fraction, no_save, .. } => {
                assert_eq!(test_fraction, Some(0.25));
                assert!(!no_save);
            }
            _ => panic!("expected train"),
        }
    }
}
