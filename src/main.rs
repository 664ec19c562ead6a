//! Poultry Weight - Main Entry Point

use clap::Parser;
use poultry_weight::cli::{cmd_estimate, cmd_info, cmd_models, cmd_predict, cmd_train, Cli, Commands};
use poultry_weight::preprocessing::RawRecord;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poultry_weight=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Commands::Train { data, test_fraction, seed, degree, name, no_save } => {
            cmd_train(config, &data, test_fraction, seed, degree, name.as_deref(), !no_save)?;
        }
        Commands::Predict { model, data, output } => {
            cmd_predict(&config, &model, &data, output.as_deref())?;
        }
        Commands::Estimate { model, internal_temp, humidity, air_temp, wind_speed, feed_intake } => {
            let record = RawRecord::new(internal_temp, humidity, air_temp, wind_speed, feed_intake);
            cmd_estimate(&config, &model, record)?;
        }
        Commands::Models => {
            cmd_models(&config)?;
        }
        Commands::Info { data, iqr_k } => {
            cmd_info(&data, iqr_k)?;
        }
    }

    Ok(())
}
