pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{
    ConversionPipeline, LoadStatus, PibProvider, PipelineSettings, ProviderSettings,
};
use crate::providers::{AwesomeApiProvider, IbgeProvider};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Table { page: usize, descending: bool },
    Chart,
    Summary,
    Export,
}

/// Wires both gateways into a provider. Each gateway, and so the rate cache,
/// lives as long as the returned provider.
pub fn build_provider(config: &AppConfig) -> PibProvider {
    let statistics = Arc::new(IbgeProvider::new(
        &config.providers.ibge.base_url,
        config.http.clone(),
    ));
    let exchange = Arc::new(AwesomeApiProvider::new(
        &config.providers.awesome_api.base_url,
        config.providers.awesome_api.quote_limit,
        config.http.clone(),
    ));
    let pipeline = ConversionPipeline::new(
        statistics,
        exchange,
        PipelineSettings::from_config(config),
    );
    PibProvider::new(pipeline, ProviderSettings::from(&config.reload))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pibx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = build_provider(&config);

    let spinner = cli::ui::new_spinner("Fetching GDP series and exchange rates...");
    let status = provider.load().await;
    spinner.finish_and_clear();

    let snapshot = provider.snapshot().await;
    if status != LoadStatus::Success {
        let cause = snapshot
            .error
            .as_deref()
            .map_or_else(|| anyhow!("Load ended as {status:?}"), |e| anyhow!(e.clone()));
        return Err(cause.context("Failed to load GDP data, run the command again to retry"));
    }

    let output = match command {
        AppCommand::Table { page, descending } => cli::table::render(&snapshot, page, descending),
        AppCommand::Chart => cli::chart::render(&snapshot),
        AppCommand::Summary => cli::summary::render(&snapshot, &provider.cache_info().await),
        AppCommand::Export => cli::export::render(&snapshot)?,
    };
    println!("{output}");
    Ok(())
}
