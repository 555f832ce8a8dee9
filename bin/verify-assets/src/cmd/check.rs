use super::OutputFormat;
use clap::Parser;
use eyre::{Result, WrapErr};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{io, path::PathBuf, process::ExitCode};
use supply_audit_verifier::{EndpointRegistry, PairVerifier, VerifierConfig};
use tracing::info;

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the endpoint and pair catalog file
    #[arg(short, long, default_value = "verify-assets.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Pairs verified at the same time (overrides config)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Only verify the named pair (repeatable)
    #[arg(long = "pair")]
    pairs: Vec<String>,

    /// Write run metrics in Prometheus text format to this file
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

impl CheckArgs {
    pub async fn run(self) -> Result<ExitCode> {
        let metrics = match &self.metrics_file {
            Some(_) => Some(
                PrometheusBuilder::new()
                    .install_recorder()
                    .wrap_err("failed to install metrics recorder")?,
            ),
            None => None,
        };

        let config = VerifierConfig::load(&self.config)
            .wrap_err_with(|| format!("failed to load config from {:?}", self.config))?;

        let catalog = config.select_pairs(&self.pairs)?;
        let concurrency = self.concurrency.unwrap_or(config.concurrency);
        if concurrency == 0 {
            eyre::bail!("--concurrency must be at least 1");
        }

        let registry =
            EndpointRegistry::connect(&config.endpoints_for(&catalog), config.rpc.retry_policy())
                .await;

        info!(pairs = catalog.len(), concurrency, "Verifying bridge supply");
        let report = PairVerifier::new(&registry)
            .verify_all(&catalog, concurrency)
            .await;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            }
            OutputFormat::Table => report.write_table(&mut io::stdout().lock())?,
        }

        if let (Some(path), Some(handle)) = (&self.metrics_file, metrics) {
            std::fs::write(path, handle.render())
                .wrap_err_with(|| format!("failed to write metrics to {path:?}"))?;
        }

        Ok(ExitCode::from(report.exit_status().code()))
    }
}
