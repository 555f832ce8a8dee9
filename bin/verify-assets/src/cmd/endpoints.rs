use super::OutputFormat;
use clap::Parser;
use eyre::{Result, WrapErr};
use std::{path::PathBuf, process::ExitCode};
use supply_audit_verifier::{EndpointRegistry, VerifierConfig};

#[derive(Parser, Debug)]
pub struct EndpointsArgs {
    /// Path to the endpoint and pair catalog file
    #[arg(short, long, default_value = "verify-assets.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl EndpointsArgs {
    pub async fn run(self) -> Result<ExitCode> {
        let config = VerifierConfig::load(&self.config)
            .wrap_err_with(|| format!("failed to load config from {:?}", self.config))?;

        let registry = EndpointRegistry::connect(&config.endpoints, config.rpc.retry_policy()).await;
        let heads = registry.probe_all().await;
        let healthy = heads.iter().all(|(_, head)| head.is_ok());

        if self.format == OutputFormat::Json {
            let data: Vec<_> = heads
                .iter()
                .map(|(chain, head)| match head {
                    Ok(head) => serde_json::json!({
                        "chain": chain,
                        "rpc_url": config.endpoints.get(chain),
                        "chain_id": head.chain_id,
                        "block_number": head.block_number,
                    }),
                    Err(e) => serde_json::json!({
                        "chain": chain,
                        "rpc_url": config.endpoints.get(chain),
                        "error": e,
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            println!("Endpoints");
            println!("=========");
            println!();

            for (chain, head) in &heads {
                let url = config.endpoints.get(chain).map_or("", String::as_str);
                print!("  {chain} ({url}): ");
                match head {
                    Ok(head) => println!("chain_id {} block {}", head.chain_id, head.block_number),
                    Err(e) => println!("error: {e}"),
                }
            }
        }

        Ok(if healthy {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
