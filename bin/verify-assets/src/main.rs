use clap::Parser;
use opts::{VerifyCli, VerifySubcommand};
use std::process::ExitCode;

mod cmd;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = VerifyCli::parse();

    match args.cmd {
        VerifySubcommand::Check(cmd) => cmd.run().await,
        VerifySubcommand::Endpoints(cmd) => cmd.run().await,
    }
}
