use crate::cmd::{check::CheckArgs, endpoints::EndpointsArgs};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "verify-assets")]
#[command(version, about = "Cross-chain bridge supply verification", long_about = None)]
pub struct VerifyCli {
    #[command(subcommand)]
    pub cmd: VerifySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum VerifySubcommand {
    /// Compare locked and minted supply for every bridge pair
    Check(CheckArgs),

    /// Show chain id and latest block of every configured endpoint
    Endpoints(EndpointsArgs),
}
