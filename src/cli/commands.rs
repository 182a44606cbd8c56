use crate::core::Amount;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ox-ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "demo",
        about = "Seed accounts, then run the miner loop over random transfers"
    )]
    Demo {
        #[arg(long, default_value_t = 5, help = "Number of users to seed")]
        users: usize,
        #[arg(long, default_value_t = 2, help = "Number of miner wallets to seed")]
        miners: usize,
        #[arg(long, default_value_t = 5, help = "Number of mining rounds")]
        rounds: usize,
        #[arg(long, default_value_t = 4, help = "Random transfers submitted per round")]
        transfers: usize,
        #[arg(long, help = "Fee attached to every random transfer, e.g. 0.001")]
        fee: Option<Amount>,
        #[arg(long, help = "TOML file with chain settings")]
        config: Option<PathBuf>,
        #[arg(long, help = "Print the final chain as JSON instead of a table")]
        json: bool,
    },
    #[command(name = "show-config", about = "Print the effective chain settings")]
    ShowConfig {
        #[arg(long, help = "TOML file with chain settings")]
        config: Option<PathBuf>,
    },
}
