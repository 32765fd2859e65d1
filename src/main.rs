//! alpaca-fetch CLI
//!
//! Downloads paginated market data into CSV files

use alpaca_fetch::cli::{init_logging, Cli, Runner};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.name();
    let verbose = cli.verbose;

    let runner = match Runner::from_cli(cli) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&runner.config().logging, command, verbose) {
        eprintln!("Warning: {e}");
    }

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
