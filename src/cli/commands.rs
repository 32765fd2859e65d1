//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Paginated, rate-limit-aware Alpaca market data downloader
#[derive(Parser, Debug, Clone)]
#[command(name = "alpaca-fetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also log to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable the progress spinner
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Download historical stock bars (one CSV per symbol)
    Bars(BarsArgs),

    /// Download news articles
    News(NewsArgs),

    /// Download the market calendar
    Calendar(CalendarArgs),
}

impl Commands {
    /// Command name, used for log file names
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Bars(_) => "bars",
            Commands::News(_) => "news",
            Commands::Calendar(_) => "calendar",
        }
    }
}

/// Arguments of `bars`
#[derive(Args, Debug, Clone)]
pub struct BarsArgs {
    /// Symbols (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    /// Bar timeframe, e.g. 1Min, 15Min, 1Hour, 1Day
    #[arg(long)]
    pub timeframe: String,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,

    /// Corporate action adjustment (raw, split, dividend, all)
    #[arg(long)]
    pub adjustment: Option<String>,

    /// Data feed (iex, sip, otc)
    #[arg(long)]
    pub feed: Option<String>,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

/// Arguments of `news`
#[derive(Args, Debug, Clone)]
pub struct NewsArgs {
    /// Symbols (comma-separated, empty = all)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

/// Arguments of `calendar`
#[derive(Args, Debug, Clone)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Output path template
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Time range shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// End (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
}

/// Pass-through parameters, resume token and output of paged commands
#[derive(Args, Debug, Clone, Default)]
pub struct ExtraArgs {
    /// Extra query parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Resume from this continuation token
    #[arg(long)]
    pub page_token: Option<String>,

    /// Output path template (`{}` is replaced with the table name)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Parse a `KEY=VALUE` pair
pub fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bars() {
        let cli = Cli::try_parse_from([
            "alpaca-fetch",
            "--no-progress",
            "bars",
            "--symbols",
            "AAPL,TSLA",
            "--timeframe",
            "1Day",
            "--start",
            "2024-01-01",
            "--param",
            "asof=2024-01-01",
            "--page-token",
            "abc",
        ])
        .unwrap();

        assert!(cli.no_progress);
        assert_eq!(cli.command.name(), "bars");
        let Commands::Bars(args) = cli.command else {
            panic!("Expected bars");
        };
        assert_eq!(args.symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(args.timeframe, "1Day");
        assert_eq!(args.range.start.as_deref(), Some("2024-01-01"));
        assert_eq!(
            args.extra.params,
            vec![("asof".to_string(), "2024-01-01".to_string())]
        );
        assert_eq!(args.extra.page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_bars_requires_symbols() {
        let result = Cli::try_parse_from(["alpaca-fetch", "bars", "--timeframe", "1Day"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "alpaca-fetch",
            "calendar",
            "--config",
            "fetch.yaml",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("fetch.yaml")));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("currency=USD").unwrap(),
            ("currency".to_string(), "USD".to_string())
        );
        assert_eq!(
            parse_param("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }
}
