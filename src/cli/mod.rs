//! CLI module
//!
//! Command-line interface for downloading market data.
//!
//! # Commands
//!
//! - `bars` - Historical stock bars, one CSV per symbol
//! - `news` - News articles
//! - `calendar` - Market calendar

mod commands;
mod logging;
mod progress;
mod runner;

pub use commands::{
    parse_param, BarsArgs, CalendarArgs, Cli, Commands, ExtraArgs, NewsArgs, RangeArgs,
};
pub use logging::{init_logging, log_file_name, DEFAULT_FILTER};
pub use progress::PageProgress;
pub use runner::Runner;
