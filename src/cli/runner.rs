//! CLI runner - executes commands

use crate::auth::Credentials;
use crate::cli::commands::{BarsArgs, CalendarArgs, Cli, Commands, ExtraArgs, NewsArgs, RangeArgs};
use crate::cli::progress::PageProgress;
use crate::config::FetcherConfig;
use crate::endpoints::{BarsEndpoint, CalendarEndpoint, Endpoint, NewsEndpoint};
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::CsvSink;
use crate::pagination::{FetchSummary, PaginatedFetcher, TracingObserver};
use crate::types::{QueryParams, PAGE_TOKEN_PARAM};
use std::sync::Arc;

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: FetcherConfig,
}

impl Runner {
    /// Create a runner with an already loaded config
    pub fn new(cli: Cli, config: FetcherConfig) -> Self {
        Self { cli, config }
    }

    /// Create a runner, loading the config file named on the command line
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let config = FetcherConfig::load_or_default(cli.config.as_deref())?;
        Ok(Self::new(cli, config))
    }

    /// Parsed command line
    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Effective configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Run the command with credentials from the environment
    pub async fn run(&self) -> Result<FetchSummary> {
        let credentials = Credentials::from_env()?;
        self.run_with_credentials(&credentials).await
    }

    /// Run the command with explicit credentials
    pub async fn run_with_credentials(&self, credentials: &Credentials) -> Result<FetchSummary> {
        match &self.cli.command {
            Commands::Bars(args) => {
                let endpoint = self.bars_endpoint(args);
                self.fetch(&endpoint, args.extra.output.as_deref(), credentials)
                    .await
            }
            Commands::News(args) => {
                let endpoint = self.news_endpoint(args);
                self.fetch(&endpoint, args.extra.output.as_deref(), credentials)
                    .await
            }
            Commands::Calendar(args) => {
                let endpoint = self.calendar_endpoint(args);
                self.fetch(&endpoint, args.output.as_deref(), credentials)
                    .await
            }
        }
    }

    fn bars_endpoint(&self, args: &BarsArgs) -> BarsEndpoint {
        let mut options = range_options(&args.range);
        push_some(&mut options, "limit", args.limit.map(|l| l.to_string()));
        push_some(&mut options, "adjustment", args.adjustment.clone());
        push_some(&mut options, "feed", args.feed.clone());
        extend_extra(&mut options, &args.extra);

        BarsEndpoint::new(args.symbols.iter().cloned(), args.timeframe.as_str())
            .with_data_url(self.config.data_url.as_str())
            .with_options(options)
    }

    fn news_endpoint(&self, args: &NewsArgs) -> NewsEndpoint {
        let mut options = range_options(&args.range);
        push_some(&mut options, "limit", args.limit.map(|l| l.to_string()));
        extend_extra(&mut options, &args.extra);

        NewsEndpoint::new()
            .with_symbols(args.symbols.iter().cloned())
            .with_data_url(self.config.data_url.as_str())
            .with_options(options)
    }

    fn calendar_endpoint(&self, args: &CalendarArgs) -> CalendarEndpoint {
        let mut endpoint =
            CalendarEndpoint::new().with_trading_url(self.config.trading_url.as_str());
        for (key, value) in range_options(&args.range).iter() {
            endpoint = endpoint.with_option(key, value.clone());
        }
        endpoint
    }

    /// Output template: command line, then config file, then endpoint default
    fn output_template<E: Endpoint>(&self, endpoint: &E, cli_output: Option<&str>) -> String {
        cli_output
            .or_else(|| self.config.output.template_for(endpoint.name()))
            .unwrap_or_else(|| endpoint.default_output())
            .to_string()
    }

    async fn fetch<E: Endpoint>(
        &self,
        endpoint: &E,
        cli_output: Option<&str>,
        credentials: &Credentials,
    ) -> Result<FetchSummary> {
        let request = endpoint.request()?;
        let mut sink = CsvSink::new(self.output_template(endpoint, cli_output))
            .with_fallback_name(endpoint.name());

        let client = HttpClient::with_credentials(self.config.http_client_config(), credentials)?;
        let mut fetcher = PaginatedFetcher::new(client)
            .with_retry_policy(self.config.retry_policy())
            .with_pacing(self.config.pacing_policy())
            .with_observer(Arc::new(TracingObserver));

        let progress = (!self.cli.no_progress).then(|| Arc::new(PageProgress::new(endpoint.name())));
        if let Some(progress) = &progress {
            fetcher = fetcher.with_observer(progress.clone());
        }

        let summary = fetcher.run(&request, endpoint, &mut sink).await?;
        drop(progress);

        println!(
            "{}: {} pages, {} rows -> {} ({} requests, {} rate limited, waited {:.1}s, {} ms)",
            endpoint.name(),
            summary.pages,
            summary.rows_written,
            sink.path_template(),
            summary.requests,
            summary.rate_limited,
            summary.waited.as_secs_f64(),
            summary.duration_ms
        );
        Ok(summary)
    }
}

fn range_options(range: &RangeArgs) -> QueryParams {
    let mut options = QueryParams::new();
    push_some(&mut options, "start", range.start.clone());
    push_some(&mut options, "end", range.end.clone());
    options
}

fn push_some(options: &mut QueryParams, key: &str, value: Option<String>) {
    if let Some(value) = value {
        options.insert(key, value);
    }
}

fn extend_extra(options: &mut QueryParams, extra: &ExtraArgs) {
    for (key, value) in &extra.params {
        options.insert(key.as_str(), value.as_str());
    }
    push_some(options, PAGE_TOKEN_PARAM, extra.page_token.clone());
}
