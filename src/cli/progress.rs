//! Terminal progress for a fetch run

use crate::pagination::{FetchEvent, FetchObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Spinner showing pages and rows fetched so far
///
/// Owned by the runner for one fetch; a spinner that is dropped before the
/// run finished is abandoned so the last message stays visible.
pub struct PageProgress {
    bar: ProgressBar,
    rows: AtomicUsize,
}

impl PageProgress {
    /// Spinner on stderr labelled with the endpoint name
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {prefix}: {pos} pages, {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self::with_bar(bar)
    }

    /// Progress that draws nothing
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            rows: AtomicUsize::new(0),
        }
    }

    /// Pages counted so far
    pub fn pages(&self) -> u64 {
        self.bar.position()
    }

    /// Rows counted so far
    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::Relaxed)
    }

    /// Current message
    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl FetchObserver for PageProgress {
    fn on_event(&self, event: &FetchEvent<'_>) {
        match event {
            FetchEvent::Page { rows, .. } => {
                let total = self.rows.fetch_add(*rows, Ordering::Relaxed) + rows;
                self.bar.inc(1);
                self.bar.set_message(format!("{total} rows"));
            }
            FetchEvent::RateLimited { wait, .. } => self.bar.set_message(format!(
                "{} rows, rate limited, retrying in {:.0}s",
                self.rows(),
                wait.as_secs_f64()
            )),
            FetchEvent::Pacing { wait, .. } => self.bar.set_message(format!(
                "{} rows, pacing {:.1}s",
                self.rows(),
                wait.as_secs_f64()
            )),
            FetchEvent::NetworkRetry { attempt, .. } => self.bar.set_message(format!(
                "{} rows, network retry {attempt}",
                self.rows()
            )),
            FetchEvent::Finished { rows, .. } => {
                self.bar.finish_with_message(format!("{rows} rows, done"));
            }
            FetchEvent::Failed { .. } => {
                self.bar.abandon_with_message(format!("{} rows, failed", self.rows()));
            }
            FetchEvent::Started { .. } | FetchEvent::Request { .. } => {}
        }
    }
}

impl Drop for PageProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
