//! Progress display while scanning plugins and querying the environment
//!
//! Drawn on stderr with indicatif; disabled in quiet and JSON modes.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const SCAN_TEMPLATE: &str = "{spinner:.cyan} Scanning plugins [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}";
const QUERY_TEMPLATE: &str = "{spinner:.cyan} {msg}";

/// Progress reporter for a check run
pub struct Progress {
    enabled: bool,
    current: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: None,
        }
    }

    /// Create a reporter that draws nothing
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the per-plugin bar
    pub fn begin_scan(&mut self, plugin_count: usize) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(plugin_count as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(SCAN_TEMPLATE)
                .expect("Invalid template")
                .progress_chars("█▓▒░"),
        );
        self.replace(bar);
    }

    /// Show the plugin being read
    pub fn reading(&self, plugin: &str) {
        if let Some(bar) = &self.current {
            bar.set_message(plugin.to_string());
        }
    }

    /// Count one plugin as read
    pub fn done(&self) {
        if let Some(bar) = &self.current {
            bar.inc(1);
        }
    }

    /// Spin while `<python> -m pip list` runs
    pub fn begin_query(&mut self, python: &Path) {
        if !self.enabled {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template(QUERY_TEMPLATE)
                .expect("Invalid template"),
        );
        spinner.set_message(format!("Querying packages installed for {}", python.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.replace(spinner);
    }

    /// Remove whatever is drawn
    pub fn clear(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }

    fn replace(&mut self, bar: ProgressBar) {
        self.clear();
        self.current = Some(bar);
    }
}
