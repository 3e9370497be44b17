//! Progress display for sync passes
//!
//! Renders the sync engine's event stream as an indicatif progress bar with
//! per-asset tick messages, and collects the pass summary for the final
//! report. With the bar disabled (quiet mode, non-terminal output) events are
//! still drained so the engine never blocks on a full channel.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::debug;

use crate::app::models::{Disposition, PassSummary};
use crate::app::SyncEvent;

/// Configuration for the sync progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable the visual progress bar
    pub enable_progress_bar: bool,
    /// Maximum width for identifiers in the tick message
    pub max_identifier_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            max_identifier_width: 40,
        }
    }
}

/// Drives a progress bar from sync events
pub struct ProgressDisplay {
    config: ProgressConfig,
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config, bar: None }
    }

    /// Consume the event stream until the pass completes
    ///
    /// Returns the summary from the completion event, or `None` when the
    /// engine stopped emitting without completing (superseded pass).
    pub async fn run(&mut self, mut events: mpsc::Receiver<SyncEvent>) -> Option<PassSummary> {
        let mut summary = None;

        while let Some(event) = events.recv().await {
            match event {
                SyncEvent::Resolved {
                    outcome,
                    resolved,
                    total,
                    ..
                } => {
                    let width = self.config.max_identifier_width;
                    let bar = self.bar_for(total);
                    bar.set_position(resolved as u64);
                    let label = match &outcome.disposition {
                        Disposition::CacheHit => "cached",
                        Disposition::Fetched => "fetched",
                        Disposition::Failed { .. } => "failed",
                    };
                    bar.set_message(format!(
                        "{} {}",
                        label,
                        truncate(&outcome.identifier, width)
                    ));
                }
                SyncEvent::PassComplete { summary: s, .. } => {
                    summary = Some(s);
                    break;
                }
            }
        }

        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        if summary.is_none() {
            debug!("event stream ended without a completion event");
        }
        summary
    }

    fn bar_for(&mut self, total: usize) -> &ProgressBar {
        if self.bar.is_none() {
            let bar = if self.config.enable_progress_bar {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                        .expect("progress template is valid"),
                );
                bar
            } else {
                ProgressBar::hidden()
            };
            self.bar = Some(bar);
        }
        self.bar.as_ref().expect("bar initialized above")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
