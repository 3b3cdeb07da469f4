//! Per-world progress tracking with automatic batching for large runs

use crate::algorithm::assembler::PipelineObserver;
use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::sync::LazyLock;

/// Coordinates progress display for batch runs
///
/// Shows one bar per world counting classified elevations. At most
/// [`MAX_INDIVIDUAL_PROGRESS_BARS`] world bars stay visible; larger runs also
/// get a single batch bar counting finished worlds.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    world_bars: VecDeque<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static WORLD_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix:>16} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Worlds: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            world_bars: VecDeque::new(),
        }
    }

    /// Prepare for `world_count` worlds
    pub fn initialize(&mut self, world_count: usize) {
        if world_count > MAX_INDIVIDUAL_PROGRESS_BARS {
            let batch_bar = ProgressBar::new(world_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }
    }

    /// Add a bar for a world, dropping the oldest one beyond the limit
    pub fn start_world(&mut self, name: &str) -> WorldProgress {
        while self.world_bars.len() >= MAX_INDIVIDUAL_PROGRESS_BARS {
            if let Some(old) = self.world_bars.pop_front() {
                self.multi_progress.remove(&old);
            }
        }
        let bar = self.multi_progress.add(ProgressBar::new(0));
        bar.set_style(WORLD_STYLE.clone());
        bar.set_prefix(name.to_string());
        self.world_bars.push_back(bar.clone());
        WorldProgress { bar }
    }

    /// Mark a world as finished
    pub fn complete_world(&self, progress: &WorldProgress, ok: bool) {
        let mark = if ok { "✓" } else { "✗" };
        progress.bar.finish_with_message(mark);
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All worlds processed");
        }
        let _ = self.multi_progress.clear();
    }
}

/// Progress bar of a single world
#[derive(Clone)]
pub struct WorldProgress {
    bar: ProgressBar,
}

impl WorldProgress {
    /// Elevations counted so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Elevations expected
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl PipelineObserver for WorldProgress {
    fn elevations_found(&self, count: usize) {
        self.bar.set_length(count as u64);
    }

    fn elevation_done(&self, label: &str) {
        self.bar.set_message(label.to_string());
        self.bar.inc(1);
    }
}
