use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Shared byte counter behind all active fetchers of one resource.
///
/// Writers only ever add to it; a single render task owns the bar and
/// copies the counter onto it on its own cadence.
#[derive(Debug, Default)]
pub struct Progress {
    bytes: AtomicU64,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Spawns the render task for `progress` and hands back the bar.
///
/// The bar redraws at a fixed rate until somebody calls `finish` on it,
/// regardless of how often the fetchers write.
pub fn render(progress: Arc<Progress>, total_bytes: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(total_bytes);
    bar.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>12}/{total_bytes:<12} {bytes_per_sec:>12} {eta:>4} {msg}")
        .unwrap()
        .progress_chars("=>-"));
    bar.set_message(format!("Downloading {}", name));

    let handle = bar.clone();
    tokio::spawn(async move {
        while !handle.is_finished() {
            handle.set_position(progress.bytes());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_writers_are_all_counted() {
        let progress = Progress::new();
        let mut threads = vec![];
        for _ in 0..8 {
            let progress = progress.clone();
            threads.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    progress.add(3);
                }
            }));
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(progress.bytes(), 8 * 1000 * 3);
    }
}
