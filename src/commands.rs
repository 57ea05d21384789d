use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::allocator::Allocator;
use crate::cli::Options;
use crate::downloader::Downloader;
use crate::extract;

/// Downloads every URL found in `content` and returns the text with each
/// URL replaced by the path of its finished artifact.
///
/// Resource tasks report back as tagged results; nothing in a worker can
/// kill the run. Failures are logged here at the join point, successful
/// downloads are still substituted, and the run as a whole errors out if
/// any resource failed.
pub async fn run_downloads(content: String, options: &Options) -> Result<String> {
    let mut urls = extract::extract_urls(&content);

    if options.https_only {
        urls.retain(|url| {
            let keep = url.starts_with("https://");
            if !keep {
                tracing::warn!(url, "skipping non-https URL");
            }
            keep
        });
    }

    if urls.is_empty() {
        tracing::warn!("nothing to download");
        return Ok(content);
    }

    let allocator = Allocator::new(options.concurrency);
    let workers = allocator.workers_per_resource(urls.len());
    let parallelism = allocator.parallelism(urls.len());
    tracing::debug!(
        resources = urls.len(),
        budget = options.concurrency,
        workers_per_resource = workers,
        parallelism,
        "allocated workers"
    );

    // Interleaved bars are unreadable; more than one download mutes them.
    let silent = options.silent || urls.len() > 1;

    let downloader = Arc::new(Downloader::new(workers, options.resume));
    let semaphore = Arc::new(Semaphore::new(parallelism));

    let mut handles = Vec::with_capacity(urls.len());
    for url in urls.iter().cloned() {
        let downloader = downloader.clone();
        let semaphore = semaphore.clone();
        let output_root = options.output.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let result = downloader.download(&url, &output_root, silent).await;
            (url, result)
        }));
    }

    let total = handles.len();
    let mut failures = 0usize;
    let mut rewritten = content;

    for handle in handles {
        let (url, result) = handle.await?;
        match result {
            Ok(path) => {
                tracing::info!(url, path = %path.display(), "download complete");
                rewritten = rewritten.replace(&url, &path.display().to_string());
            }
            Err(err) => {
                failures += 1;
                tracing::error!(url, kind = err.kind(), "{err}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {total} downloads failed");
    }
    Ok(rewritten)
}
