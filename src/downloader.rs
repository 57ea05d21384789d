use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::{header, Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::fetch::fetch_segment;
use crate::merge::merge;
use crate::progress::{self, Progress};
use crate::segment::plan_segments;
use crate::utils::ResourcePaths;

/// Per-resource download orchestrator.
///
/// One instance is shared by every resource of a run; `concurrency` is the
/// per-resource worker share computed by the allocator, not the global
/// budget.
pub struct Downloader {
    client: Client,
    concurrency: usize,
    resume: bool,
}

impl Downloader {
    pub fn new(concurrency: usize, resume: bool) -> Self {
        let client = Client::builder()
            .user_agent(concat!("pget/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            concurrency: concurrency.max(1),
            resume,
        }
    }

    /// Downloads one resource and returns the path of the finished
    /// artifact.
    ///
    /// A HEAD probe decides the strategy: servers that answer 200 with
    /// `Accept-Ranges: bytes` and a known length get the segmented path,
    /// everything else falls back to a single stream. A probe that fails
    /// outright is a hard error; there is no retry.
    pub async fn download(
        &self,
        url: &str,
        output_root: &Path,
        silent: bool,
    ) -> Result<PathBuf, DownloadError> {
        let paths = ResourcePaths::from_url(url, output_root)?;

        let probe = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|source| DownloadError::Probe {
                url: url.to_string(),
                source,
            })?;

        let accepts_ranges = probe.status() == StatusCode::OK
            && probe
                .headers()
                .get(header::ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                == Some("bytes");
        // HEAD responses carry no body, so read the advertised length from
        // the header rather than from the (empty) body.
        let content_len = header_len(&probe).unwrap_or(0);

        tracing::debug!(
            url,
            status = %probe.status(),
            accepts_ranges,
            content_len,
            "capability probe complete"
        );

        // Segmenting needs both range support and a length to split.
        if accepts_ranges && content_len > 0 {
            self.multi_download(url, &paths, content_len, silent).await
        } else {
            self.single_download(url, &paths, silent).await
        }
    }

    async fn multi_download(
        &self,
        url: &str,
        paths: &ResourcePaths,
        content_len: u64,
        silent: bool,
    ) -> Result<PathBuf, DownloadError> {
        // A fresh run starts from a clean directory; a resumed run keeps
        // whatever partial files the previous run left behind.
        if !self.resume && paths.dir.exists() {
            fs::remove_dir_all(&paths.dir)
                .await
                .map_err(|source| DownloadError::Filesystem {
                    path: paths.dir.clone(),
                    source,
                })?;
        }
        fs::create_dir_all(&paths.dir)
            .await
            .map_err(|source| DownloadError::Filesystem {
                path: paths.dir.clone(),
                source,
            })?;

        let segments = plan_segments(content_len, self.concurrency);
        tracing::debug!(url, workers = segments.len(), content_len, "segmented download");

        let bar = (!silent).then(|| {
            let counter = Progress::new();
            let bar = progress::render(counter.clone(), content_len, &paths.base_name);
            (counter, bar)
        });

        let mut handles = Vec::with_capacity(segments.len());
        for segment in &segments {
            let client = self.client.clone();
            let url = url.to_string();
            let segment = *segment;
            let part_path = paths.part_path(segment.index);
            let resume = self.resume;
            let counter = bar.as_ref().map(|(counter, _)| counter.clone());

            handles.push(tokio::spawn(async move {
                fetch_segment(&client, &url, segment, &part_path, resume, counter).await
            }));
        }

        // Barrier: the merge below relies on every fetcher having returned.
        for handle in handles {
            handle
                .await
                .map_err(|source| DownloadError::Task {
                    url: url.to_string(),
                    source,
                })??;
        }

        let dest = merge(paths, segments.len()).await?;

        if let Some((_, bar)) = bar {
            finish_bar(&bar, &paths.base_name);
        }
        tracing::info!(url, dest = %dest.display(), "merged");
        Ok(dest)
    }

    /// One plain GET, streamed straight into the final artifact. No
    /// ranges, no partial files, no resume.
    async fn single_download(
        &self,
        url: &str,
        paths: &ResourcePaths,
        silent: bool,
    ) -> Result<PathBuf, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::Transfer {
                url: url.to_string(),
                source,
            })?;
        let content_len = response.content_length().unwrap_or(0);

        fs::create_dir_all(&paths.dir)
            .await
            .map_err(|source| DownloadError::Filesystem {
                path: paths.dir.clone(),
                source,
            })?;

        let dest = paths.final_path();
        let mut file = File::create(&dest)
            .await
            .map_err(|source| DownloadError::Filesystem {
                path: dest.clone(),
                source,
            })?;

        let bar = (!silent).then(|| {
            let counter = Progress::new();
            let bar = progress::render(counter.clone(), content_len, &paths.base_name);
            (counter, bar)
        });

        // Clean end of stream ends the copy; it is not an error.
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| DownloadError::Transfer {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|source| DownloadError::Filesystem {
                    path: dest.clone(),
                    source,
                })?;
            if let Some((counter, _)) = &bar {
                counter.add(chunk.len() as u64);
            }
        }

        file.flush().await.map_err(|source| DownloadError::Filesystem {
            path: dest.clone(),
            source,
        })?;

        if let Some((_, bar)) = bar {
            finish_bar(&bar, &paths.base_name);
        }
        tracing::info!(url, dest = %dest.display(), "downloaded single-stream");
        Ok(dest)
    }
}

fn header_len(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

fn finish_bar(bar: &ProgressBar, name: &str) {
    bar.finish_with_message(format!("Completed   {}", name));
}
