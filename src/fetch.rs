use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::{header, Client};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::progress::Progress;
use crate::segment::Segment;

/// Fetches one segment's byte range into its partial file.
///
/// With `resume`, bytes already sitting in the partial file are skipped:
/// the request starts at `segment.start + <partial length>`. Those bytes
/// are trusted by length alone; their content is never re-checked. An
/// empty or missing partial file behaves as a fresh fetch.
pub async fn fetch_segment(
    client: &Client,
    url: &str,
    segment: Segment,
    part_path: &Path,
    resume: bool,
    progress: Option<Arc<Progress>>,
) -> Result<(), DownloadError> {
    let mut already_have = 0u64;
    if resume {
        if let Ok(meta) = fs::metadata(part_path).await {
            already_have = meta.len();
        }
        if already_have > 0 {
            if let Some(progress) = &progress {
                progress.add(already_have);
            }
        }
    }

    let start = segment.start + already_have;
    if start >= segment.end {
        // Nothing left to request, but the merger still expects one
        // partial file per segment, so make sure ours exists.
        if fs::metadata(part_path).await.is_err() {
            OpenOptions::new()
                .create(true)
                .write(true)
                .open(part_path)
                .await
                .map_err(|source| DownloadError::Filesystem {
                    path: part_path.to_path_buf(),
                    source,
                })?;
        }
        return Ok(());
    }

    let response = client
        .get(url)
        .header(header::RANGE, Segment::range_header(start, segment.end))
        .send()
        .await
        .map_err(|source| DownloadError::Transfer {
            url: url.to_string(),
            source,
        })?;

    let mut file = if resume {
        OpenOptions::new().create(true).append(true).open(part_path).await
    } else {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(part_path)
            .await
    }
    .map_err(|source| DownloadError::Filesystem {
        path: part_path.to_path_buf(),
        source,
    })?;

    // A clean end of stream simply ends this loop; only transport and
    // write errors are failures.
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Transfer {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| DownloadError::Filesystem {
                path: part_path.to_path_buf(),
                source,
            })?;
        if let Some(progress) = &progress {
            progress.add(chunk.len() as u64);
        }
    }

    file.flush().await.map_err(|source| DownloadError::Filesystem {
        path: part_path.to_path_buf(),
        source,
    })?;

    Ok(())
}
