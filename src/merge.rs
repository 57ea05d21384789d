use std::path::PathBuf;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::utils::ResourcePaths;

/// Concatenates the partial files of a resource, strictly in index order,
/// into the final artifact, removing each partial file as soon as it has
/// been consumed.
///
/// Every fetcher must have returned before this is called; no waiting or
/// locking happens here. On error the destination is left as-is, partial
/// output included.
pub async fn merge(paths: &ResourcePaths, segment_count: usize) -> Result<PathBuf, DownloadError> {
    let dest_path = paths.final_path();
    let merge_err = |source: std::io::Error| DownloadError::Merge {
        dest: dest_path.clone(),
        source,
    };

    let mut dest = File::create(&dest_path).await.map_err(merge_err)?;

    for index in 0..segment_count {
        let part_path = paths.part_path(index);
        let mut part = File::open(&part_path).await.map_err(merge_err)?;
        tokio::io::copy(&mut part, &mut dest).await.map_err(merge_err)?;
        drop(part);
        fs::remove_file(&part_path).await.map_err(merge_err)?;
    }

    dest.flush().await.map_err(merge_err)?;
    Ok(dest_path)
}
