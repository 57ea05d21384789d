use std::path::{Path, PathBuf};

use url::Url;

use crate::error::DownloadError;

pub fn filename_from_url(url_str: &str) -> Result<String, url::ParseError> {
    let url = Url::parse(url_str)?;

    if let Some(segments) = url.path_segments() {
        if let Some(filename) = segments.last() {
            if !filename.is_empty() {
                return Ok(filename.to_string());
            }
        }
    }

    // Fallback if no filename found in path
    Ok(format!("download_{}", uuid::Uuid::new_v4()))
}

pub fn sanitize_filename(filename: &str) -> String {
    filename.replace(|c: char| !c.is_alphanumeric() && c != '.' && c != '-' && c != '_', "_")
}

/// On-disk layout of one resource: a directory named after the file stem,
/// holding the partial files and, after merge, the final artifact.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    pub dir: PathBuf,
    pub base_name: String,
}

impl ResourcePaths {
    pub fn from_url(url: &str, output_root: &Path) -> Result<Self, DownloadError> {
        let filename = filename_from_url(url).map_err(|source| DownloadError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let base_name = sanitize_filename(&filename);

        let stem = match base_name.split('.').next() {
            Some(s) if !s.is_empty() => s,
            _ => base_name.as_str(),
        };

        Ok(Self {
            dir: output_root.join(stem),
            base_name,
        })
    }

    /// Path of the merged artifact: `<dir>/<base_name>`.
    pub fn final_path(&self) -> PathBuf {
        self.dir.join(&self.base_name)
    }

    /// Partial-file path for one segment: `<dir>/<base_name>-<index>`.
    ///
    /// Derived purely from the layout and the index, so a resumed run can
    /// rediscover prior partial files without any persisted record.
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-{}", self.base_name, index))
    }
}
