use std::path::PathBuf;

use thiserror::Error;

/// Everything that can sink a download, tagged by the stage it failed in.
///
/// Workers never terminate the process on their own; they return one of
/// these and the caller decides at the join point what to do with it.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("capability probe failed for {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("transfer failed for {url}: {source}")]
    Transfer {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("merge into {dest:?} failed: {source}")]
    Merge {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("segment task for {url} aborted: {source}")]
    Task {
        url: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl DownloadError {
    /// Stable category name, used when reporting aggregated failures.
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl { .. } => "invalid-url",
            DownloadError::Probe { .. } => "probe",
            DownloadError::Transfer { .. } => "transfer",
            DownloadError::Filesystem { .. } => "filesystem",
            DownloadError::Merge { .. } => "merge",
            DownloadError::Task { .. } => "task",
        }
    }
}
