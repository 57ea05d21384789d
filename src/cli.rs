use std::path::{Path, PathBuf};

/// Per-run configuration, assembled once by the CLI layer.
///
/// `concurrency` arrives as an explicit value; reading the CPU count from
/// the host happens in `main`, never further down.
#[derive(Debug, Clone)]
pub struct Options {
    pub output: PathBuf,
    pub concurrency: usize,
    pub resume: bool,
    pub silent: bool,
    pub https_only: bool,
}

/// Reduces an output argument that names a file to the directory the file
/// sits in; downloads always land in a directory.
///
/// "Names a file" means: no trailing separator and a base name containing
/// a dot. A bare file name maps to the current directory.
pub fn normalize_output_dir(raw: &str) -> PathBuf {
    if !raw.ends_with('/') {
        let path = Path::new(raw);
        let base_names_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.contains('.'))
            .unwrap_or(false);

        if base_names_file {
            return match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("./"),
            };
        }
    }
    PathBuf::from(raw)
}
