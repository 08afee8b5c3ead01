use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("search root does not exist or is not a directory: {}", path.display())]
    RootMissing { path: PathBuf },
    #[error("search root is not valid UTF-8: {}", path.display())]
    NonUtf8Root { path: PathBuf },
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Recursively collects files under `root` whose extension matches one of
/// `extensions` (ASCII case-insensitive), sorted by path.
pub fn discover_source_files(
    root: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootMissing {
            path: root.to_path_buf(),
        });
    }

    let root_str = root.to_str().ok_or_else(|| DiscoveryError::NonUtf8Root {
        path: root.to_path_buf(),
    })?;
    let pattern = format!("{}/**/*", glob::Pattern::escape(root_str));

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "could not read path while walking search root");
                continue;
            }
        };

        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
