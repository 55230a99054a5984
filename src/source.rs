//! The byte-stream source an import reads from: a file or standard input.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};

use crate::error::Result;
use crate::utils::fs::to_universal_path;

/// A boxed, line-buffered byte stream, either backed by a file or by stdin.
pub type SourceStream = Box<dyn AsyncBufRead + Unpin + Send>;

/// Open the configured source: a file path if given, otherwise stdin.
pub async fn open(path: Option<&Path>) -> Result<SourceStream> {
    match path {
        Some(p) => {
            let normalized = to_universal_path(p.to_string_lossy().as_ref());
            let file = File::open(&normalized).await?;
            let meta = file.metadata().await?;
            tracing::info!(
                path = %normalized.display(),
                bytes = meta.len(),
                "opened import source file"
            );
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            tracing::info!("reading import source from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Resolve the effective source path for logging/collection-name-derivation
/// purposes; `None` means stdin.
pub fn resolve_path(file: Option<&str>) -> Option<PathBuf> {
    file.map(to_universal_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_passes_through_plain_path() {
        assert_eq!(
            resolve_path(Some("/tmp/data.csv")),
            Some(PathBuf::from("/tmp/data.csv"))
        );
    }

    #[test]
    fn resolve_path_none_for_stdin() {
        assert_eq!(resolve_path(None), None);
    }
}
