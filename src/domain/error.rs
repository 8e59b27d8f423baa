use std::path::PathBuf;

/// Fatal packing failures. Unreadable files are not errors; they end up in
/// [`PackReport::skipped`](crate::domain::models::PackReport).
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("repository not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to write output file {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PackError {
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
