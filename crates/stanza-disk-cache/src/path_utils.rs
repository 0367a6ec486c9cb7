//! # Path Utilities

use std::path::{Path, PathBuf};

/// Join `context` dirs and then `filename` onto `path`.
///
/// * Does not check that the path exists.
/// * Does not initialize the containing directories.
pub fn extend_path<P, S, F>(
    path: P,
    context: &[S],
    filename: F,
) -> PathBuf
where
    P: AsRef<Path>,
    S: AsRef<Path>,
    F: AsRef<Path>,
{
    let mut path = path.as_ref().to_path_buf();
    path.extend(context.iter().map(|s| s.as_ref()));
    path.push(filename.as_ref());
    path
}

/// The final path segment of a URL, ignoring any query or fragment.
///
/// Returns `None` when the URL has no non-empty final segment.
pub fn url_file_name(url: &str) -> Option<&str> {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let (_, name) = url.rsplit_once('/')?;
    (!name.is_empty()).then_some(name)
}
