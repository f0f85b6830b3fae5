use crate::error::PrerenderError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Maps a route to its output file: `<output_dir>/<route>/index.html`.
///
/// The root route maps to `<output_dir>/index.html`. Routes with `..`
/// segments are rejected so output can never escape the output directory.
pub fn route_output_path(output_dir: &Path, route: &str) -> Result<PathBuf, PrerenderError> {
    if route.split('/').any(|segment| segment == "..") {
        return Err(PrerenderError::InvalidRoute(format!(
            "Route must not contain '..' segments: {route}"
        )));
    }

    let relative = route.trim_matches('/');
    let dir = if relative.is_empty() {
        output_dir.to_path_buf()
    } else {
        output_dir.join(relative)
    };

    Ok(dir.join("index.html"))
}

/// Writes the captured HTML for a route, creating directories as needed.
///
/// Returns the path that was written. Re-running with identical input
/// overwrites the same path with identical content.
pub async fn write_route_html(
    output_dir: &Path,
    route: &str,
    html: &str,
) -> Result<PathBuf, PrerenderError> {
    let path = route_output_path(output_dir, route)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| PrerenderError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    fs::write(&path, html)
        .await
        .map_err(|source| PrerenderError::WriteFailed {
            path: path.clone(),
            source,
        })?;

    debug!("Wrote {} bytes to {}", html.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_route_maps_under_output_dir() {
        let path = route_output_path(Path::new("site"), "/docs/intro").unwrap();
        assert_eq!(path, Path::new("site/docs/intro/index.html"));
    }

    #[test]
    fn root_route_maps_to_top_level_index() {
        let path = route_output_path(Path::new("site"), "/").unwrap();
        assert_eq!(path, Path::new("site/index.html"));
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let path = route_output_path(Path::new("site"), "/a/").unwrap();
        assert_eq!(path, Path::new("site/a/index.html"));
    }

    #[test]
    fn parent_segments_are_rejected() {
        assert!(route_output_path(Path::new("site"), "/../escape").is_err());
        assert!(route_output_path(Path::new("site"), "/a/../../b").is_err());
    }

    #[tokio::test]
    async fn write_creates_directories_and_overwrites_identically() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<html><body>hi</body></html>";

        let first = write_route_html(dir.path(), "/a/b", html).await.unwrap();
        assert_eq!(first, dir.path().join("a/b/index.html"));
        assert_eq!(fs::read_to_string(&first).await.unwrap(), html);

        // Second run with unchanged input is byte-identical.
        let second = write_route_html(dir.path(), "/a/b", html).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).await.unwrap(), html);
    }
}
