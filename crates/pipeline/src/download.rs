//! Downloads an ad's images into its per-item temp directory.

use std::path::{Path, PathBuf};

/// File name for a downloaded image: the URL's last path segment, or an
/// index-based fallback when the URL has none.
fn file_name_for(url: &str, index: usize) -> String {
    url.rsplit('/')
        .next()
        .map(|segment| segment.split(['?', '#']).next().unwrap_or(segment))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("image_{index}"))
}

/// Download each URL into `dest`, returning the local paths that
/// succeeded.
///
/// Failures shrink the result silently apart from a warn log: an image
/// that cannot be fetched is simply not scanned or redacted.
pub async fn download_images(
    http: &reqwest::Client,
    ad_id: &str,
    urls: &[String],
    dest: &Path,
) -> Result<Vec<PathBuf>, std::io::Error> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(dest).await?;

    let mut local_paths = Vec::with_capacity(urls.len());
    for (index, url) in urls.iter().enumerate() {
        let bytes = match fetch(http, url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(ad_id, url, error = %e, "Image download failed; skipping");
                continue;
            }
        };

        let path = dest.join(file_name_for(url, index));
        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => local_paths.push(path),
            Err(e) => {
                tracing::warn!(ad_id, url, path = %path.display(), error = %e,
                    "Could not write downloaded image; skipping");
            }
        }
    }

    Ok(local_paths)
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
