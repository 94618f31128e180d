//! Image byte loading for embedded pictures

use crate::error::{Error, Result};
use std::fs;

/// Read the bytes behind an image URL
///
/// `file://` URLs and plain paths are read from disk. `http://` and
/// `https://` URLs are fetched when the `remote-images` feature is on.
pub fn load_image(url: &str) -> Result<Vec<u8>> {
    if is_remote_url(url) {
        return fetch_remote(url);
    }

    let path = url.strip_prefix("file://").unwrap_or(url);
    fs::read(path).map_err(|e| Error::ImageLoad {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn is_remote_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(feature = "remote-images")]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    use reqwest::blocking::Client;
    use std::time::Duration;

    let load_error = |e: reqwest::Error| Error::ImageLoad {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(load_error)?;

    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(load_error)?;

    Ok(response.bytes().map_err(load_error)?.to_vec())
}

#[cfg(not(feature = "remote-images"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    Err(Error::ImageLoad {
        url: url.to_string(),
        reason: "remote images are disabled in this build".to_string(),
    })
}
