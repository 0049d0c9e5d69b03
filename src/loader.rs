//! Document loading from files, strings, and HTTP URLs.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConvertError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum attempts for a single schema fetch. Only connection resets are
/// retried; any other failure gives up immediately.
#[cfg(feature = "remote")]
const FETCH_RETRY_MAX: u32 = 20;

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the file doesn't exist,
/// or `ConvertError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConvertError::InvalidJson { source })
}

/// Load a schema document from a JSON string.
///
/// # Errors
///
/// Returns `ConvertError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(content).map_err(|source| ConvertError::InvalidJson { source })
}

/// Collect the `.json` schema files directly inside a directory, sorted by
/// name for reproducible runs.
///
/// # Errors
///
/// Returns `ConvertError::ReadError` if the directory cannot be listed.
pub fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConvertError::ReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

/// Fetch a schema document from an HTTP/HTTPS URL.
///
/// Retries up to a fixed bound when the connection is reset mid-request;
/// any other failure (including HTTP error statuses and bodies that are
/// not JSON) aborts on the first attempt.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ConvertError::NetworkError` when the fetch ultimately fails.
#[cfg(feature = "remote")]
pub fn fetch_document(url: &str) -> Result<Value, ConvertError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| ConvertError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let mut attempt = 0;
    loop {
        match try_fetch(&client, url) {
            Ok(value) => return Ok(value),
            Err(source) => {
                attempt += 1;
                if attempt >= FETCH_RETRY_MAX || !is_connection_reset(&source) {
                    return Err(ConvertError::NetworkError {
                        url: url.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(feature = "remote")]
fn try_fetch(client: &reqwest::blocking::Client, url: &str) -> Result<Value, reqwest::Error> {
    client.get(url).send()?.error_for_status()?.json()
}

/// Walk the error source chain looking for a connection-reset I/O error.
#[cfg(feature = "remote")]
fn is_connection_reset(err: &reqwest::Error) -> bool {
    use std::error::Error;

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
