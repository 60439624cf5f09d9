//! Byte loading for datasets and artifacts, from a local path or over HTTP.

mod basic;
mod client;
pub mod auth;

pub use auth::BearerToken;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// Environment variable holding an optional bearer token for remote sources.
pub const TOKEN_ENV: &str = "SCHOOL_SCORE_TOKEN";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Loads `source` from a local file path or an `http(s)` URL, then
/// decompresses it if it is gzip data.
///
/// When [`TOKEN_ENV`] is set, remote requests carry it as a bearer token.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => {
                let client = BearerToken::new(BasicClient::new()?, &token)?;
                fetch_bytes(&client, source).await?
            }
            _ => fetch_bytes(&BasicClient::new()?, source).await?,
        }
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };

    debug!(bytes = bytes.len(), "Source loaded");
    gunzip_if_needed(bytes)
}

/// Returns `bytes` unchanged unless they start with the gzip magic number.
pub fn gunzip_if_needed(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .context("decompressing gzip data")?;
    debug!(compressed = bytes.len(), decompressed = out.len(), "Gzip source inflated");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_plain_bytes_pass_through() {
        let bytes = b"a;b\n1;2\n".to_vec();
        assert_eq!(gunzip_if_needed(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn test_gzip_bytes_are_inflated() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a;b\n1;2\n").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip_if_needed(compressed).unwrap(), b"a;b\n1;2\n");
    }

    #[test]
    fn test_truncated_gzip_is_error() {
        assert!(gunzip_if_needed(vec![0x1f, 0x8b, 0x08]).is_err());
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let path = format!("{}/school_score_fetch_test.csv", std::env::temp_dir().display());
        std::fs::write(&path, "x;y\n").unwrap();

        let bytes = load_source(&path).await.unwrap();
        assert_eq!(bytes, b"x;y\n");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        assert!(load_source("/nonexistent/school_score.csv").await.is_err());
    }
}
