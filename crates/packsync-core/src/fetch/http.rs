//! HTTP download of content items.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::{ContentFetcher, HttpClient, describe, is_plain_file_name, transport_error};
use crate::error::FetchError;
use crate::manifest::ContentItem;

/// Streams content items from their download URL to disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: HttpClient,
}

impl HttpFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut response = self
            .http
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let io_err = |source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = File::create(dest).map_err(io_err)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Interrupted {
                url: url.to_string(),
                path: dest.to_path_buf(),
                reason: describe(&e),
            })?
        {
            file.write_all(&chunk).map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().map_err(io_err)?;

        Ok(written)
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, item: &ContentItem, dest_dir: &Path) -> Result<u64, FetchError> {
        if !is_plain_file_name(&item.file_name) {
            return Err(FetchError::InvalidResponse {
                url: item.download_url.clone(),
                reason: format!("refusing unsafe file name {:?}", item.file_name),
            });
        }

        let dest = dest_dir.join(&item.file_name);
        let written = self.http.block_on(self.download(&item.download_url, &dest))?;

        if written != item.file_length {
            return Err(FetchError::SizeMismatch {
                path: dest,
                expected: item.file_length,
                actual: written,
            });
        }

        debug!(mod_id = item.mod_id, bytes = written, path = %dest.display(), "Downloaded");
        Ok(written)
    }
}
