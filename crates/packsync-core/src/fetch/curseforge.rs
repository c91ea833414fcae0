//! Resolve manifest file references through the CurseForge API.

use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::{ContentResolver, HttpClient, transport_error};
use crate::error::FetchError;
use crate::manifest::{ContentItem, FileId, FileRef, ModId};

pub const DEFAULT_API_BASE: &str = "https://api.curseforge.com";

/// Edge CDN used when the API withholds a download URL.
const EDGE_CDN: &str = "https://edge.forgecdn.net/files";

/// Looks up file metadata at `GET {api_base}/v1/mods/{modId}/files/{fileId}`.
#[derive(Debug, Clone)]
pub struct CurseForgeResolver {
    http: HttpClient,
    api_base: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    data: FileData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    id: FileId,
    mod_id: ModId,
    #[serde(default)]
    display_name: String,
    file_name: String,
    file_length: u64,
    #[serde(default)]
    download_url: Option<String>,
}

impl CurseForgeResolver {
    pub fn new(http: HttpClient, api_base: Url, api_key: String) -> Self {
        Self {
            http,
            api_base,
            api_key,
        }
    }

    /// Endpoint for a single file of a mod.
    pub fn file_url(&self, mod_id: ModId, file_id: FileId) -> String {
        format!(
            "{}/v1/mods/{}/files/{}",
            self.api_base.as_str().trim_end_matches('/'),
            mod_id,
            file_id
        )
    }

    async fn get_file(&self, url: &str) -> Result<FileData, FetchError> {
        let response = self
            .http
            .client()
            .get(url)
            .header("x-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.http.timeout())
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let envelope: FileEnvelope =
            response
                .json()
                .await
                .map_err(|e| FetchError::InvalidResponse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(envelope.data)
    }
}

impl ContentResolver for CurseForgeResolver {
    fn resolve(&self, file: &FileRef) -> Result<ContentItem, FetchError> {
        let url = self.file_url(file.project_id, file.file_id);
        let data = self.http.block_on(self.get_file(&url))?;

        if data.mod_id != file.project_id || data.id != file.file_id {
            return Err(FetchError::InvalidResponse {
                url,
                reason: format!(
                    "expected mod {} file {}, got mod {} file {}",
                    file.project_id, file.file_id, data.mod_id, data.id
                ),
            });
        }

        let download_url = match data.download_url {
            Some(download_url) if !download_url.is_empty() => download_url,
            _ => {
                warn!(
                    mod_id = data.mod_id,
                    file_id = data.id,
                    "API withheld download URL, using edge CDN"
                );
                edge_cdn_url(data.id, &data.file_name)
            }
        };

        let display_name = if data.display_name.is_empty() {
            data.file_name.clone()
        } else {
            data.display_name
        };

        Ok(ContentItem {
            mod_id: data.mod_id,
            display_name,
            file_name: data.file_name,
            download_url,
            file_length: data.file_length,
            file_id: data.id,
        })
    }
}

/// `https://edge.forgecdn.net/files/{id / 1000}/{id % 1000}/{file name}`
fn edge_cdn_url(file_id: FileId, file_name: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        EDGE_CDN,
        file_id / 1000,
        file_id % 1000,
        file_name.replace(' ', "%20")
    )
}
