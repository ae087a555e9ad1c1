//! Azure Blob Storage backend
//!
//! Talks to the Blob REST API with a shared access signature appended to
//! every request. Revisions are blob ETags; conditional writes use
//! `If-Match` or `If-None-Match: *`.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH};
use repo_meta::AzureOutputConfig;
use url::Url;

use super::Storage;
use crate::{Error, Result};

const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
const API_VERSION_HEADER: &str = "x-ms-version";
const API_VERSION: &str = "2021-08-06";

pub struct AzureBlobStorage {
    container_url: Url,
    sas_token: String,
    base_path: String,
    http: Client,
}

impl AzureBlobStorage {
    /// Backend for `container` under `endpoint` (the account's blob service URL).
    pub fn new(endpoint: &str, container: &str, sas_token: &str) -> Result<Self> {
        let invalid = |message: String| Error::Configuration {
            message: format!("azure endpoint {endpoint:?}: {message}"),
        };

        let mut container_url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        container_url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(container);

        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            container_url,
            sas_token: sas_token.trim_start_matches('?').to_string(),
            base_path: format!("/{container}"),
            http,
        })
    }

    pub fn from_config(config: &AzureOutputConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.blob.core.windows.net", config.account_name));
        Self::new(&endpoint, &config.container, &config.sas_token)
    }

    fn blob_url(&self, name: &str) -> Result<Url> {
        repo_fs::validate_relative_name(name)?;

        let mut url = self.container_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(name.split('/'));
        }
        if !self.sas_token.is_empty() {
            url.set_query(Some(&self.sas_token));
        }
        Ok(url)
    }

    fn send(request: RequestBuilder) -> reqwest::Result<Response> {
        request
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .map_err(reqwest::Error::without_url)
    }

    fn put(&self, name: &str, bytes: &[u8], expected: Option<Option<&str>>) -> Result<()> {
        let url = self.blob_url(name)?;
        tracing::debug!("Uploading {}", name);

        let mut request = self
            .http
            .put(url)
            .header(BLOB_TYPE_HEADER, "BlockBlob")
            .header(CONTENT_TYPE, "application/json")
            .body(bytes.to_vec());
        request = match expected {
            None => request,
            Some(None) => request.header(IF_NONE_MATCH, "*"),
            Some(Some(etag)) => request.header(IF_MATCH, etag),
        };

        let response = Self::send(request).map_err(|e| Error::StorageWrite {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT if expected.is_some() => {
                Err(Error::Conflict {
                    name: name.to_string(),
                })
            }
            status => Err(Error::StorageWrite {
                name: name.to_string(),
                message: format!("blob service returned {status}"),
            }),
        }
    }
}

impl Storage for AzureBlobStorage {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let url = self.blob_url(name)?;
        tracing::debug!("Downloading {}", name);

        let response = Self::send(self.http.get(url)).map_err(|e| read_error(name, e))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .bytes()
                .map(|bytes| Some(bytes.to_vec()))
                .map_err(|e| read_error(name, e.without_url())),
            status => Err(Error::StorageRead {
                name: name.to_string(),
                message: format!("blob service returned {status}"),
            }),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.put(name, bytes, None)
    }

    fn revision(&self, name: &str) -> Result<Option<String>> {
        let url = self.blob_url(name)?;

        let response = Self::send(self.http.head(url)).map_err(|e| read_error(name, e))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(response
                .headers()
                .get(ETAG)
                .and_then(|etag| etag.to_str().ok())
                .map(str::to_string)),
            status => Err(Error::StorageRead {
                name: name.to_string(),
                message: format!("blob service returned {status}"),
            }),
        }
    }

    fn write_if(&self, name: &str, bytes: &[u8], expected: Option<&str>) -> Result<()> {
        self.put(name, bytes, Some(expected))
    }
}

fn read_error(name: &str, err: reqwest::Error) -> Error {
    Error::StorageRead {
        name: name.to_string(),
        message: err.to_string(),
    }
}
