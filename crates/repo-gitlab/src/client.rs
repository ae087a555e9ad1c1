//! Blocking GitLab REST v4 client
//!
//! Every request retries transient failures (connection errors, timeouts,
//! `429` and `5xx` responses) with exponential backoff. List endpoints are
//! fetched page by page until `X-Total-Pages` is reached.

use std::time::Duration;

use backoff::ExponentialBackoff;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{Branch, Group, Project, Tag};

/// Page size requested from list endpoints.
pub const PER_PAGE: usize = 100;

const TOTAL_PAGES_HEADER: &str = "X-Total-Pages";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Connection settings for [`GitLabClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Give up retrying a request after this long
    pub retry_budget: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_budget: Duration::from_secs(60),
        }
    }
}

pub struct GitLabClient {
    api: Url,
    token: Option<String>,
    http: Client,
    options: ClientOptions,
}

impl GitLabClient {
    /// Create a client for the instance at `base_url` (e.g. `https://gitlab.com`).
    pub fn new(base_url: &str, token: Option<String>, options: ClientOptions) -> Result<Self> {
        let invalid = |message: String| Error::InvalidUrl {
            url: base_url.to_string(),
            message,
        };

        let mut api = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        api.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("repoctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http {
                url: base_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            api,
            token,
            http,
            options,
        })
    }

    /// Look up a group by full path or numeric id.
    pub fn group(&self, group: &str) -> Result<Group> {
        let url = self.endpoint(&["groups", group]);
        self.get_json(&url)
    }

    /// Every project directly inside a group.
    pub fn group_projects(&self, group_id: u64) -> Result<Vec<Project>> {
        let id = group_id.to_string();
        self.get_all(&["groups", &id, "projects"], &[("simple", "true")])
    }

    /// Look up a project by namespace path, `None` when it does not exist.
    pub fn project(&self, path: &str) -> Result<Option<Project>> {
        let url = self.endpoint(&["projects", path]);
        match self.get(&url)? {
            Some(response) => decode(&url, response).map(Some),
            None => Ok(None),
        }
    }

    pub fn branches(&self, project_id: u64) -> Result<Vec<Branch>> {
        let id = project_id.to_string();
        self.get_all(&["projects", &id, "repository", "branches"], &[])
    }

    pub fn tags(&self, project_id: u64) -> Result<Vec<Tag>> {
        let id = project_id.to_string();
        self.get_all(&["projects", &id, "repository", "tags"], &[])
    }

    /// Raw content of `file` at `reference`, `None` when the file is absent.
    pub fn raw_file(&self, project_id: u64, file: &str, reference: &str) -> Result<Option<Vec<u8>>> {
        let id = project_id.to_string();
        let mut url = self.endpoint(&["projects", &id, "repository", "files", file, "raw"]);
        url.query_pairs_mut().append_pair("ref", reference);

        match self.get(&url)? {
            Some(response) => response
                .bytes()
                .map(|bytes| Some(bytes.to_vec()))
                .map_err(|e| Error::Http {
                    url: url.to_string(),
                    source: e,
                }),
            None => Ok(None),
        }
    }

    /// API URL with each segment percent-encoded, so `acme/widget` becomes
    /// a single `acme%2Fwidget` segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        match self.get(url)? {
            Some(response) => decode(url, response),
            None => Err(Error::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            }),
        }
    }

    fn get_all<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut url = self.endpoint(segments);
            url.query_pairs_mut()
                .extend_pairs(query)
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.get(&url)?.ok_or_else(|| Error::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            })?;
            let total_pages = response
                .headers()
                .get(TOTAL_PAGES_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());

            let batch: Vec<T> = decode(&url, response)?;
            let received = batch.len();
            items.extend(batch);

            let last = match total_pages {
                Some(total) => page >= total,
                None => received < PER_PAGE,
            };
            if last {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Successful response, `None` for `404`, error for any other status.
    fn get(&self, url: &Url) -> Result<Option<Response>> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(self.options.retry_budget),
            ..ExponentialBackoff::default()
        };

        let response = backoff::retry(policy, || self.send_once(url)).map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })?;

        match response.status() {
            status if status.is_success() => Ok(Some(response)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    fn send_once(&self, url: &Url) -> std::result::Result<Response, backoff::Error<Error>> {
        tracing::debug!("GET {}", url);

        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        match request.send() {
            Ok(response) if is_transient(response.status()) => {
                tracing::warn!("GitLab returned {} for {}, retrying", response.status(), url);
                Err(backoff::Error::transient(Error::Status {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                }))
            }
            Ok(response) => Ok(response),
            Err(e) => {
                let retry = e.is_timeout() || e.is_connect();
                let err = Error::Http {
                    url: url.to_string(),
                    source: e,
                };
                if retry {
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                }
            }
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T> {
    response.json().map_err(|e| Error::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
