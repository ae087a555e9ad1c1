//! Source backed by a GitLab group

use std::time::Duration;

use repo_gitlab::{ClientOptions, GitLabClient, GitLabConnector};
use repo_meta::{GitLabInputConfig, PackageVersions, Packages};

use super::Source;
use crate::{Error, Result};

pub struct GitLabSource {
    id: String,
    connector: GitLabConnector,
}

impl GitLabSource {
    pub fn new(id: impl Into<String>, connector: GitLabConnector) -> Self {
        Self {
            id: id.into(),
            connector,
        }
    }

    pub fn from_config(id: &str, config: &GitLabInputConfig) -> Result<Self> {
        let options = ClientOptions {
            timeout: Duration::from_secs(config.timeout_secs),
            ..ClientOptions::default()
        };
        let client = GitLabClient::new(&config.url, config.token.clone(), options).map_err(|e| {
            Error::Configuration {
                message: format!("input {id}: {e}"),
            }
        })?;

        Ok(Self::new(id, GitLabConnector::new(client, config.group.clone())))
    }

    fn fetch_error(&self, err: repo_gitlab::Error) -> Error {
        Error::SourceFetch {
            source_id: self.id.clone(),
            message: err.to_string(),
        }
    }
}

impl Source for GitLabSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_packages(&self) -> Result<Packages> {
        self.connector
            .list_packages()
            .map_err(|e| self.fetch_error(e))
    }

    fn get_package(&self, name: &str) -> Result<PackageVersions> {
        self.connector
            .get_package(name)
            .map_err(|e| self.fetch_error(e))
    }
}
