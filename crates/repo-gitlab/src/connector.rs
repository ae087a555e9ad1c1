//! GitLab group connector
//!
//! Each project in the configured group becomes one package named after its
//! lower-cased namespace path. Branches publish as `dev-<branch>`, version
//! tags publish under their normalized version, and every version's `source`
//! pins the commit the ref pointed at.

use repo_meta::{Package, PackageVersions, Packages, Source};

use crate::client::GitLabClient;
use crate::error::{Error, Result};
use crate::models::Project;
use crate::versions::{branch_version, tag_version};

const MANIFEST_FILE: &str = "composer.json";

pub struct GitLabConnector {
    client: GitLabClient,
    group: String,
}

impl GitLabConnector {
    pub fn new(client: GitLabClient, group: impl Into<String>) -> Self {
        Self {
            client,
            group: group.into(),
        }
    }

    /// Every package in the group.
    pub fn list_packages(&self) -> Result<Packages> {
        let group = self.client.group(&self.group)?;
        let projects = self.client.group_projects(group.id)?;
        tracing::info!("Found {} projects in {}", projects.len(), group.full_path);

        let mut packages = Packages::new();
        for project in projects {
            tracing::info!("Loading {}", project.path_with_namespace);
            let versions = self.project_versions(&project)?;
            packages.insert(project.package_name(), versions);
        }
        Ok(packages)
    }

    /// Versions of a single package.
    ///
    /// A package whose project no longer exists has no versions.
    pub fn get_package(&self, name: &str) -> Result<PackageVersions> {
        match self.client.project(name)? {
            Some(project) => {
                tracing::info!("Loading {}", project.path_with_namespace);
                self.project_versions(&project)
            }
            None => {
                tracing::warn!("Project {} not found", name);
                Ok(PackageVersions::new())
            }
        }
    }

    fn project_versions(&self, project: &Project) -> Result<PackageVersions> {
        let mut versions = PackageVersions::new();

        for branch in self.client.branches(project.id)? {
            let mut package = self.manifest_at(project, &branch.name, &branch.commit.id)?;
            package.version = branch_version(&branch.name);
            versions.insert(package.version.clone(), package);
        }

        for tag in self.client.tags(project.id)? {
            let Some(version) = tag_version(&tag.name) else {
                tracing::warn!(
                    "Skipping tag {:?} of {} as it is not a valid version number",
                    tag.name,
                    project.path_with_namespace
                );
                continue;
            };
            let mut package = self.manifest_at(project, &tag.name, &tag.commit.id)?;
            package.version = version;
            versions.insert(package.version.clone(), package);
        }

        Ok(versions)
    }

    /// `composer.json` at `reference` with name and source forced from the project.
    fn manifest_at(&self, project: &Project, reference: &str, commit: &str) -> Result<Package> {
        let mut package = match self.client.raw_file(project.id, MANIFEST_FILE, reference)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| Error::Manifest {
                project: project.path_with_namespace.clone(),
                reference: reference.to_string(),
                message: e.to_string(),
            })?,
            None => {
                tracing::debug!(
                    "No {} in {} at {}",
                    MANIFEST_FILE,
                    project.path_with_namespace,
                    reference
                );
                Package::default()
            }
        };

        package.name = project.package_name();
        package.source = Some(Source::git(project.git_url(), commit));
        Ok(package)
    }
}
