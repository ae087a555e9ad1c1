//! Branch and tag to Composer version normalization

use std::sync::LazyLock;

use regex::Regex;

/// Drupal contrib tags such as `8.x-1.2` or `7.x-2.0-beta1`.
static DRUPAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.x-(\d+\.\d+(-.*)?)").unwrap());

/// Tags that are published as versions; anything else is skipped.
static VERSION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+\.\d+(\.\d+)?(-(dev|p|patch|a|alpha|b|beta|RC|rc)\d*)?$").unwrap()
});

/// Version string for a branch: `dev-<branch>`.
pub fn branch_version(branch: &str) -> String {
    format!("dev-{branch}")
}

/// Version string for a tag, or `None` when the tag is not a version.
pub fn tag_version(tag: &str) -> Option<String> {
    let version = match DRUPAL_TAG.captures(tag).and_then(|c| c.get(1)) {
        Some(core) => {
            tracing::debug!("Changing version {:?} to {:?}", tag, core.as_str());
            core.as_str()
        }
        None => tag,
    };

    VERSION_TAG
        .is_match(version)
        .then(|| version.to_string())
}
