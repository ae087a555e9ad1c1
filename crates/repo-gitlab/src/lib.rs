//! GitLab connector for the Composer repository generator
//!
//! Enumerates the projects of a GitLab group and turns every branch and
//! version tag into a Composer package version:
//!
//! - [`client`]: thin blocking REST client with pagination and retries
//! - [`connector`]: project, branch and tag enumeration, `composer.json` parsing
//! - [`versions`]: branch and tag to version normalization

pub mod client;
pub mod connector;
pub mod error;
pub mod models;
pub mod versions;

pub use client::{ClientOptions, GitLabClient};
pub use connector::GitLabConnector;
pub use error::{Error, Result};
