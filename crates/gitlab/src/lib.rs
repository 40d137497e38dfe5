//! GitLab REST client for the artifact sweeper.
//!
//! [`GitLabApi`] wraps the three endpoints the sweeper needs (project
//! lookup, paginated job listing, artifact deletion) using [`reqwest`].
//! The pipeline talks to it through the [`GitLabClient`] trait so tests can
//! substitute an in-memory transport.

pub mod api;
pub mod client;

pub use api::{api_base_url, GitLabApi, GitLabApiError, PRIVATE_TOKEN_HEADER};
pub use client::GitLabClient;
pub use reqwest::StatusCode;
