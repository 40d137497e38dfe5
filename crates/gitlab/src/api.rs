//! REST API client for the GitLab v4 endpoints.
//!
//! Wraps project lookup, job listing, and artifact deletion using
//! [`reqwest`]. One [`GitLabApi`] (and therefore one connection pool) is
//! shared by every worker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use sweeper_core::{Job, JobId, ProjectId};

use crate::client::GitLabClient;

/// Header carrying the private access token.
pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Idle connections kept per host. Sized for the default worker count.
const MAX_IDLE_PER_HOST: usize = 100;

/// How long an idle pooled connection is kept open.
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Errors from the GitLab REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum GitLabApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A transport other than reqwest failed before a response arrived.
    #[error("connection failed: {0}")]
    Connection(String),

    /// GitLab returned an unexpected status code.
    #[error("GitLab API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Build the `/api/v4` base URL for a server.
///
/// A bare hostname gets `https://`; a value that already carries a scheme
/// is used as given.
pub fn api_base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.contains("://") {
        format!("{server}/api/v4")
    } else {
        format!("https://{server}/api/v4")
    }
}

/// HTTP client for a single GitLab server.
#[derive(Clone)]
pub struct GitLabApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitLabApi {
    /// Create a client with its own connection pool.
    ///
    /// * `server` - Hostname (`gitlab.example.com`) or base URL
    ///   (`http://127.0.0.1:8080`).
    /// * `timeout` - Applied to every request.
    pub fn new(server: &str, token: String, timeout: Duration) -> Result<Self, GitLabApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, server, token))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, server: &str, token: String) -> Self {
        Self {
            client,
            api_url: api_base_url(server),
            token,
        }
    }

    /// The resolved `/api/v4` base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn project_url(&self, project_id: ProjectId) -> String {
        format!("{}/projects/{project_id}", self.api_url)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(PRIVATE_TOKEN_HEADER, &self.token)
    }
}

#[async_trait]
impl GitLabClient for GitLabApi {
    async fn project_status(&self, project_id: ProjectId) -> Result<StatusCode, GitLabApiError> {
        let response = self
            .request(reqwest::Method::GET, self.project_url(project_id))
            .send()
            .await?;
        Ok(response.status())
    }

    async fn list_jobs(
        &self,
        project_id: ProjectId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Job>, GitLabApiError> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}/jobs", self.project_url(project_id)),
            )
            .query(&[("per_page", per_page), ("page", page)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GitLabApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Vec<Job>>().await?)
    }

    async fn delete_artifacts(
        &self,
        project_id: ProjectId,
        job_id: JobId,
    ) -> Result<StatusCode, GitLabApiError> {
        let url = format!("{}/jobs/{job_id}/artifacts", self.project_url(project_id));
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = response.status();
        tracing::trace!(project_id, job_id, status = status.as_u16(), "Artifact delete response");
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{delete, get};
    use axum::{Json, Router};

    use super::*;

    const TOKEN: &str = "test-token";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(PRIVATE_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            == Some(TOKEN)
    }

    /// Fake GitLab: project 1 exists with 3 jobs, everything else is 404.
    fn fake_gitlab() -> Router {
        Router::new()
            .route(
                "/api/v4/projects/{id}",
                get(|Path(id): Path<i64>, headers: HeaderMap| async move {
                    if !authorized(&headers) {
                        return AxumStatus::UNAUTHORIZED;
                    }
                    if id == 1 {
                        AxumStatus::OK
                    } else {
                        AxumStatus::NOT_FOUND
                    }
                }),
            )
            .route(
                "/api/v4/projects/{id}/jobs",
                get(
                    |Path(id): Path<i64>,
                     Query(query): Query<HashMap<String, String>>,
                     headers: HeaderMap| async move {
                        if !authorized(&headers) || id != 1 {
                            return Err((AxumStatus::FORBIDDEN, "403 Forbidden"));
                        }
                        let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                        let per_page: u32 =
                            query.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(20);
                        let all = [11, 12, 13];
                        let start = ((page - 1) * per_page) as usize;
                        let jobs: Vec<_> = all
                            .iter()
                            .skip(start)
                            .take(per_page as usize)
                            .map(|id| {
                                serde_json::json!({
                                    "id": id,
                                    "name": format!("job-{id}"),
                                    "status": "success",
                                    "artifacts": [{"file_type": "archive", "size": 10}],
                                })
                            })
                            .collect();
                        Ok(Json(jobs))
                    },
                ),
            )
            .route(
                "/api/v4/projects/{id}/jobs/{job_id}/artifacts",
                delete(
                    |Path((_id, job_id)): Path<(i64, i64)>, headers: HeaderMap| async move {
                        if !authorized(&headers) {
                            return AxumStatus::UNAUTHORIZED;
                        }
                        match job_id {
                            11 => AxumStatus::NO_CONTENT,
                            13 => AxumStatus::INTERNAL_SERVER_ERROR,
                            _ => AxumStatus::NOT_FOUND,
                        }
                    },
                ),
            )
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn api_for(token: &str) -> GitLabApi {
        let base = spawn_server(fake_gitlab()).await;
        GitLabApi::new(&base, token.to_string(), Duration::from_secs(5)).unwrap()
    }

    // -- api_base_url ---------------------------------------------------------

    #[test]
    fn bare_host_defaults_to_https() {
        assert_eq!(
            api_base_url("gitlab.example.com"),
            "https://gitlab.example.com/api/v4"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            api_base_url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/api/v4"
        );
    }

    // -- project_status -------------------------------------------------------

    #[tokio::test]
    async fn project_status_reports_found_and_missing() {
        let api = api_for(TOKEN).await;
        assert_eq!(api.project_status(1).await.unwrap(), StatusCode::OK);
        assert_eq!(api.project_status(99).await.unwrap(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn token_header_is_sent() {
        let api = api_for("wrong-token").await;
        assert_eq!(
            api.project_status(1).await.unwrap(),
            StatusCode::UNAUTHORIZED
        );
    }

    // -- list_jobs ------------------------------------------------------------

    #[tokio::test]
    async fn list_jobs_decodes_page() {
        let api = api_for(TOKEN).await;
        let jobs = api.list_jobs(1, 1, 2).await.unwrap();
        assert_eq!(jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![11, 12]);
        assert_eq!(jobs[0].name.as_deref(), Some("job-11"));
        assert_eq!(jobs[0].artifact_bytes(), 10);

        let jobs = api.list_jobs(1, 2, 2).await.unwrap();
        assert_eq!(jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![13]);
    }

    #[tokio::test]
    async fn list_jobs_non_ok_status_is_error() {
        let api = api_for(TOKEN).await;
        let err = api.list_jobs(2, 1, 100).await.unwrap_err();
        assert_matches!(err, GitLabApiError::Api { status: 403, ref body } if body.contains("Forbidden"));
    }

    // -- delete_artifacts -----------------------------------------------------

    #[tokio::test]
    async fn delete_artifacts_returns_raw_status() {
        let api = api_for(TOKEN).await;
        assert_eq!(api.delete_artifacts(1, 11).await.unwrap(), StatusCode::NO_CONTENT);
        assert_eq!(api.delete_artifacts(1, 12).await.unwrap(), StatusCode::NOT_FOUND);
        assert_eq!(
            api.delete_artifacts(1, 13).await.unwrap(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = GitLabApi::new(
            &format!("http://{addr}"),
            TOKEN.to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_matches!(
            api.delete_artifacts(1, 11).await,
            Err(GitLabApiError::Request(_))
        );
    }

    #[test]
    fn api_error_display() {
        let err = GitLabApiError::Api {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "GitLab API error (502): bad gateway");
    }
}
