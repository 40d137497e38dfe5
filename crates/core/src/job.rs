//! Job records as returned by the GitLab jobs API.

use serde::Deserialize;

use crate::types::JobId;

/// One file bundle attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactFile {
    /// Artifact kind reported by GitLab, e.g. `"archive"` or `"trace"`.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A CI/CD job.
///
/// Only `id` is needed for deletion. The remaining fields are populated in
/// discovery mode and are informational.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactFile>,
}

impl Job {
    /// A job known only by its ID (range mode).
    pub fn from_id(id: JobId) -> Self {
        Self {
            id,
            name: None,
            status: None,
            artifacts: Vec::new(),
        }
    }

    /// Whether the API reported any artifact files for this job.
    pub fn has_artifacts(&self) -> bool {
        !self.artifacts.is_empty()
    }

    /// Total artifact bytes reported by the API.
    pub fn artifact_bytes(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size).sum()
    }
}
