/// GitLab job identifiers are positive integers.
pub type JobId = i64;

/// GitLab project identifiers are positive integers.
pub type ProjectId = i64;
