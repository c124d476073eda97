//! Job identity and the inputs a worker needs to render one video.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// Always a canonical hyphenated UUID v4, which also makes it safe to use
/// as a directory name under the task root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a client-supplied ID.
    ///
    /// Returns `None` unless `s` is a UUID in canonical lowercase hyphenated
    /// form. Anything else can never name a job this service created.
    pub fn parse(s: &str) -> Option<Self> {
        let uuid = Uuid::parse_str(s).ok()?;
        let canonical = uuid.hyphenated().to_string();
        (canonical == s).then_some(Self(canonical))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a worker process needs to run one job.
///
/// Persisted as `job.json` in the job directory when the job is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Unique job ID
    pub id: JobId,
    /// Source folder holding the images and the audio track
    pub folder_id: String,
    /// Title drawn on top of the video
    pub title: String,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

impl JobSpec {
    /// Create a spec for a freshly allocated job.
    pub fn new(folder_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            folder_id: folder_id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_accepts_generated_ids() {
        let id = JobId::new();
        assert_eq!(JobId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(JobId::parse("").is_none());
        assert!(JobId::parse("../etc/passwd").is_none());
        assert!(JobId::parse("not-a-uuid").is_none());
        // Simple (unhyphenated) and uppercase forms are not what we hand out
        assert!(JobId::parse("67e5504410b1426f9247bb680e5fe0c8").is_none());
        assert!(JobId::parse("67E55044-10B1-426F-9247-BB680E5FE0C8").is_none());
    }

    #[test]
    fn test_spec_json_shape() {
        let spec = JobSpec::new("F1", "Test");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["id"], spec.id.as_str());
        assert_eq!(json["folder_id"], "F1");
        assert_eq!(json["title"], "Test");

        let back: JobSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
