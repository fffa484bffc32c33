use crate::constants::DEFAULT_LIST_LIMIT;
use crate::conversion::ConversionMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Expired,
    /// A status this client does not know; treated as still processing.
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Expired => "expired",
            JobStatus::Other(status) => status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Expired
        )
    }
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "queued" => JobStatus::Queued,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "expired" => JobStatus::Expired,
            _ => JobStatus::Other(status),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conversion job as reported by `/v1/jobs`.
///
/// The typed fields are a lenient view of the record: a value of an
/// unexpected type reads as `None`. The record itself is kept as received and
/// is what a `Job` serializes back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub download_url: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub tokens_used: Option<u64>,
    pub original_filename: Option<String>,
    pub source_format: Option<String>,
    pub target_format: Option<String>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub conversion_metadata: Option<Value>,
    raw: Map<String, Value>,
}

impl Job {
    /// The record exactly as the server sent it.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }
}

impl TryFrom<Value> for Job {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let raw = match value {
            Value::Object(raw) => raw,
            other => return Err(format!("expected a job object, found {}", other)),
        };

        let id = match raw.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        let status = JobStatus::from(text(&raw, "status").unwrap_or_default());

        Ok(Job {
            id,
            status,
            error_message: text(&raw, "error_message"),
            download_url: text(&raw, "download_url"),
            processing_time_ms: count(&raw, "processing_time_ms"),
            tokens_used: count(&raw, "tokens_used"),
            original_filename: text(&raw, "original_filename"),
            source_format: text(&raw, "source_format"),
            target_format: text(&raw, "target_format"),
            created_at: text(&raw, "created_at"),
            completed_at: text(&raw, "completed_at"),
            conversion_metadata: raw
                .get("conversion_metadata")
                .filter(|v| !v.is_null())
                .cloned(),
            raw,
        })
    }
}

impl From<Job> for Value {
    fn from(job: Job) -> Self {
        Value::Object(job.raw)
    }
}

fn text(raw: &Map<String, Value>, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

// Fractional counts are rounded; negative ones are ignored.
fn count(raw: &Map<String, Value>, field: &str) -> Option<u64> {
    let value = raw.get(field)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub daily_conversions_remaining: i64,
    #[serde(default)]
    pub total_conversions: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListJobsQuery {
    pub limit: u32,
    pub offset: u32,
    pub status: Option<String>,
}

impl Default for ListJobsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            status: None,
        }
    }
}

impl ListJobsQuery {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

// Wire bodies for the conversion endpoints.

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadUrlRequest<'a> {
    pub filename: &'a str,
    pub source_format: &'a str,
    pub target_format: &'a str,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_metadata: Option<&'a ConversionMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadSlot {
    pub job_id: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConfirmRequest<'a> {
    pub job_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConfirmReceipt {
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobBody {
    pub job: Job,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobsBody {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountBody {
    pub account: Account,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing() {
        assert_eq!(JobStatus::from("completed".to_string()), JobStatus::Completed);
        assert_eq!(
            JobStatus::from("uploading".to_string()),
            JobStatus::Other("uploading".to_string())
        );
        assert!(JobStatus::Expired.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Other("uploading".to_string()).is_terminal());
    }

    #[test]
    fn test_job_keeps_unknown_fields() {
        let raw = json!({
            "id": "job-1",
            "status": "completed",
            "download_url": "https://cdn.test/out.jpg",
            "processing_time_ms": 812,
            "file_size": 1024,
            "user_id": "u-9"
        });

        let job: Job = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.processing_time_ms, Some(812));
        assert_eq!(job.tokens_used, None);
        assert_eq!(job.get("user_id"), Some(&json!("u-9")));
        assert_eq!(serde_json::to_value(&job).unwrap(), raw);
    }

    #[test]
    fn test_job_tolerates_nulls_and_odd_types() {
        let raw = json!({
            "id": 17,
            "status": "completed",
            "error_message": null,
            "tokens_used": null,
            "processing_time_ms": 812.5,
            "download_url": 42,
            "conversion_metadata": null
        });

        let job: Job = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(job.id, "17");
        assert_eq!(job.error_message, None);
        assert_eq!(job.tokens_used, None);
        assert_eq!(job.processing_time_ms, Some(813));
        assert_eq!(job.download_url, None);
        assert_eq!(job.conversion_metadata, None);
        assert_eq!(serde_json::to_value(&job).unwrap(), raw);
    }

    #[test]
    fn test_job_must_be_an_object() {
        assert!(serde_json::from_value::<Job>(json!(["job-1"])).is_err());
    }

    #[test]
    fn test_list_query_pairs() {
        let pairs = ListJobsQuery::new(10, 0).with_status("completed").query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("limit", "10".to_string()),
                ("offset", "0".to_string()),
                ("status", "completed".to_string()),
            ]
        );

        let defaults = ListJobsQuery::default().query_pairs();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0], ("limit", "50".to_string()));
    }
}
