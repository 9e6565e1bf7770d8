use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JobTrackError;

/// Pipeline position of a single application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "applied")]
    Applied,
    #[serde(rename = "1st round")]
    FirstRound,
    #[serde(rename = "2nd round")]
    SecondRound,
    #[serde(rename = "3rd round")]
    ThirdRound,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "no response")]
    NoResponse,
    #[serde(rename = "job offer")]
    JobOffer,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Applied => write!(f, "applied"),
            JobStatus::FirstRound => write!(f, "1st round"),
            JobStatus::SecondRound => write!(f, "2nd round"),
            JobStatus::ThirdRound => write!(f, "3rd round"),
            JobStatus::Rejected => write!(f, "rejected"),
            JobStatus::NoResponse => write!(f, "no response"),
            JobStatus::JobOffer => write!(f, "job offer"),
        }
    }
}

/// One tracked job application.
///
/// The `id` is the remote entry key, assigned on decode; it is never part of
/// the wire payload. `created_at`/`updated_at` are epoch milliseconds used
/// only for ordering; `date` is the human-facing creation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(
        default,
        rename = "createdAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(
        default,
        rename = "updatedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<i64>,
}

impl Job {
    /// New application in the `applied` state, dated today.
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now_ms = Utc::now().timestamp_millis();
        Self {
            id: String::new(),
            title: title.into(),
            company: company.into(),
            description: description.into(),
            link: None,
            status: Some(JobStatus::Applied),
            date: Some(today_formatted()),
            created_at: Some(now_ms),
            updated_at: Some(now_ms),
        }
    }

    /// Decode a keyed snapshot entry, assigning `id` from the entry key.
    pub fn from_entry(key: &str, value: Value) -> Result<Self, JobTrackError> {
        let mut job: Job =
            serde_json::from_value(value).map_err(|source| JobTrackError::InvalidEntry {
                key: key.to_string(),
                source,
            })?;
        job.id = key.to_string();
        Ok(job)
    }

    /// Ordering key for the sorted view. Missing timestamps sort last.
    pub fn sort_timestamp(&self) -> i64 {
        self.updated_at.unwrap_or(0)
    }
}

/// Today's date in the dd/mm/yy display format used for `Job::date`.
pub fn today_formatted() -> String {
    Local::now().format("%d/%m/%y").to_string()
}
