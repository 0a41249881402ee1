//! HTTP client for the remote student store.
//!
//! Talks to `POST /students`, `GET /students/{rollNo}` and `GET /students`
//! under a configurable base URL. The inherent methods return `ApiError`
//! so failures can be told apart in logs; the `RemoteStore` impl collapses
//! them to sentinels.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use tracing::{debug, warn};

use super::{ApiError, RemoteStore};
use crate::models::{student::derive_record, validate, Roster, StudentInput, StudentRecord, ValidationError};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL of the student store.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// A student as the remote store sends it.
///
/// Only the marks and identity are read; derived fields are recomputed so a
/// record from the store obeys the same grading rules as a local one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStudent {
    roll_no: i64,
    name: String,
    subject1: i64,
    subject2: i64,
    subject3: i64,
    #[serde(default, deserialize_with = "lenient_date")]
    date_added: Option<NaiveDate>,
}

/// Read an ISO `YYYY-MM-DD` date; any other shape counts as absent.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}

impl RemoteStudent {
    /// Parse and regrade one entry of a student list.
    fn from_value(entry: serde_json::Value) -> Result<StudentRecord, String> {
        let remote: RemoteStudent = serde_json::from_value(entry).map_err(|e| e.to_string())?;
        remote.into_record().map_err(|e| e.to_string())
    }

    fn into_record(self) -> Result<StudentRecord, ValidationError> {
        let input = StudentInput::new(
            self.roll_no,
            self.name,
            [self.subject1, self.subject2, self.subject3],
        );
        let validated = validate(&input)?;
        Ok(derive_record(validated, self.date_added))
    }
}

/// Client for the remote student store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn students_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn student_url(&self, roll_no: u32) -> String {
        format!("{}/students/{}", self.base_url, roll_no)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn send<F>(&self, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;

            match Self::check_response(response).await {
                Err(ApiError::RateLimited) => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
                other => return other,
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(url, || self.client.get(url)).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }

    // ===== Store Operations =====

    /// Push a record to the store.
    pub async fn post_student(&self, record: &StudentRecord) -> Result<(), ApiError> {
        let url = self.students_url();
        self.send(&url, || self.client.post(&url).json(record)).await?;
        debug!(roll_no = record.roll_no, "Student pushed to remote store");
        Ok(())
    }

    /// Fetch one student by roll number.
    pub async fn get_student(&self, roll_no: u32) -> Result<StudentRecord, ApiError> {
        let remote: RemoteStudent = self.get_json(&self.student_url(roll_no)).await?;
        remote
            .into_record()
            .map_err(|e| ApiError::InvalidResponse(format!("student {}: {}", roll_no, e)))
    }

    /// Fetch every student. Entries that fail to parse or validate are
    /// skipped; only a body that is not a JSON array fails the call.
    pub async fn get_students(&self) -> Result<Roster, ApiError> {
        let entries: Vec<serde_json::Value> = self.get_json(&self.students_url()).await?;
        let total = entries.len();

        let records: Vec<StudentRecord> = entries
            .into_iter()
            .filter_map(|entry| {
                let roll_no = entry.get("rollNo").and_then(serde_json::Value::as_i64);
                match RemoteStudent::from_value(entry) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        warn!(?roll_no, %error, "Skipping invalid student from remote store");
                        None
                    }
                }
            })
            .collect();

        debug!(received = total, kept = records.len(), "Fetched students from remote store");
        Ok(Roster::from_records(records))
    }
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn create(&self, record: &StudentRecord) -> bool {
        match self.post_student(record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(roll_no = record.roll_no, error = %e, "Remote store rejected student");
                false
            }
        }
    }

    async fn fetch_by_id(&self, roll_no: u32) -> Option<StudentRecord> {
        match self.get_student(roll_no).await {
            Ok(record) => Some(record),
            Err(e) if e.is_not_found() => {
                debug!(roll_no, "Student not in remote store");
                None
            }
            Err(e) => {
                warn!(roll_no, error = %e, "Remote search failed");
                None
            }
        }
    }

    async fn fetch_all(&self) -> Option<Roster> {
        match self.get_students().await {
            Ok(roster) => Some(roster),
            Err(e) => {
                warn!(error = %e, "Remote fetch failed");
                None
            }
        }
    }
}
