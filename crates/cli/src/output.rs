use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// Envelope every command answers with, success or not.
#[derive(Debug, Serialize)]
pub struct Response<T: Serialize> {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Response<T> {
    pub fn success(message: impl Into<String>, summary: T) -> Self {
        Response {
            status: Status::Success,
            message: message.into(),
            summary: Some(summary),
            timestamp: Utc::now(),
        }
    }

    /// A failed operation that still produced a summary worth reporting.
    pub fn failure(message: impl Into<String>, summary: T) -> Self {
        Response {
            status: Status::Error,
            message: message.into(),
            summary: Some(summary),
            timestamp: Utc::now(),
        }
    }
}

impl Response<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Response {
            status: Status::Error,
            message: message.into(),
            summary: None,
            timestamp: Utc::now(),
        }
    }
}

pub fn print<T: Serialize>(response: &Response<T>) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
