//! Domain DTOs for the task API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.
//!
//! Optional request fields are skipped when `None` so that a partial update
//! only touches the fields the caller actually set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Server-assigned task identifier.
pub type TaskId = i64;

/// A single task as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a new task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl NewTask {
    /// Build a pending task from raw user input.
    ///
    /// The title is trimmed and must not be empty. A description that is
    /// empty after trimming becomes `None`.
    pub fn normalized(title: &str, description: Option<&str>) -> Result<Self, ApiError> {
        Ok(Self {
            title: required_title(title)?,
            description: optional_text(description),
            completed: Some(false),
        })
    }
}

/// Request payload for updating an existing task. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Trim the title if one is set, rejecting a blank replacement title.
    pub fn normalize(mut self) -> Result<Self, ApiError> {
        if let Some(title) = self.title.take() {
            self.title = Some(required_title(&title)?);
        }
        Ok(self)
    }
}

pub(crate) fn required_title(title: &str) -> Result<String, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Accepts RFC 3339 timestamps as well as naive ISO-8601 ones, which are
/// taken to be UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_accepts_rfc3339_timestamp() {
        let task: Task = serde_json::from_str(
            r#"{"id":1,"title":"a","description":null,"completed":false,"created_at":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert!(task.description.is_none());
    }

    #[test]
    fn task_accepts_naive_timestamp_as_utc() {
        let task: Task = serde_json::from_str(
            r#"{"id":2,"title":"a","completed":true,"created_at":"2024-05-01T10:00:00.250"}"#,
        )
        .unwrap();
        assert_eq!(task.created_at.timestamp(), 1_714_557_600);
        assert_eq!(task.created_at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn task_rejects_garbage_timestamp() {
        let result: Result<Task, _> = serde_json::from_str(
            r#"{"id":3,"title":"a","completed":false,"created_at":"yesterday"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_task_trims_and_drops_blank_description() {
        let input = NewTask::normalized("  Buy milk ", Some("   ")).unwrap();
        assert_eq!(input.title, "Buy milk");
        assert!(input.description.is_none());
        assert_eq!(input.completed, Some(false));

        let input = NewTask::normalized("x", Some(" two litres ")).unwrap();
        assert_eq!(input.description.as_deref(), Some("two litres"));
    }

    #[test]
    fn new_task_rejects_blank_title() {
        for title in ["", "   ", "\t\n"] {
            let err = NewTask::normalized(title, None).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{title:?}");
        }
    }

    #[test]
    fn new_task_omits_absent_fields() {
        let input = NewTask {
            title: "t".to_string(),
            ..NewTask::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"title": "t"}));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"completed": true}));
    }

    #[test]
    fn patch_normalize_trims_title() {
        let patch = TaskPatch {
            title: Some("  New ".to_string()),
            ..TaskPatch::default()
        }
        .normalize()
        .unwrap();
        assert_eq!(patch.title.as_deref(), Some("New"));

        let err = TaskPatch {
            title: Some(" ".to_string()),
            ..TaskPatch::default()
        }
        .normalize()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
