use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Id of the seeded "not completed" status.
pub const NOT_COMPLETED_TASK_STATUS_ID: i32 = 1;
/// Id of the seeded "completed" status.
pub const COMPLETED_TASK_STATUS_ID: i32 = 2;

/// An entry of the task status classifier (`cl_task_status`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: i32,
    pub name: String,
}

/// Input structure for creating or fully updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Between 5 and 255 characters.
    #[validate(length(min = 5, max = 255))]
    pub title: String,

    /// At least 5 characters.
    #[validate(length(min = 5))]
    pub description: String,

    /// Id from the task status classifier.
    pub task_status_id: i32,

    /// Optional deadline.
    pub complete_before: Option<DateTime<Utc>>,

    /// When the task was completed. Filled in automatically on completion
    /// if left empty.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Body of a status-only update.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusUpdate {
    pub task_status_id: i32,
}

/// A task row joined with its status name.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_status_id: i32,
    pub task_status_name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub complete_before: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A task as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub complete_before: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            task_status: TaskStatus {
                id: row.task_status_id,
                name: row.task_status_name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            complete_before: row.complete_before,
            completed_at: row.completed_at,
        }
    }
}

/// Decides `completed_at` for an update.
///
/// Moving a task from "not completed" to "completed" without an explicit
/// completion time stamps it with `now`; otherwise the requested value wins.
pub fn completion_time(
    current_status_id: i32,
    new_status_id: i32,
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if requested.is_none()
        && current_status_id == NOT_COMPLETED_TASK_STATUS_ID
        && new_status_id == COMPLETED_TASK_STATUS_ID
    {
        Some(now)
    } else {
        requested
    }
}

/// Columns a task list may be sorted by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    CreatedAt,
    UpdatedAt,
    CompleteBefore,
    CompletedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Title => "t.title",
            SortField::CreatedAt => "t.created_at",
            SortField::UpdatedAt => "t.updated_at",
            SortField::CompleteBefore => "t.complete_before",
            SortField::CompletedAt => "t.completed_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

fn default_limit() -> i64 {
    10
}

/// Query parameters for listing the caller's tasks.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskQuery {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub task_status_id: Option<i32>,
    pub sort_field: Option<SortField>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

/// One page of tasks plus the total number matching the filters.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedTasks {
    pub count: i64,
    pub results: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input(title: &str, description: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: description.to_string(),
            task_status_id: NOT_COMPLETED_TASK_STATUS_ID,
            complete_before: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_task_validation() {
        assert!(input("Valid Task", "Valid Description").validate().is_ok());
        assert!(input("Tiny", "Valid Description").validate().is_err());
        assert!(input(&"a".repeat(256), "Valid Description").validate().is_err());
        assert!(input("Valid Task", "shrt").validate().is_err());
    }

    #[test]
    fn test_completion_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 4, 30, 9, 0, 0).unwrap();

        assert_eq!(
            completion_time(NOT_COMPLETED_TASK_STATUS_ID, COMPLETED_TASK_STATUS_ID, None, now),
            Some(now)
        );
        assert_eq!(
            completion_time(
                NOT_COMPLETED_TASK_STATUS_ID,
                COMPLETED_TASK_STATUS_ID,
                Some(earlier),
                now
            ),
            Some(earlier)
        );
        assert_eq!(
            completion_time(COMPLETED_TASK_STATUS_ID, COMPLETED_TASK_STATUS_ID, None, now),
            None
        );
        assert_eq!(
            completion_time(NOT_COMPLETED_TASK_STATUS_ID, NOT_COMPLETED_TASK_STATUS_ID, None, now),
            None
        );
    }

    #[test]
    fn test_task_query_defaults() {
        let query: TaskQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 0);
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert!(query.validate().is_ok());

        let query: TaskQuery =
            serde_json::from_str(r#"{"limit": 101, "sort_field": "created_at", "sort_direction": "asc"}"#)
                .unwrap();
        assert_eq!(query.sort_field, Some(SortField::CreatedAt));
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        let parsed = serde_json::from_str::<TaskQuery>(r#"{"sort_field": "password_hash"}"#);
        assert!(parsed.is_err());
    }
}
