// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task as the backend returns it.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from JSON. The backend
///    speaks PascalCase keys (`ID`, `Title`, ...), hence the renames.
/// - `Debug`: Enables displaying the structure for debugging.
/// - `Clone`, `PartialEq`: The board hands out value copies and tests compare them.
///
/// Backend-only fields (`CreatedBy`, `AssignedTo`, `CreatedAt`) are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Title", default)]
    pub title: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Status")]
    pub status: TaskStatus,

    // The backend stores a date column but ships it as a full timestamp.
    // An absent, empty or zero timestamp means "no due date".
    #[serde(
        rename = "DueDate",
        default,
        with = "wire::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Calendar day of the due date as seen from `tz`.
    pub fn due_day_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.due_date.map(|due| due.with_timezone(tz).date_naive())
    }

    /// True when the task has a due date falling on `day` in `tz`.
    pub fn is_due_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> bool {
        self.due_day_in(tz) == Some(day)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Lifecycle state of a task.
///
/// The backend spells the middle state `"in progress"`; `"in-progress"` is
/// accepted as well. The backend stores whatever string it is sent, so any
/// other spelling decodes to `Unknown` instead of failing the whole list.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "String")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "")]
    Unknown,
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "pending" => TaskStatus::Pending,
            "in progress" | "in-progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Unknown,
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Unknown => "",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/tasks`.
/// Kept separate from `Task` because the server assigns the ID and expects
/// the due date as a bare `YYYY-MM-DD` string (empty when unset).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateTaskPayload {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Status")]
    pub status: TaskStatus,

    #[serde(rename = "DueDate", default, with = "wire::day")]
    pub due_date: Option<NaiveDate>,
}

/// Body of `PUT /api/tasks/{id}`. Only the fields that are set go on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateTaskPayload {
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(
        rename = "DueDate",
        default,
        with = "wire::day",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl UpdateTaskPayload {
    /// Payload for a status change. Completing a task also clears its description.
    pub fn status_change(status: TaskStatus) -> Self {
        let description = match status {
            TaskStatus::Completed => Some(String::new()),
            _ => None,
        };
        Self {
            status: Some(status),
            description,
            ..Self::default()
        }
    }
}

/// Body of `POST /api/ai/suggest`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub prompt: String,
}

/// Reply of `POST /api/ai/suggest`. `suggestions` may be missing or blank.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Option<String>,
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Serde adapters for the backend's date conventions.
pub mod wire {
    /// Full timestamps, tolerant of the shapes the backend emits.
    pub mod timestamp {
        use chrono::{DateTime, Datelike, NaiveDate, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            let raw = match raw.as_deref().map(str::trim) {
                None | Some("") => return Ok(None),
                Some(raw) => raw,
            };

            let parsed = match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(_) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| D::Error::custom(format!("invalid due date {raw:?}: {e}")))?
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| D::Error::custom("invalid midnight"))?
                    .and_utc(),
            };

            // Zero value of the backend's time type.
            if parsed.year() <= 1 {
                return Ok(None);
            }
            Ok(Some(parsed))
        }
    }

    /// Bare `YYYY-MM-DD` days; `None` travels as the empty string.
    pub mod day {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        const FORMAT: &str = "%Y-%m-%d";

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(day) => serializer.serialize_str(&day.format(FORMAT).to_string()),
                None => serializer.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)?.as_deref() {
                None | Some("") => Ok(None),
                Some(raw) => NaiveDate::parse_from_str(raw, FORMAT)
                    .map(Some)
                    .map_err(|_| {
                        D::Error::custom("Invalid due date format. Please use YYYY-MM-DD")
                    }),
            }
        }
    }
}
