// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::TimeZone;
use common::Task;

// Weekday, month, zero-padded day, year: "Wed May 01 2024".
const DUE_DATE_FORMAT: &str = "%a %b %d %Y";

/// Builds the AI help prompt for `task`. The due-date line is omitted for
/// undated tasks and the day is taken in `tz`.
pub fn synthesize<Tz: TimeZone>(task: &Task, tz: &Tz) -> String {
    let due_line = task
        .due_day_in(tz)
        .map(|day| format!("\nDue Date: {}", day.format(DUE_DATE_FORMAT)))
        .unwrap_or_default();

    format!(
        "\nTask Title: {}\nTask Description: {}{}\n\nI need help with:\n",
        task.title, task.description, due_line
    )
    .trim()
    .to_string()
}
