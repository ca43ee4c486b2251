// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{NaiveDate, TimeZone};
use common::Task;

/// Tasks relevant to the selected calendar day.
///
/// With no selection the whole collection comes back unchanged. With a
/// selection, only tasks whose due date falls on that day in `tz` are kept;
/// undated tasks drop out. Collection order is preserved.
pub fn derive<Tz: TimeZone>(tasks: &[Task], selected: Option<NaiveDate>, tz: &Tz) -> Vec<Task> {
    match selected {
        None => tasks.to_vec(),
        Some(day) => tasks
            .iter()
            .filter(|task| task.is_due_on(day, tz))
            .cloned()
            .collect(),
    }
}

/// Tasks still open, for the "not completed" panel.
pub fn outstanding(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| !task.is_completed())
        .cloned()
        .collect()
}
