// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;

use chrono::{Datelike, Months, NaiveDate, TimeZone};
use common::Task;

/// Whether a calendar tile for `day` should be highlighted: at least one
/// pending task is due that day. In-progress and completed tasks never flag.
pub fn annotate<Tz: TimeZone>(day: NaiveDate, tasks: &[Task], tz: &Tz) -> bool {
    tasks
        .iter()
        .any(|task| task.is_pending() && task.is_due_on(day, tz))
}

/// Flagged days of the month containing `any_day`.
pub fn flagged_days_in_month<Tz: TimeZone>(
    any_day: NaiveDate,
    tasks: &[Task],
    tz: &Tz,
) -> BTreeSet<NaiveDate> {
    let Some(first) = any_day.with_day(1) else {
        return BTreeSet::new();
    };
    let next_month = first.checked_add_months(Months::new(1));

    first
        .iter_days()
        .take_while(|day| Some(*day) != next_month)
        .filter(|day| annotate(*day, tasks, tz))
        .collect()
}
