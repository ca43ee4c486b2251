// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use common::{CreateTaskPayload, Task, TaskStatus, UpdateTaskPayload};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::api::TaskApi;
use crate::error::ApiError;
use crate::{calendar, filter};

pub const LOAD_ERROR: &str = "Failed to load tasks.";
pub const CREATE_ERROR: &str = "Failed to create task";
pub const UPDATE_ERROR: &str = "Failed to update task";
pub const DELETE_ERROR: &str = "Failed to delete task";

/// Everything the board knows at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
struct BoardState {
    // Last successful full fetch, in server order.
    tasks: Vec<Task>,
    selected_date: Option<NaiveDate>,
    // Number of collection fetches currently awaiting a response.
    in_flight: usize,
    error: Option<String>,
    // Bumped by logout so responses issued before it are dropped.
    session: u64,
}

struct Shared {
    api: Arc<dyn TaskApi>,
    state: RwLock<BoardState>,
    revision: watch::Sender<u64>,
}

/// Consistent copy of the board for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub tasks: Vec<Task>,
    /// Tasks for the selected day, or all tasks when nothing is selected.
    pub filtered: Vec<Task>,
    /// Tasks not yet completed.
    pub outstanding: Vec<Task>,
    pub selected_date: Option<NaiveDate>,
    pub loading: bool,
    pub error: Option<String>,
}

/// The task cache and its refresh controller.
///
/// `Board` is the only writer of the cached collection. Every mutation goes
/// to the backend first and is followed by a full refetch; nothing is
/// patched locally. Readers get a [`BoardView`].
///
/// Refreshes are neither queued nor deduplicated: when two overlap, the one
/// whose response lands last decides the cached collection.
#[derive(Clone)]
pub struct Board {
    shared: Arc<Shared>,
}

impl Board {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                api,
                state: RwLock::new(BoardState::default()),
                revision,
            }),
        }
    }

    /// Read-only handle for renderers.
    pub fn view(&self) -> BoardView {
        BoardView {
            shared: Arc::clone(&self.shared),
            revision: self.shared.revision.subscribe(),
        }
    }

    /// Initial load. Does nothing when the API holds no credential.
    pub async fn mount(&self) -> bool {
        if !self.shared.api.has_credential() {
            debug!("No credential available, skipping initial task load.");
            return false;
        }
        self.refresh().await
    }

    /// Replaces the cached collection with a fresh full fetch.
    ///
    /// On failure the previous collection is kept and the error flag is set.
    /// Returns whether the collection was replaced.
    pub async fn refresh(&self) -> bool {
        let session = self.mutate(|state| {
            state.in_flight += 1;
            state.session
        });

        let outcome = self.shared.api.list().await;

        self.mutate(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.session != session {
                debug!("Dropping task list fetched before logout.");
                return false;
            }
            match outcome {
                Ok(tasks) => {
                    info!("Task board refreshed with {} tasks.", tasks.len());
                    state.tasks = tasks;
                    state.error = None;
                    true
                }
                Err(err) => {
                    error!("Error fetching tasks: {}", err);
                    state.error = Some(LOAD_ERROR.to_string());
                    false
                }
            }
        })
    }

    pub async fn create(&self, payload: CreateTaskPayload) -> Result<Task, ApiError> {
        let created = self
            .shared
            .api
            .create(&payload)
            .await
            .map_err(|err| self.fail(CREATE_ERROR, err))?;
        self.refresh().await;
        Ok(created)
    }

    pub async fn update(&self, id: i64, payload: UpdateTaskPayload) -> Result<Task, ApiError> {
        let updated = self
            .shared
            .api
            .update(id, &payload)
            .await
            .map_err(|err| self.fail(UPDATE_ERROR, err))?;
        self.refresh().await;
        Ok(updated)
    }

    /// Moves a task to `status`. Completing a task also clears its description.
    pub async fn change_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> {
        self.update(id, UpdateTaskPayload::status_change(status)).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.shared
            .api
            .delete(id)
            .await
            .map_err(|err| self.fail(DELETE_ERROR, err))?;
        self.refresh().await;
        Ok(())
    }

    /// Blank creation form, due on the selected day if there is one.
    pub fn draft(&self) -> CreateTaskPayload {
        CreateTaskPayload {
            status: TaskStatus::Pending,
            due_date: self.shared.state.read().selected_date,
            ..CreateTaskPayload::default()
        }
    }

    /// Selects `day`, or clears the selection when `day` is already selected.
    pub fn select_date(&self, day: NaiveDate) {
        self.mutate(|state| {
            state.selected_date = match state.selected_date {
                Some(current) if current == day => None,
                _ => Some(day),
            };
        });
    }

    pub fn clear_selection(&self) {
        self.mutate(|state| state.selected_date = None);
    }

    /// Discards the cached collection, the selection and any error.
    ///
    /// Fetches still in flight are ignored when they land. Stopping the live
    /// listener is up to the caller.
    pub fn logout(&self) {
        self.mutate(|state| {
            state.tasks.clear();
            state.selected_date = None;
            state.error = None;
            state.session += 1;
        });
        info!("Task board cleared on logout.");
    }

    fn fail(&self, message: &str, err: ApiError) -> ApiError {
        error!("{}: {}", message, err);
        self.mutate(|state| state.error = Some(message.to_string()));
        err
    }

    // Applies `f` under the write lock, then wakes up every view.
    fn mutate<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        let result = {
            let mut state = self.shared.state.write();
            f(&mut *state)
        };
        self.shared
            .revision
            .send_modify(|revision| *revision = revision.wrapping_add(1));
        result
    }
}

/// Read-only access to the board, plus change notification.
///
/// Calendar days are taken in the viewer's local time zone.
#[derive(Clone)]
pub struct BoardView {
    shared: Arc<Shared>,
    revision: watch::Receiver<u64>,
}

impl BoardView {
    pub fn snapshot(&self) -> BoardSnapshot {
        let state = self.shared.state.read();
        BoardSnapshot {
            filtered: filter::derive(&state.tasks, state.selected_date, &Local),
            outstanding: filter::outstanding(&state.tasks),
            tasks: state.tasks.clone(),
            selected_date: state.selected_date,
            loading: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.shared.state.read().tasks.clone()
    }

    pub fn task(&self, id: i64) -> Option<Task> {
        self.shared
            .state
            .read()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
    }

    pub fn filtered(&self) -> Vec<Task> {
        let state = self.shared.state.read();
        filter::derive(&state.tasks, state.selected_date, &Local)
    }

    pub fn outstanding(&self) -> Vec<Task> {
        filter::outstanding(&self.shared.state.read().tasks)
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.shared.state.read().selected_date
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.read().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.read().error.clone()
    }

    /// Whether the calendar tile for `day` should be highlighted.
    pub fn is_flagged(&self, day: NaiveDate) -> bool {
        calendar::annotate(day, &self.shared.state.read().tasks, &Local)
    }

    pub fn flagged_days_in_month(&self, any_day: NaiveDate) -> BTreeSet<NaiveDate> {
        calendar::flagged_days_in_month(any_day, &self.shared.state.read().tasks, &Local)
    }

    /// Waits until the board changes after the last observed change.
    pub async fn changed(&mut self) {
        // The sender lives as long as `shared`, which this view keeps alive.
        let _ = self.revision.changed().await;
    }
}
