// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client side of the task board: a cached task collection kept in sync with
//! the backend by write-then-refetch and server push invalidation.
pub mod api;
pub mod assistant;
pub mod board;
pub mod calendar;
pub mod config;
pub mod error;
pub mod filter;
pub mod live;
pub mod prompt;

pub use api::{HttpTaskApi, TaskApi};
pub use assistant::{Assistant, HttpSuggestionService, SuggestionService};
pub use board::{Board, BoardSnapshot, BoardView};
pub use config::ClientConfig;
pub use error::ApiError;
pub use live::LiveUpdates;
