// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use common::Task;
use taskboard::config::ENV_TOKEN;
use taskboard::{
    Assistant, Board, BoardView, ClientConfig, HttpSuggestionService, HttpTaskApi, LiveUpdates,
};

/// Headless task board. Connection settings come from the `TASKBOARD_*`
/// environment variables.
#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Follow the shared task board")]
struct Cli {
    /// Defaults to `watch` with no day selected.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Log the board after every change until Ctrl-C.
    Watch {
        /// Day to select, as YYYY-MM-DD.
        day: Option<NaiveDate>,
    },
    /// Ask the assistant for help with one task.
    Suggest {
        /// ID of the task.
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the task board...");

    if let Err(e) = run().await {
        tracing::error!("{:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::from_env();
    if !config.is_authenticated() {
        bail!("Not logged in: set {} to your access token.", ENV_TOKEN);
    }
    tracing::info!("Using task API at {}", config.api_url);

    let board = Board::new(Arc::new(HttpTaskApi::new(&config)));

    match cli.command.unwrap_or(Command::Watch { day: None }) {
        Command::Watch { day } => watch(&config, board, day).await,
        Command::Suggest { id } => suggest(&config, board, id).await,
    }
}

/// Follows the board until Ctrl-C, logging it after every change.
async fn watch(config: &ClientConfig, board: Board, day: Option<NaiveDate>) -> Result<()> {
    board.mount().await;
    if let Some(day) = day {
        board.select_date(day);
    }

    let listener = LiveUpdates::new(config).spawn(board.clone());
    let mut view = board.view();
    log_board(&view);

    loop {
        tokio::select! {
            _ = view.changed() => log_board(&view),
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    listener.abort();
    board.logout();
    tracing::info!("Task board stopped.");
    Ok(())
}

async fn suggest(config: &ClientConfig, board: Board, id: i64) -> Result<()> {
    if !board.mount().await {
        bail!("Failed to load tasks.");
    }
    let task = board
        .view()
        .task(id)
        .with_context(|| format!("Task with ID {id} not found."))?;

    let mut assistant = Assistant::new(Arc::new(HttpSuggestionService::new(config)));
    assistant.ask_about(&task);
    println!("{}\n", assistant.prompt());

    assistant.submit().await;
    if let Some(error) = assistant.error() {
        bail!("{}", error);
    }
    println!("AI Suggestions:\n{}", assistant.suggestions().unwrap_or_default());
    Ok(())
}

fn log_board(view: &BoardView) {
    let snapshot = view.snapshot();

    if snapshot.loading {
        tracing::info!("Loading tasks...");
    }
    if let Some(error) = &snapshot.error {
        tracing::error!("{}", error);
    }

    tracing::info!("All not-completed tasks: {}", snapshot.outstanding.len());
    for task in &snapshot.outstanding {
        tracing::info!("  {}", describe(task));
    }

    let heading = snapshot
        .selected_date
        .map(|day| day.format("%a %b %d %Y").to_string())
        .unwrap_or_else(|| "All Dates".to_string());
    tracing::info!("Tasks for {}: {}", heading, snapshot.filtered.len());
    for task in &snapshot.filtered {
        tracing::info!("  {}", describe(task));
    }

    let month = snapshot
        .selected_date
        .unwrap_or_else(|| Local::now().date_naive());
    let flagged: Vec<String> = view
        .flagged_days_in_month(month)
        .iter()
        .map(|day| day.format("%d").to_string())
        .collect();
    tracing::info!(
        "Days with pending tasks in {}: [{}]",
        month.format("%B %Y"),
        flagged.join(", ")
    );
}

fn describe(task: &Task) -> String {
    let due = task
        .due_day_in(&Local)
        .map(|day| format!(" (due {})", day.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!("#{} [{}] {}{}", task.id, task.status, task.title, due)
}
