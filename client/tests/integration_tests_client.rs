use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Response,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use common::{CreateTaskPayload, SuggestRequest, Task, TaskStatus, UpdateTaskPayload};
use serde_json::{Value, json};
use taskboard::assistant::NO_SUGGESTIONS;
use taskboard::board::{CREATE_ERROR, LOAD_ERROR};
use taskboard::{
    ApiError, Assistant, Board, ClientConfig, HttpSuggestionService, HttpTaskApi, LiveUpdates,
    SuggestionService, TaskApi,
};
use tokio::sync::broadcast;

const TOKEN: &str = "test-token";

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

#[derive(Default)]
struct BackendState {
    tasks: Vec<Task>,
    next_id: i64,
    suggestion: Option<String>,
    prompts: Vec<String>,
}

/// In-process stand-in for the real backend: same routes, same JSON shapes.
#[derive(Clone)]
struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    events: broadcast::Sender<String>,
}

impl MockBackend {
    fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(Mutex::new(BackendState {
                next_id: 1,
                ..BackendState::default()
            })),
            events,
        }
    }

    /// Adds a task behind the client's back, as another user would.
    fn insert(&self, title: &str, status: TaskStatus, due: Option<NaiveDate>) -> Task {
        self.store(title, &format!("{title} details"), status, due)
    }

    fn store(
        &self,
        title: &str,
        description: &str,
        status: TaskStatus,
        due: Option<NaiveDate>,
    ) -> Task {
        let mut state = self.state.lock().unwrap();
        let task = Task {
            id: state.next_id,
            title: title.to_string(),
            description: description.to_string(),
            status,
            due_date: due.map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc()),
        };
        state.next_id += 1;
        state.tasks.push(task.clone());
        task
    }

    fn broadcast(&self, message: &str) {
        let _ = self.events.send(message.to_string());
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }
}

fn reject(code: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (code, Json(json!({ "error": message })))
}

fn authorize(headers: &HeaderMap) -> ApiResult<()> {
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        None => Err(reject(StatusCode::UNAUTHORIZED, "Missing token")),
        Some(TOKEN) => Ok(()),
        Some(_) => Err(reject(StatusCode::UNAUTHORIZED, "Invalid token")),
    }
}

async fn list_tasks(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Task>>> {
    authorize(&headers)?;
    Ok(Json(backend.state.lock().unwrap().tasks.clone()))
}

async fn create_task(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(payload): Json<CreateTaskPayload>,
) -> ApiResult<Json<Task>> {
    authorize(&headers)?;
    let Some(due) = payload.due_date else {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Invalid due date format. Please use YYYY-MM-DD",
        ));
    };
    let task = backend.store(&payload.title, &payload.description, payload.status, Some(due));
    backend.broadcast("A new task has been created!");
    Ok(Json(task))
}

async fn update_task(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskPayload>,
) -> ApiResult<Json<Task>> {
    authorize(&headers)?;
    let mut state = backend.state.lock().unwrap();
    let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
        return Err(reject(StatusCode::NOT_FOUND, "Task not found"));
    };
    // Like the real backend: text fields are overwritten, absent ones become
    // empty. Only the due date is left alone when it is not sent.
    task.title = payload.title.unwrap_or_default();
    task.description = payload.description.unwrap_or_default();
    task.status = payload.status.unwrap_or(TaskStatus::Unknown);
    if let Some(due) = payload.due_date {
        task.due_date = due.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    authorize(&headers)?;
    backend.state.lock().unwrap().tasks.retain(|t| t.id != id);
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn suggest(
    State(backend): State<MockBackend>,
    Json(request): Json<SuggestRequest>,
) -> Json<Value> {
    let mut state = backend.state.lock().unwrap();
    state.prompts.push(request.prompt);
    match &state.suggestion {
        Some(text) => Json(json!({ "suggestions": text })),
        None => Json(json!({})),
    }
}

async fn live(State(backend): State<MockBackend>, upgrade: WebSocketUpgrade) -> Response {
    // Subscribe before the upgrade so the test can see the listener is attached.
    let events = backend.events.subscribe();
    upgrade.on_upgrade(move |socket| push_events(socket, events))
}

async fn push_events(mut socket: WebSocket, mut events: broadcast::Receiver<String>) {
    while let Ok(event) = events.recv().await {
        if socket.send(Message::Text(event.into())).await.is_err() {
            break;
        }
    }
}

async fn spawn_backend(backend: MockBackend) -> String {
    let app = Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/ai/suggest", post(suggest))
        .route("/ws", get(live))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Board, config and backend wired together for one test.
async fn setup() -> (MockBackend, ClientConfig, Board) {
    let backend = MockBackend::new();
    let config = ClientConfig::for_api_url(&spawn_backend(backend.clone()).await).with_token(TOKEN);
    let board = Board::new(Arc::new(HttpTaskApi::new(&config)));
    (backend, config, board)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_create_and_list_tasks() {
    let (backend, _config, board) = setup().await;
    assert!(board.mount().await);
    assert!(board.view().tasks().is_empty());

    // Act: create through the board
    let created = board
        .create(CreateTaskPayload {
            title: "Buy milk".into(),
            description: "2%".into(),
            status: TaskStatus::Pending,
            due_date: Some(day(2024, 5, 1)),
        })
        .await
        .unwrap();

    // Assert: the refetched collection holds exactly what the server stored
    let tasks = board.view().tasks();
    assert_eq!(backend.len(), 1);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].description, "2%");
    assert_eq!(
        tasks[0].due_date.map(|d| d.date_naive()),
        Some(day(2024, 5, 1))
    );
    assert_eq!(board.view().error(), None);
}

#[tokio::test]
async fn test_status_change_and_delete_round_trip() {
    let (backend, _config, board) = setup().await;
    let first = backend.insert("Write report", TaskStatus::Pending, Some(day(2024, 5, 1)));
    let second = backend.insert("File taxes", TaskStatus::InProgress, None);
    board.mount().await;

    // Act: completing clears the description on the server
    board
        .change_status(first.id, TaskStatus::Completed)
        .await
        .unwrap();

    let view = board.view();
    let completed = view.task(first.id).unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.description, "");
    // The backend overwrites fields the payload leaves out.
    assert_eq!(completed.title, "");
    assert_eq!(completed.due_date, first.due_date);
    assert_eq!(view.outstanding(), vec![second.clone()]);

    // Act: delete the other task
    board.delete(second.id).await.unwrap();

    let remaining: Vec<i64> = view.tasks().iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec![first.id]);
}

#[tokio::test]
async fn test_title_only_update_keeps_board_loading() {
    // Arrange
    let (backend, _config, board) = setup().await;
    let task = backend.insert("Draft", TaskStatus::Pending, Some(day(2024, 5, 1)));
    board.mount().await;

    // Act: the backend stores an empty status for this payload
    board
        .update(
            task.id,
            UpdateTaskPayload {
                title: Some("Renamed".into()),
                ..UpdateTaskPayload::default()
            },
        )
        .await
        .unwrap();

    // Assert: the refetch still succeeds and the odd task does not flag its day
    let view = board.view();
    let renamed = view.task(task.id).unwrap();
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.status, TaskStatus::Unknown);
    assert_eq!(view.error(), None);
    assert!(!view.is_flagged(day(2024, 5, 1)));
    assert!(board.refresh().await);
}

#[tokio::test]
async fn test_rejected_create_keeps_cache() {
    let (backend, _config, board) = setup().await;
    backend.insert("Existing", TaskStatus::Pending, None);
    board.mount().await;
    let before = board.view().tasks();

    // The backend requires a due date.
    let err = board
        .create(CreateTaskPayload {
            title: "Undated".into(),
            ..board.draft()
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Rejected { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Invalid due date format. Please use YYYY-MM-DD");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(board.view().tasks(), before);
    assert_eq!(board.view().error().as_deref(), Some(CREATE_ERROR));
}

#[tokio::test]
async fn test_unknown_task_update_is_rejected() {
    let (_backend, config, _board) = setup().await;
    let api = HttpTaskApi::new(&config);

    let err = api
        .update(404, &UpdateTaskPayload::status_change(TaskStatus::Completed))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_bad_credential_is_rejected_not_transport() {
    let (backend, config, _board) = setup().await;
    backend.insert("Secret", TaskStatus::Pending, None);
    let api = HttpTaskApi::new(&config.clone().with_token("forged"));

    let err = api.list().await.unwrap_err();

    assert!(err.is_rejected());
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(err.to_string().contains("Invalid token"));

    let board = Board::new(Arc::new(api));
    assert!(!board.refresh().await);
    assert!(board.view().tasks().is_empty());
    assert_eq!(board.view().error().as_deref(), Some(LOAD_ERROR));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::for_api_url(&format!("http://127.0.0.1:{port}")).with_token(TOKEN);

    let err = HttpTaskApi::new(&config).list().await.unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_push_notification_triggers_refresh() {
    // Arrange
    let (backend, mut config, board) = setup().await;
    config.reconnect_interval = Duration::from_millis(20);
    board.mount().await;
    let mut view = board.view();
    let listener = LiveUpdates::new(&config).spawn(board.clone());

    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.events.receiver_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("live listener never connected");

    // Act: another client changes the data and the server pushes a bare signal
    let added = backend.insert("From elsewhere", TaskStatus::Pending, None);
    backend.broadcast("something changed");

    // Assert
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.tasks().is_empty() {
            view.changed().await;
        }
    })
    .await
    .expect("push notification did not refresh the board");
    assert_eq!(view.tasks(), vec![added]);

    listener.abort();
}

#[tokio::test]
async fn test_suggestion_service_and_assistant() {
    let (backend, config, _board) = setup().await;
    let service = Arc::new(HttpSuggestionService::new(&config));

    // Nothing to suggest yet.
    let err = service.suggest("anything").await.unwrap_err();
    assert!(matches!(err, ApiError::Empty));

    let mut assistant = Assistant::new(service.clone());
    assistant.set_prompt("How do I start?");
    assistant.submit().await;
    assert_eq!(assistant.suggestions(), Some(NO_SUGGESTIONS));

    backend.state.lock().unwrap().suggestion = Some("Start small.".into());
    assistant.submit().await;
    assert_eq!(assistant.suggestions(), Some("Start small."));
    assert_eq!(assistant.error(), None);
    assert_eq!(
        backend.state.lock().unwrap().prompts.last().map(String::as_str),
        Some("How do I start?")
    );
}
