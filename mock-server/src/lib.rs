use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Todos are kept newest-first, the order every listing returns.
#[derive(Default)]
pub struct Store {
    todos: Vec<Todo>,
    last_id: i64,
}

impl Store {
    fn find_mut(&mut self, id: i64) -> Result<&mut Todo, ApiFailure> {
        self.todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ApiFailure::not_found(id))
    }
}

pub type Db = Arc<RwLock<Store>>;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Error reply with a `{"detail": ...}` body. `detail` is a string, or a
/// list of `{loc, msg, type}` entries for field validation errors.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    detail: serde_json::Value,
}

impl ApiFailure {
    fn bad_request(detail: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: json!(detail),
        }
    }

    fn not_found(id: i64) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: json!(format!("Task with id {id} not found")),
        }
    }

    fn too_long(field: &str, max: usize) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: json!([{
                "loc": ["body", field],
                "msg": format!("{field} must be at most {max} characters"),
                "type": "string_too_long",
            }]),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/completed", get(list_completed).delete(delete_completed))
        .route("/api/todos/complete/all", put(complete_all))
        .route("/api/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/api/todos/{id}/complete", put(complete_todo))
        .route("/api/todos/{id}/uncomplete", put(uncomplete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiFailure> {
    if value.chars().count() > max {
        return Err(ApiFailure::too_long(field, max));
    }
    Ok(())
}

fn clean_title(title: &str) -> Result<String, ApiFailure> {
    check_length("title", title, MAX_TITLE_CHARS)?;
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiFailure::bad_request("title is required"));
    }
    Ok(title.to_string())
}

fn clean_description(description: Option<String>) -> Result<Option<String>, ApiFailure> {
    if let Some(d) = &description {
        check_length("description", d, MAX_DESCRIPTION_CHARS)?;
    }
    Ok(description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty()))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Todo API" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    Json(db.read().await.todos.clone())
}

async fn list_completed(State(db): State<Db>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    Json(store.todos.iter().filter(|t| t.completed).cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiFailure> {
    let title = clean_title(&input.title)?;
    let description = clean_description(input.description)?;
    let mut store = db.write().await;
    store.last_id += 1;
    let todo = Todo {
        id: store.last_id,
        title,
        description,
        completed: input.completed.unwrap_or(false),
        created_at: Utc::now(),
    };
    store.todos.insert(0, todo.clone());
    info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiFailure> {
    let store = db.read().await;
    store
        .todos
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found(id))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiFailure> {
    let title = input.title.as_deref().map(clean_title).transpose()?;
    let description_set = input.description.is_some();
    let description = clean_description(input.description)?;

    let mut store = db.write().await;
    let todo = store.find_mut(id)?;
    if let Some(title) = title {
        todo.title = title;
    }
    if description_set {
        todo.description = description;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    info!(id, "todo updated");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let before = store.todos.len();
    store.todos.retain(|t| t.id != id);
    if store.todos.len() == before {
        return Err(ApiFailure::not_found(id));
    }
    info!(id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn complete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiFailure> {
    set_completed(db, id, true).await
}

async fn uncomplete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiFailure> {
    set_completed(db, id, false).await
}

async fn set_completed(db: Db, id: i64, completed: bool) -> Result<Json<Todo>, ApiFailure> {
    let mut store = db.write().await;
    let todo = store.find_mut(id)?;
    todo.completed = completed;
    info!(id, completed, "todo status changed");
    Ok(Json(todo.clone()))
}

async fn complete_all(State(db): State<Db>) -> Json<Vec<Todo>> {
    let mut store = db.write().await;
    for todo in store.todos.iter_mut() {
        todo.completed = true;
    }
    info!(count = store.todos.len(), "all todos completed");
    Json(store.todos.clone())
}

async fn delete_completed(State(db): State<Db>) -> StatusCode {
    let mut store = db.write().await;
    let before = store.todos.len();
    store.todos.retain(|t| !t.completed);
    info!(removed = before - store.todos.len(), "completed todos deleted");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_to_json() {
        let todo = Todo {
            id: 1,
            title: "Test".to_string(),
            description: None,
            completed: false,
            created_at: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Test");
        assert!(json["description"].is_null());
        assert_eq!(json["completed"], false);
        assert_eq!(json["created_at"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn create_todo_optional_fields_default() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No extras"}"#).unwrap();
        assert_eq!(input.title, "No extras");
        assert!(input.description.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.description.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn titles_are_trimmed_and_required() {
        assert_eq!(clean_title("  Walk dog ").unwrap(), "Walk dog");
        let err = clean_title("   ").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(clean_description(Some("  ".to_string())).unwrap(), None);
        assert_eq!(clean_description(Some(" x ".to_string())).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn length_limits_are_inclusive() {
        assert!(clean_title(&"t".repeat(MAX_TITLE_CHARS)).is_ok());
        let err = clean_title(&"t".repeat(MAX_TITLE_CHARS + 1)).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail[0]["loc"][1], "title");

        assert!(clean_description(Some("d".repeat(MAX_DESCRIPTION_CHARS))).is_ok());
        let err = clean_description(Some("d".repeat(MAX_DESCRIPTION_CHARS + 1))).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        assert!(clean_title(&"é".repeat(MAX_TITLE_CHARS)).is_ok());
    }
}
