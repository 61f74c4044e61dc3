//! Stateless HTTP request builder and response parser for the task API.
//!
//! # Design
//! `TodoClient` holds only the normalized collection URL and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Parsers are shared by payload shape: a single task, an
//! ordered list of tasks, or no content.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewTask, Task, TaskId, TaskPatch};

/// Path of the collection resource, appended to the configured base URL.
pub const COLLECTION_PATH: &str = "/api/todos";

/// Synchronous, stateless client for the task API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct TodoClient {
    collection_url: String,
}

impl TodoClient {
    /// `base_url` may be a bare host (`http://h`) or already point at the
    /// collection (`http://h/api/todos`); the collection path is appended
    /// at most once.
    pub fn new(base_url: &str) -> Self {
        Self {
            collection_url: collection_url(base_url),
        }
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    /// Absolute URL for an endpoint relative to the collection.
    pub fn endpoint(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            self.collection_url.clone()
        } else {
            format!("{}/{endpoint}", self.collection_url)
        }
    }

    pub fn build_list(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "")
    }

    pub fn build_list_completed(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "completed")
    }

    pub fn build_get(&self, id: TaskId) -> HttpRequest {
        self.bare(HttpMethod::Get, &id.to_string())
    }

    pub fn build_create(&self, input: &NewTask) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, "", input)
    }

    pub fn build_update(&self, id: TaskId, input: &TaskPatch) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, &id.to_string(), input)
    }

    pub fn build_delete(&self, id: TaskId) -> HttpRequest {
        self.bare(HttpMethod::Delete, &id.to_string())
    }

    pub fn build_complete(&self, id: TaskId) -> HttpRequest {
        self.bare(HttpMethod::Put, &format!("{id}/complete"))
    }

    pub fn build_uncomplete(&self, id: TaskId) -> HttpRequest {
        self.bare(HttpMethod::Put, &format!("{id}/uncomplete"))
    }

    pub fn build_complete_all(&self) -> HttpRequest {
        self.bare(HttpMethod::Put, "complete/all")
    }

    pub fn build_delete_completed(&self) -> HttpRequest {
        self.bare(HttpMethod::Delete, "completed")
    }

    /// Parse a response carrying an ordered list of tasks
    /// (`list`, `list_completed`, `complete_all`).
    pub fn parse_task_list(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        require_payload(decode(response)?)
    }

    /// Parse a response carrying a single task
    /// (`get`, `create`, `update`, `complete`, `uncomplete`).
    pub fn parse_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        require_payload(decode(response)?)
    }

    /// Parse a response expected to carry no payload
    /// (`delete`, `delete_completed`). Any body on a 2xx is ignored.
    pub fn parse_no_content(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn bare(&self, method: HttpMethod, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: self.endpoint(endpoint),
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json<B: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        input: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: self.endpoint(endpoint),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Normalize a configured base URL into the collection URL.
pub fn collection_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with(COLLECTION_PATH) {
        base.to_string()
    } else {
        format!("{base}{COLLECTION_PATH}")
    }
}

/// Decode a response into `T`, or `None` when a 2xx carries no body.
///
/// A 204 is never handed to the JSON parser.
pub fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<Option<T>, ApiError> {
    check_status(&response)?;
    if response.status == 204 || response.body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Human-readable message for a failed response.
///
/// A JSON body contributes `detail` (a string, or the `msg` entries of a
/// validation-error array) and then `message`. A non-JSON body contributes
/// its raw text. Otherwise the message is `Error <status>`.
pub fn error_message(status: u16, body: &str) -> String {
    let fallback = format!("Error {status}");
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => detail_message(&value)
            .or_else(|| non_empty(value.get("message").and_then(|m| m.as_str())))
            .unwrap_or(fallback),
        Err(_) => non_empty(Some(body.trim())).unwrap_or(fallback),
    }
}

fn detail_message(value: &serde_json::Value) -> Option<String> {
    match value.get("detail")? {
        serde_json::Value::String(s) => non_empty(Some(s.as_str())),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            non_empty(Some(msgs.join("; ").as_str()))
        }
        _ => None,
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = error_message(response.status, &response.body);
    if response.status == 404 {
        return Err(ApiError::NotFound { message });
    }
    Err(ApiError::Http {
        status: response.status,
        message,
    })
}

fn require_payload<T>(payload: Option<T>) -> Result<T, ApiError> {
    payload.ok_or_else(|| ApiError::Deserialization("response body is empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK_JSON: &str =
        r#"{"id":5,"title":"Test","description":null,"completed":false,"created_at":"2024-05-01T10:00:00Z"}"#;

    fn client() -> TodoClient {
        TodoClient::new("http://localhost:8000")
    }

    #[test]
    fn collection_path_is_appended_once() {
        assert_eq!(TodoClient::new("http://h").endpoint("/5"), "http://h/api/todos/5");
        assert_eq!(TodoClient::new("http://h/api/todos").endpoint("/5"), "http://h/api/todos/5");
        assert_eq!(TodoClient::new("http://h/api/todos/").endpoint("5"), "http://h/api/todos/5");
        assert_eq!(TodoClient::new("http://h//").collection_url(), "http://h/api/todos");
    }

    #[test]
    fn empty_endpoint_is_the_collection() {
        assert_eq!(client().endpoint(""), "http://localhost:8000/api/todos");
        assert_eq!(client().endpoint("/"), "http://localhost:8000/api/todos");
    }

    #[test]
    fn build_list_produces_correct_request() {
        let req = client().build_list();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/todos");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_bulk_requests_target_sub_resources() {
        let c = client();
        let req = c.build_list_completed();
        assert_eq!((req.method, req.url.as_str()), (HttpMethod::Get, "http://localhost:8000/api/todos/completed"));
        let req = c.build_complete_all();
        assert_eq!((req.method, req.url.as_str()), (HttpMethod::Put, "http://localhost:8000/api/todos/complete/all"));
        let req = c.build_delete_completed();
        assert_eq!((req.method, req.url.as_str()), (HttpMethod::Delete, "http://localhost:8000/api/todos/completed"));
    }

    #[test]
    fn build_completion_toggles() {
        let c = client();
        let req = c.build_complete(7);
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/todos/7/complete");
        assert!(req.body.is_none());
        let req = c.build_uncomplete(7);
        assert_eq!(req.url, "http://localhost:8000/api/todos/7/uncomplete");
    }

    #[test]
    fn build_create_produces_json_request() {
        let input = NewTask::normalized("Buy milk", None).unwrap();
        let req = client().build_create(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/todos");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Buy milk");
        assert_eq!(body["completed"], false);
        assert!(body.get("description").is_none());
    }

    #[test]
    fn build_update_sends_partial_body() {
        let patch = TaskPatch {
            title: Some("Updated".to_string()),
            ..TaskPatch::default()
        };
        let req = client().build_update(3, &patch).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/todos/3");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Updated"}));
    }

    #[test]
    fn build_get_and_delete_carry_no_body() {
        let req = client().build_get(5);
        assert_eq!(req.url, "http://localhost:8000/api/todos/5");
        let req = client().build_delete(5);
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_task_list_success() {
        let response = HttpResponse::new(200, format!("[{TASK_JSON}]"));
        let tasks = client().parse_task_list(response).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 5);
        assert_eq!(tasks[0].title, "Test");
    }

    #[test]
    fn parse_task_accepts_201() {
        let task = client().parse_task(HttpResponse::new(201, TASK_JSON)).unwrap();
        assert_eq!(task.id, 5);
    }

    #[test]
    fn parse_task_not_found_carries_detail() {
        let response = HttpResponse::new(404, r#"{"detail":"Task 9 not found"}"#);
        let err = client().parse_task(response).unwrap_err();
        assert_eq!(
            err,
            ApiError::NotFound {
                message: "Task 9 not found".to_string()
            }
        );
    }

    #[test]
    fn parse_server_error_keeps_status() {
        let err = client()
            .parse_task(HttpResponse::new(500, "internal error"))
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: "internal error".to_string()
            }
        );
    }

    #[test]
    fn no_content_decodes_to_none_without_parsing() {
        let decoded: Option<Task> = decode(HttpResponse::new(204, "not json at all")).unwrap();
        assert!(decoded.is_none());
        assert!(client().parse_no_content(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn typed_parser_rejects_missing_payload() {
        let err = client().parse_task(HttpResponse::new(204, "")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_task_list_bad_json() {
        let err = client()
            .parse_task_list(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn error_message_preference_order() {
        assert_eq!(error_message(400, r#"{"detail":"d","message":"m"}"#), "d");
        assert_eq!(error_message(400, r#"{"message":"m"}"#), "m");
        assert_eq!(error_message(400, r#"{"other":1}"#), "Error 400");
        assert_eq!(error_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(503, ""), "Error 503");
    }

    #[test]
    fn error_message_joins_validation_array() {
        let body = r#"{"detail":[{"loc":["body","title"],"msg":"field required"},{"msg":"too long"}]}"#;
        assert_eq!(error_message(422, body), "field required; too long");
    }
}
