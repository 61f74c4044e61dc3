//! `TodoClient` paired with a `Transport`: one method per remote operation.
//!
//! Every call is independent and is never retried. `create`, `delete`,
//! `complete_all` and `delete_completed` are not safe to repeat blindly.

use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{NewTask, Task, TaskId, TaskPatch};

pub struct TaskApi<T> {
    client: TodoClient,
    transport: T,
}

impl TaskApi<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(TodoClient::new(&config.base_url), UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> TaskApi<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.send(self.client.build_list())?;
        self.client.parse_task_list(response)
    }

    pub fn list_completed(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.send(self.client.build_list_completed())?;
        self.client.parse_task_list(response)
    }

    pub fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        let response = self.send(self.client.build_get(id))?;
        self.client.parse_task(response)
    }

    pub fn create(&self, input: &NewTask) -> Result<Task, ApiError> {
        let response = self.send(self.client.build_create(input)?)?;
        self.client.parse_task(response)
    }

    pub fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let response = self.send(self.client.build_update(id, patch)?)?;
        self.client.parse_task(response)
    }

    pub fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete(id))?;
        self.client.parse_no_content(response)
    }

    pub fn complete(&self, id: TaskId) -> Result<Task, ApiError> {
        let response = self.send(self.client.build_complete(id))?;
        self.client.parse_task(response)
    }

    pub fn uncomplete(&self, id: TaskId) -> Result<Task, ApiError> {
        let response = self.send(self.client.build_uncomplete(id))?;
        self.client.parse_task(response)
    }

    pub fn complete_all(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.send(self.client.build_complete_all())?;
        self.client.parse_task_list(response)
    }

    pub fn delete_completed(&self) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete_completed())?;
        self.client.parse_no_content(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "sending request");
        match self.transport.execute(request) {
            Ok(response) => {
                debug!(%method, %url, status = response.status, "received response");
                if !response.is_success() {
                    warn!(%method, %url, status = response.status, "request rejected");
                }
                Ok(response)
            }
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                Err(e)
            }
        }
    }
}
