//! In-memory task list kept consistent with the server.
//!
//! # Design
//! The controller owns the only mutable copy of the task list. Local state
//! changes only after the server has answered: single-task replies replace
//! the matching entry by id, list replies replace the whole collection, and
//! edits fall back to a full `refresh`. Nothing is mutated optimistically.
//!
//! User interaction (error notices, confirmation of destructive actions)
//! goes through the `Prompter` trait so the policy can run without a UI.
//! Overlapping calls are not serialized; the last reply for an id wins.
//!
//! Calls block while `&mut self` is held, so `is_loading()` only reads
//! `true` from inside a `refresh`; between calls it is always `false`.

use tracing::{debug, error, info, warn};

use crate::api::TaskApi;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{optional_text, required_title, NewTask, Task, TaskId, TaskPatch};

const LOAD_FAILED: &str = "Error loading tasks";
const CREATE_FAILED: &str = "Error creating task";
const UPDATE_FAILED: &str = "Error updating task";
const SAVE_FAILED: &str = "Error saving changes";
const TOGGLE_FAILED: &str = "Error changing status";
const DELETE_FAILED: &str = "Error deleting task";
const COMPLETE_ALL_FAILED: &str = "Error completing all tasks";
const DELETE_COMPLETED_FAILED: &str = "Error deleting completed tasks";

pub const CONFIRM_DELETE: &str = "Delete this task?";
pub const CONFIRM_COMPLETE_ALL: &str = "Mark every task as completed?";
pub const CONFIRM_DELETE_COMPLETED: &str = "Delete all completed tasks?";

/// Notification and confirmation capability supplied by the host.
pub trait Prompter {
    /// Show a blocking notice to the user.
    fn notify(&self, message: &str);

    /// Ask the user to approve a destructive action.
    fn confirm(&self, message: &str) -> bool;
}

impl<P: Prompter + ?Sized> Prompter for &P {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }

    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}

/// Which listing `refresh` loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    All,
    CompletedOnly,
}

pub struct TaskListController<T, P> {
    api: TaskApi<T>,
    prompter: P,
    tasks: Vec<Task>,
    loading: bool,
    last_error: Option<String>,
    view_mode: ViewMode,
}

impl<T: Transport, P: Prompter> TaskListController<T, P> {
    /// Starts empty; call `refresh` for the initial load.
    pub fn new(api: TaskApi<T>, prompter: P) -> Self {
        Self {
            api,
            prompter,
            tasks: Vec::new(),
            loading: false,
            last_error: None,
            view_mode: ViewMode::All,
        }
    }

    pub fn api(&self) -> &TaskApi<T> {
        &self.api
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Persistent error from the last failed load, cleared by the next one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn pending(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.completed).collect()
    }

    pub fn completed(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.completed).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Replace the whole list with the server's listing for the current
    /// view mode.
    ///
    /// A failure keeps the previous list and is recorded in `last_error`
    /// instead of being sent to the prompter.
    pub fn refresh(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        self.last_error = None;
        let result = match self.view_mode {
            ViewMode::All => self.api.list(),
            ViewMode::CompletedOnly => self.api.list_completed(),
        };
        self.loading = false;

        match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), view = ?self.view_mode, "tasks loaded");
                self.tasks = tasks;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "loading tasks failed");
                self.last_error = Some(format!("{LOAD_FAILED}: {e}"));
                Err(e)
            }
        }
    }

    /// Manual retry after a failed load.
    pub fn retry(&mut self) -> Result<(), ApiError> {
        self.refresh()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<(), ApiError> {
        self.view_mode = mode;
        self.refresh()
    }

    /// Create a pending task and show it first.
    ///
    /// Coming from the completed-only view switches back to the full list,
    /// since a new task is never completed. If that reload fails the new
    /// task stays at the front of the list it was prepended to.
    pub fn create_task(&mut self, title: &str, description: Option<&str>) -> Result<Task, ApiError> {
        let input = NewTask::normalized(title, description).map_err(|e| self.report(CREATE_FAILED, e))?;
        let task = self.api.create(&input).map_err(|e| self.report(CREATE_FAILED, e))?;
        info!(id = task.id, "task created");
        self.tasks.insert(0, task.clone());

        if self.view_mode == ViewMode::CompletedOnly {
            self.view_mode = ViewMode::All;
            if let Err(e) = self.refresh() {
                warn!(id = task.id, error = %e, "reload after create failed");
            }
        }
        Ok(task)
    }

    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task, ApiError> {
        let patch = patch.normalize().map_err(|e| self.report(UPDATE_FAILED, e))?;
        let task = self.api.update(id, &patch).map_err(|e| self.report(UPDATE_FAILED, e))?;
        self.replace_entry(task.clone());
        Ok(task)
    }

    /// Save an edited title and description, then reload everything.
    ///
    /// A blank description is sent as "unchanged", not as a clear.
    pub fn save_edits(&mut self, id: TaskId, title: &str, description: &str) -> Result<(), ApiError> {
        let title = required_title(title).map_err(|e| self.report(SAVE_FAILED, e))?;
        let patch = TaskPatch {
            title: Some(title),
            description: optional_text(Some(description)),
            completed: None,
        };
        self.api.update(id, &patch).map_err(|e| self.report(SAVE_FAILED, e))?;
        info!(id, "task edited");
        if let Err(e) = self.refresh() {
            warn!(id, error = %e, "reload after edit failed");
        }
        Ok(())
    }

    pub fn toggle_completion(&mut self, id: TaskId, currently_completed: bool) -> Result<Task, ApiError> {
        let result = if currently_completed {
            self.api.uncomplete(id)
        } else {
            self.api.complete(id)
        };
        let task = result.map_err(|e| self.report(TOGGLE_FAILED, e))?;
        self.replace_entry(task.clone());
        Ok(task)
    }

    /// Returns `Ok(false)` when the user declined.
    ///
    /// A 404 means the task is already gone, so the local copy is dropped
    /// without bothering the user.
    pub fn delete_task(&mut self, id: TaskId) -> Result<bool, ApiError> {
        if !self.prompter.confirm(CONFIRM_DELETE) {
            return Ok(false);
        }
        match self.api.delete(id) {
            Ok(()) => info!(id, "task deleted"),
            Err(e) if e.is_not_found() => warn!(id, "task already deleted on server"),
            Err(e) => return Err(self.report(DELETE_FAILED, e)),
        }
        self.tasks.retain(|t| t.id != id);
        Ok(true)
    }

    /// Returns `Ok(false)` when the user declined.
    pub fn mark_all_completed(&mut self) -> Result<bool, ApiError> {
        if !self.prompter.confirm(CONFIRM_COMPLETE_ALL) {
            return Ok(false);
        }
        let tasks = self
            .api
            .complete_all()
            .map_err(|e| self.report(COMPLETE_ALL_FAILED, e))?;
        info!(count = tasks.len(), "all tasks completed");
        self.tasks = tasks;
        Ok(true)
    }

    /// Returns `Ok(false)` when the user declined. The local list is pruned
    /// without another round trip.
    pub fn delete_all_completed(&mut self) -> Result<bool, ApiError> {
        if !self.prompter.confirm(CONFIRM_DELETE_COMPLETED) {
            return Ok(false);
        }
        self.api
            .delete_completed()
            .map_err(|e| self.report(DELETE_COMPLETED_FAILED, e))?;
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        info!(removed = before - self.tasks.len(), "completed tasks deleted");
        Ok(true)
    }

    fn replace_entry(&mut self, task: Task) {
        let id = task.id;
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => *slot = task,
            None => debug!(id, "updated task is not in the current view"),
        }
    }

    fn report(&self, context: &str, err: ApiError) -> ApiError {
        error!(error = %err, status = ?err.status(), "{context}");
        self.prompter.notify(&format!("{context}: {err}"));
        err
    }
}
