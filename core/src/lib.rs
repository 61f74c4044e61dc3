//! Blocking client core and task-list controller for the todo service.
//!
//! # Overview
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network. A `Transport` executes the round-trip,
//! `TaskApi` stitches the two together, and `TaskListController` keeps an
//! in-memory task list consistent with the server's replies.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only the collection URL.
//! - The base URL is passed in explicitly (see `ClientConfig`), so tests
//!   can point clients anywhere.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::TaskApi;
pub use client::{TodoClient, COLLECTION_PATH};
pub use config::ClientConfig;
pub use controller::{Prompter, TaskListController, ViewMode};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{NewTask, Task, TaskId, TaskPatch};
