//! Task triggers and the task-status polling loop.
//!
//! Publishing targets and signing metadata are asynchronous on the backend:
//! the trigger answers `202 Accepted` with a task id, and the console polls
//! `api/v1/task/?task_id=<id>` until the task reports `SUCCESS` or `FAILURE`.
//!
//! ```text
//! SUBMITTED -> (in-progress label)* -> SUCCESS | FAILURE
//! ```
//!
//! Only in-progress labels cause another poll. A non-200 answer, a missing
//! `data`/`state`, or a transport error ends the wait immediately.

use crate::api::client::{ApiClient, BackendResponse, RequestOptions};
use crate::error::{AppError, AppResult};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use rstuf_webui_types::{Endpoint, Envelope, TaskState, TaskSubmitted, Terminal};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed delay between two polls of an unfinished task.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Result of a task that reached `SUCCESS`.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub task_id: String,
    /// The full `data` object of the final poll
    pub payload: Value,
    /// Distinct state labels in the order they were first seen
    pub states: Vec<String>,
}

/// Polls the task endpoint until the task finishes.
#[derive(Debug, Clone)]
pub struct TaskPoller {
    client: ApiClient,
    interval: Duration,
}

impl TaskPoller {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for `task_id` to reach a terminal state.
    ///
    /// There is no attempt limit or deadline here; bound the wait with
    /// `tokio::time::timeout` or by cancelling `cancel`.
    pub async fn await_completion(
        &self,
        task_id: &str,
        headers: &HeaderMap,
        cancel: &CancellationToken,
    ) -> AppResult<TaskCompletion> {
        let query = [("task_id", task_id)];
        let mut states: Vec<String> = Vec::new();

        loop {
            let response = self
                .client
                .send(
                    Endpoint::Task.path(),
                    Method::GET,
                    RequestOptions {
                        query: Some(&query),
                        headers: Some(headers),
                        ..RequestOptions::default()
                    },
                )
                .await?;

            if response.status != StatusCode::OK {
                warn!(task_id, status = response.status.as_u16(), "Task poll rejected");
                return Err(AppError::UnexpectedResponse {
                    status: response.status,
                    body: response.body,
                });
            }

            let (state, data) = parse_poll(&response)?;
            if !states.iter().any(|seen| seen == state.label()) {
                states.push(state.label().to_string());
            }

            match state {
                TaskState::Terminal(Terminal::Success) => {
                    info!(task_id, states = ?states, "Task finished");
                    return Ok(TaskCompletion {
                        task_id: task_id.to_string(),
                        payload: data,
                        states,
                    });
                }
                TaskState::Terminal(Terminal::Failure) => {
                    warn!(task_id, states = ?states, "Task failed");
                    return Err(AppError::TaskFailed(response.body));
                }
                TaskState::InProgress(label) => {
                    debug!(task_id, state = %label, "Task still running");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(task_id, "Task wait cancelled");
                    return Err(AppError::Cancelled(task_id.to_string()));
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

fn parse_poll(response: &BackendResponse) -> AppResult<(TaskState, Value)> {
    let body = response.json_value()?;
    let data = match body.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => return Err(AppError::MissingData(response.body.clone())),
    };

    let label = data
        .get("state")
        .and_then(Value::as_str)
        .filter(|label| !label.is_empty())
        .ok_or_else(|| AppError::MissingState(response.body.clone()))?;

    Ok((TaskState::from_label(label), data))
}

impl ApiClient {
    /// Ask the backend to publish pending targets. Returns the task id.
    pub async fn publish_targets(&self, headers: &HeaderMap) -> AppResult<String> {
        self.trigger(Endpoint::PublishTargets, "publish targets", headers, None)
            .await
    }

    /// Submit a metadata signature. Returns the task id.
    pub async fn sign_metadata(&self, headers: &HeaderMap, payload: &Value) -> AppResult<String> {
        self.trigger(Endpoint::MetadataSign, "sign metadata", headers, Some(payload))
            .await
    }

    async fn trigger(
        &self,
        endpoint: Endpoint,
        action: &'static str,
        headers: &HeaderMap,
        payload: Option<&Value>,
    ) -> AppResult<String> {
        let response = self
            .send(
                endpoint.path(),
                Method::POST,
                RequestOptions {
                    json: payload,
                    headers: Some(headers),
                    ..RequestOptions::default()
                },
            )
            .await?;

        let task_id = if response.status == StatusCode::ACCEPTED {
            response
                .json::<Envelope<TaskSubmitted>>()
                .ok()
                .and_then(|envelope| envelope.data)
                .map(|data| data.task_id)
        } else {
            None
        };

        match task_id {
            Some(task_id) => {
                info!(action, task_id = %task_id, "Backend accepted task");
                Ok(task_id)
            }
            None => {
                warn!(action, status = response.status.as_u16(), "Backend refused task");
                Err(AppError::TriggerFailed {
                    action,
                    status: response.status,
                    body: response.body,
                })
            }
        }
    }
}
