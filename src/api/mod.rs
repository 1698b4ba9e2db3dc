//! Typed client for the remote task service.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{Attachment, PendingUpload, Task, TaskDraft, TaskStatus};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/api/v1";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("task {0} not found")]
    NotFound(i64),
    #[error("{detail} (HTTP {status})")]
    Request { status: u16, detail: String },
    #[error("cannot read attachment {name}: {source}")]
    AttachmentRead {
        name: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Validation(String),
}

/// Error body shape of the task service: `detail` plus an optional list of
/// field-level entries.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

fn error_detail(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(detail) = parsed.detail
            && !detail.trim().is_empty()
        {
            return detail;
        }
        if !parsed.errors.is_empty() {
            return parsed
                .errors
                .iter()
                .map(|item| {
                    let loc = item
                        .loc
                        .iter()
                        .map(|part| part.to_string().trim_matches('"').to_string())
                        .collect::<Vec<_>>()
                        .join(".");
                    if loc.is_empty() {
                        item.msg.clone()
                    } else {
                        format!("{loc}: {}", item.msg)
                    }
                })
                .collect::<Vec<_>>()
                .join("; ");
        }
    }
    format!("request failed with HTTP {status}")
}

fn error_from_response(status: u16, body: &str, task_id: Option<i64>) -> ApiError {
    if status == 404
        && let Some(task_id) = task_id
    {
        return ApiError::NotFound(task_id);
    }
    ApiError::Request {
        status,
        detail: error_detail(status, body),
    }
}

/// Remote task operations. `list_open` and `list_closed` are derived from
/// `list_by_status`, so fakes only implement the four primitives.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError>;

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError>;

    async fn list_by_status(
        &self,
        status: TaskStatus,
        search: &str,
    ) -> Result<Vec<Task>, ApiError>;

    /// Commits staged files one request at a time. Zero files resolves to an
    /// empty sequence without touching the network. All-or-nothing: the first
    /// failure fails the whole call and no attachments are returned.
    async fn upload_attachments(
        &self,
        task_id: i64,
        files: &[PendingUpload],
    ) -> Result<Vec<Attachment>, ApiError>;

    /// Union of `new` and `in_progress`, fetched concurrently and joined:
    /// if either sub-query fails the whole operation fails.
    async fn list_open(&self, search: &str) -> Result<Vec<Task>, ApiError> {
        let (new_tasks, in_progress) = tokio::try_join!(
            self.list_by_status(TaskStatus::New, search),
            self.list_by_status(TaskStatus::InProgress, search),
        )?;
        Ok(merge_open_tasks(new_tasks, in_progress))
    }

    async fn list_closed(&self, search: &str) -> Result<Vec<Task>, ApiError> {
        self.list_by_status(TaskStatus::Done, search).await
    }
}

/// Most recently updated first; the stable sort keeps the per-status fetch
/// order for equal timestamps (`new` results ahead of `in_progress`).
pub fn merge_open_tasks(new_tasks: Vec<Task>, in_progress: Vec<Task>) -> Vec<Task> {
    let mut merged = new_tasks;
    merged.extend(in_progress);
    merged.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
    merged
}

fn list_path(status: TaskStatus, search: &str) -> String {
    let mut path = format!("/tasks/?status={}", status.as_str());
    let trimmed = search.trim();
    if !trimmed.is_empty() {
        path.push_str("&title=");
        path.push_str(&urlencoding::encode(trimmed));
    }
    path
}

#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTaskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn attachment_url(&self, attachment_id: i64) -> String {
        format!("{}/tasks/files/{attachment_id}", self.base_url)
    }

    /// The server omits attachment URLs; derive them from the id.
    fn finalize_task(&self, mut task: Task) -> Task {
        for file in &mut task.files {
            file.url = self.attachment_url(file.id);
        }
        task
    }

    async fn fail(response: reqwest::Response, task_id: Option<i64>) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error_from_response(status, &body, task_id)
    }
}

#[async_trait]
impl TaskService for HttpTaskClient {
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let response = self
            .client
            .post(self.url("/tasks/"))
            .json(draft)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, None).await);
        }
        let task: Task = response.json().await?;
        debug!(task_id = task.id, "task created");
        Ok(self.finalize_task(task))
    }

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{task_id}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, Some(task_id)).await);
        }
        let task: Task = response.json().await?;
        Ok(self.finalize_task(task))
    }

    async fn list_by_status(
        &self,
        status: TaskStatus,
        search: &str,
    ) -> Result<Vec<Task>, ApiError> {
        let response = self
            .client
            .get(self.url(&list_path(status, search)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, None).await);
        }
        let tasks: Vec<Task> = response.json().await?;
        debug!(status = status.as_str(), count = tasks.len(), "listed tasks");
        Ok(tasks
            .into_iter()
            .map(|task| self.finalize_task(task))
            .collect())
    }

    async fn upload_attachments(
        &self,
        task_id: i64,
        files: &[PendingUpload],
    ) -> Result<Vec<Attachment>, ApiError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let bytes =
                tokio::fs::read(&file.path)
                    .await
                    .map_err(|source| ApiError::AttachmentRead {
                        name: file.name.clone(),
                        source,
                    })?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file.name.clone());
            let form = reqwest::multipart::Form::new().part("file", part);

            let response = self
                .client
                .post(self.url(&format!("/tasks/{task_id}/files/")))
                .multipart(form)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::fail(response, None).await);
            }
            let mut attachment: Attachment = response.json().await?;
            attachment.url = self.attachment_url(attachment.id);
            debug!(
                task_id,
                attachment_id = attachment.id,
                name = %attachment.filename,
                "attachment committed"
            );
            uploaded.push(attachment);
        }
        Ok(uploaded)
    }
}
