//! Test doubles shared by the app-layer unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{ApiError, TaskService};
use crate::types::{Attachment, PendingUpload, Task, TaskDraft, TaskStatus};

pub(crate) fn sample_task(id: i64, status: TaskStatus) -> Task {
    Task {
        id,
        title: format!("task {id}"),
        description: format!("description of task {id}"),
        project: "HD".to_string(),
        organisation: "Clinic 17".to_string(),
        status,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
        files: Vec::new(),
    }
}

/// Scripted `TaskService`: queue responses up front, inspect recorded calls
/// afterwards. Queues running dry fail the test via `expect`.
#[derive(Debug, Default)]
pub(crate) struct FakeTaskService {
    create_results: Mutex<VecDeque<Result<Task, ApiError>>>,
    get_results: Mutex<VecDeque<Result<Task, ApiError>>>,
    list_results: Mutex<VecDeque<Result<Vec<Task>, ApiError>>>,
    upload_results: Mutex<VecDeque<Result<Vec<Attachment>, ApiError>>>,
    create_calls: Mutex<Vec<TaskDraft>>,
    get_calls: Mutex<Vec<i64>>,
    list_calls: Mutex<Vec<(TaskStatus, String)>>,
    upload_calls: Mutex<Vec<(i64, usize)>>,
}

impl FakeTaskService {
    pub(crate) fn queue_create(&self, result: Result<Task, ApiError>) {
        self.create_results
            .lock()
            .expect("create queue mutex should not be poisoned")
            .push_back(result);
    }

    pub(crate) fn queue_get(&self, result: Result<Task, ApiError>) {
        self.get_results
            .lock()
            .expect("get queue mutex should not be poisoned")
            .push_back(result);
    }

    pub(crate) fn queue_list(&self, result: Result<Vec<Task>, ApiError>) {
        self.list_results
            .lock()
            .expect("list queue mutex should not be poisoned")
            .push_back(result);
    }

    pub(crate) fn queue_upload(&self, result: Result<Vec<Attachment>, ApiError>) {
        self.upload_results
            .lock()
            .expect("upload queue mutex should not be poisoned")
            .push_back(result);
    }

    pub(crate) fn create_calls(&self) -> Vec<TaskDraft> {
        self.create_calls
            .lock()
            .expect("create calls mutex should not be poisoned")
            .clone()
    }

    pub(crate) fn get_calls(&self) -> Vec<i64> {
        self.get_calls
            .lock()
            .expect("get calls mutex should not be poisoned")
            .clone()
    }

    pub(crate) fn list_calls(&self) -> Vec<(TaskStatus, String)> {
        self.list_calls
            .lock()
            .expect("list calls mutex should not be poisoned")
            .clone()
    }

    pub(crate) fn upload_calls(&self) -> Vec<(i64, usize)> {
        self.upload_calls
            .lock()
            .expect("upload calls mutex should not be poisoned")
            .clone()
    }
}

#[async_trait]
impl TaskService for FakeTaskService {
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.create_calls
            .lock()
            .expect("create calls mutex should not be poisoned")
            .push(draft.clone());
        self.create_results
            .lock()
            .expect("create queue mutex should not be poisoned")
            .pop_front()
            .expect("unexpected create_task call")
    }

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError> {
        self.get_calls
            .lock()
            .expect("get calls mutex should not be poisoned")
            .push(task_id);
        self.get_results
            .lock()
            .expect("get queue mutex should not be poisoned")
            .pop_front()
            .expect("unexpected get_task call")
    }

    async fn list_by_status(
        &self,
        status: TaskStatus,
        search: &str,
    ) -> Result<Vec<Task>, ApiError> {
        self.list_calls
            .lock()
            .expect("list calls mutex should not be poisoned")
            .push((status, search.to_string()));
        self.list_results
            .lock()
            .expect("list queue mutex should not be poisoned")
            .pop_front()
            .expect("unexpected list_by_status call")
    }

    async fn upload_attachments(
        &self,
        task_id: i64,
        files: &[PendingUpload],
    ) -> Result<Vec<Attachment>, ApiError> {
        self.upload_calls
            .lock()
            .expect("upload calls mutex should not be poisoned")
            .push((task_id, files.len()));
        self.upload_results
            .lock()
            .expect("upload queue mutex should not be poisoned")
            .pop_front()
            .expect("unexpected upload_attachments call")
    }
}
