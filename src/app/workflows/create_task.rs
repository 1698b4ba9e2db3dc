use tracing::{info, warn};

use crate::api::{ApiError, TaskService};
use crate::app::uploads::UploadPipeline;
use crate::types::{Task, TaskDraft};

/// Result of one submission attempt. Creation and upload failures are kept
/// apart: after `UploadFailed` the task exists on the server and only the
/// attachments are missing.
#[derive(Debug)]
pub enum SubmitOutcome {
    Created { task: Task, uploaded: usize },
    CreateFailed(ApiError),
    UploadFailed { task: Task, error: ApiError },
}

/// Create the task, then commit the staged files for it. Upload is only
/// attempted once creation succeeded; a failed upload is never retried here.
pub async fn submit_task(
    service: &dyn TaskService,
    draft: TaskDraft,
    staged: &UploadPipeline,
) -> SubmitOutcome {
    let task = match service.create_task(&draft).await {
        Ok(task) => task,
        Err(error) => {
            warn!(error = %error, title = %draft.title, "task creation failed");
            return SubmitOutcome::CreateFailed(error);
        }
    };
    info!(task_id = task.id, staged = staged.len(), "task created");

    match staged.commit(service, task.id).await {
        Ok(uploaded) => SubmitOutcome::Created {
            task,
            uploaded: uploaded.len(),
        },
        Err(error) => {
            warn!(
                task_id = task.id,
                error = %error,
                "attachment upload failed after task creation"
            );
            SubmitOutcome::UploadFailed { task, error }
        }
    }
}
