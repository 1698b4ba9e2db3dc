//! Staged-file pipeline: everything between "user picked a file" and
//! "attachment committed to the server".

use std::path::Path;

use tracing::debug;

use crate::api::{ApiError, TaskService};
use crate::types::{Attachment, PendingUpload};

/// Files staged for the next task submission. Identity inside the set is the
/// (name, size) pair; duplicate adds are dropped without comment.
#[derive(Debug, Clone, Default)]
pub struct UploadPipeline {
    staged: Vec<PendingUpload>,
}

impl UploadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an identical file was already staged.
    pub fn add(&mut self, file: PendingUpload) -> bool {
        if self.staged.iter().any(|staged| staged.same_identity(&file)) {
            debug!(name = %file.name, size = file.size, "duplicate staged file ignored");
            return false;
        }
        self.staged.push(file);
        true
    }

    pub fn stage_path(&mut self, path: &Path) -> std::io::Result<bool> {
        let file = PendingUpload::from_path(path)?;
        Ok(self.add(file))
    }

    /// Removes exactly one entry; the rest keep their order.
    pub fn remove(&mut self, index: usize) -> Option<PendingUpload> {
        if index < self.staged.len() {
            Some(self.staged.remove(index))
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.staged.clear();
    }

    pub fn files(&self) -> &[PendingUpload] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Commits the staged set for a task that is already confirmed created.
    /// An empty set resolves immediately without a network call.
    pub async fn commit(
        &self,
        service: &dyn TaskService,
        task_id: i64,
    ) -> Result<Vec<Attachment>, ApiError> {
        if self.staged.is_empty() {
            return Ok(Vec::new());
        }
        service.upload_attachments(task_id, &self.staged).await
    }
}
