//! View state owned by the controller: tabs, per-tab caches, form state

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::types::{Attachment, Task, TaskDraft};

/// Top-level view. Exactly one is active; the `App` is the sole mutator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tab {
    NewTask,
    Open,
    Closed,
}

impl Tab {
    pub const ALL: [Self; 3] = [Self::NewTask, Self::Open, Self::Closed];

    pub const fn title(self) -> &'static str {
        match self {
            Self::NewTask => "New task",
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }

    /// The list category behind this tab, if it has one.
    pub const fn list_tab(self) -> Option<ListTab> {
        match self {
            Self::NewTask => None,
            Self::Open => Some(ListTab::Open),
            Self::Closed => Some(ListTab::Closed),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ListTab {
    Open,
    Closed,
}

impl ListTab {
    pub const fn tab(self) -> Tab {
        match self {
            Self::Open => Tab::Open,
            Self::Closed => Tab::Closed,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Empty,
    Loading(i64),
    Loaded(Task),
    Failed,
}

/// Per-category view state: the task cache (fully replaced on every
/// successful list fetch), selection, search text, and the bookkeeping for
/// debounced fetches and stale-response discards.
#[derive(Debug, Default)]
pub struct TabData {
    pub tasks: Vec<Task>,
    by_id: HashMap<i64, usize>,
    pub selected: Option<i64>,
    pub detail: DetailState,
    pub search: String,
    pub search_editing: bool,
    pub generation: u64,
    pub loading: bool,
    pub list_error: Option<String>,
    pub attachment_cursor: usize,
    debounce_deadline: Option<Instant>,
}

impl Default for DetailState {
    fn default() -> Self {
        Self::Empty
    }
}

impl TabData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full replacement, never a merge.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.by_id = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| (task.id, index))
            .collect();
        self.tasks = tasks;
        self.loading = false;
        self.list_error = None;
    }

    pub fn task_by_id(&self, task_id: i64) -> Option<&Task> {
        self.by_id.get(&task_id).map(|&index| &self.tasks[index])
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.by_id.get(&id).copied())
    }

    /// Failed list fetch: drop the cache and show an error placeholder.
    pub fn fail_list(&mut self, message: String) {
        self.tasks.clear();
        self.by_id.clear();
        self.selected = None;
        self.detail = DetailState::Empty;
        self.loading = false;
        self.list_error = Some(message);
    }

    /// Each input event re-arms the deadline; superseded deadlines never fire.
    pub fn note_search_edit(&mut self, now: Instant, window: Duration) {
        self.debounce_deadline = Some(now + window);
    }

    /// True exactly once per armed deadline, after the quiet interval passed.
    pub fn take_due_debounce(&mut self, now: Instant) -> bool {
        match self.debounce_deadline {
            Some(deadline) if deadline <= now => {
                self.debounce_deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.debounce_deadline.is_some()
    }

    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FormField {
    Title,
    Description,
    Project,
    Organisation,
    Files,
    Submit,
}

impl FormField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Project => "Project",
            Self::Organisation => "Organisation",
            Self::Files => "Attach file (path)",
            Self::Submit => "Create task",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Project,
            Self::Project => Self::Organisation,
            Self::Organisation => Self::Files,
            Self::Files => Self::Submit,
            Self::Submit => Self::Title,
        }
    }

    pub const fn previous(self) -> Self {
        match self {
            Self::Title => Self::Submit,
            Self::Description => Self::Title,
            Self::Project => Self::Description,
            Self::Organisation => Self::Project,
            Self::Files => Self::Organisation,
            Self::Submit => Self::Files,
        }
    }
}

#[derive(Debug, Default)]
pub struct NewTaskForm {
    pub title: String,
    pub description: String,
    pub project: String,
    pub organisation: String,
    pub file_input: String,
    pub focused: FormField,
    pub staged_cursor: usize,
}

impl Default for FormField {
    fn default() -> Self {
        Self::Title
    }
}

impl NewTaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Project => Some(&mut self.project),
            FormField::Organisation => Some(&mut self.organisation),
            FormField::Files => Some(&mut self.file_input),
            FormField::Submit => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_previous(&mut self) {
        self.focused = self.focused.previous();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Client-side validation: every field required, non-empty after trim.
    pub fn draft(&self) -> Result<TaskDraft, ApiError> {
        let mut missing = Vec::new();
        for (value, name) in [
            (&self.title, "title"),
            (&self.description, "description"),
            (&self.project, "project"),
            (&self.organisation, "organisation"),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(TaskDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            project: self.project.trim().to_string(),
            organisation: self.organisation.trim().to_string(),
        })
    }
}

/// Modal overlay above the active tab.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveOverlay {
    None,
    Preview(PreviewState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewState {
    pub attachment: Attachment,
    pub task_title: String,
}
