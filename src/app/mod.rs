//! The task-view controller: owns the active tab, the per-tab caches, the
//! staged uploads, and the toast queue, and is the terminal recovery
//! boundary for every error the data layer propagates.

pub mod fetch;
pub mod state;
mod update;
pub mod uploads;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use tuirealm::event::{KeyEvent, MouseEvent};
use tuirealm::ratatui::layout::Rect;

use crate::api::{HttpTaskClient, TaskService};
use crate::notification::Toasts;
use crate::settings::Settings;
use crate::theme::{Theme, ThemePreset};

pub use self::state::{
    ActiveOverlay, DetailState, FormField, ListTab, NewTaskForm, PreviewState, Tab, TabData,
};
use self::fetch::{FetchInbox, FetchOutcome};
use self::uploads::UploadPipeline;
use self::workflows::SubmitOutcome;
use crate::types::Task;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    SelectTab(Tab),
    SelectTask(ListTab, i64),
    FocusField(FormField),
}

pub struct App {
    pub settings: Settings,
    pub theme: Theme,
    service: Arc<dyn TaskService>,
    inbox: FetchInbox,
    pub active_tab: Tab,
    open: TabData,
    closed: TabData,
    pub form: NewTaskForm,
    pub uploads: UploadPipeline,
    pub toasts: Toasts,
    pub overlay: ActiveOverlay,
    /// Rebuilt every frame by the renderer; maps clickable regions to the
    /// message a left click should produce.
    pub hit_test_map: Vec<(Rect, Message)>,
    pub submit_in_flight: bool,
    should_quit: bool,
}

impl App {
    pub fn new(settings: Settings, theme_override: Option<ThemePreset>) -> Self {
        let service: Arc<dyn TaskService> =
            Arc::new(HttpTaskClient::new(&settings.server_url));
        Self::with_service(settings, theme_override, service)
    }

    pub fn with_service(
        settings: Settings,
        theme_override: Option<ThemePreset>,
        service: Arc<dyn TaskService>,
    ) -> Self {
        let preset = theme_override.unwrap_or_else(|| settings.theme_preset());
        let toasts = Toasts::new(settings.notification_backend());
        Self {
            theme: Theme::from_preset(preset),
            service,
            inbox: fetch::new_inbox(),
            active_tab: Tab::NewTask,
            open: TabData::new(),
            closed: TabData::new(),
            form: NewTaskForm::new(),
            uploads: UploadPipeline::new(),
            toasts,
            overlay: ActiveOverlay::None,
            hit_test_map: Vec::new(),
            submit_in_flight: false,
            should_quit: false,
            settings,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn tab_data(&self, tab: ListTab) -> &TabData {
        match tab {
            ListTab::Open => &self.open,
            ListTab::Closed => &self.closed,
        }
    }

    pub fn tab_data_mut(&mut self, tab: ListTab) -> &mut TabData {
        match tab {
            ListTab::Open => &mut self.open,
            ListTab::Closed => &mut self.closed,
        }
    }

    /// Entering a list tab (re-)fetches it; entering the form only toggles
    /// visibility.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        if let Some(list) = tab.list_tab() {
            self.request_list_fetch(list);
        }
    }

    /// Issues a list fetch under a fresh generation. Any response still in
    /// flight for an older generation of this tab will be discarded when it
    /// lands.
    pub fn request_list_fetch(&mut self, tab: ListTab) {
        let (generation, search) = {
            let data = self.tab_data_mut(tab);
            data.loading = true;
            data.list_error = None;
            (data.next_generation(), data.search.clone())
        };
        debug!(tab = tab.label(), generation, "issuing list fetch");
        fetch::spawn_list_fetch(
            Arc::clone(&self.service),
            Arc::clone(&self.inbox),
            tab,
            generation,
            search,
        );
    }

    /// Row activation: resolve the task from the tab cache, falling back to
    /// a single point fetch on a miss.
    pub fn select_task(&mut self, tab: ListTab, task_id: i64) {
        let cached = {
            let data = self.tab_data_mut(tab);
            data.selected = Some(task_id);
            data.attachment_cursor = 0;
            data.task_by_id(task_id).cloned()
        };
        match cached {
            Some(task) => self.tab_data_mut(tab).detail = DetailState::Loaded(task),
            None => {
                self.tab_data_mut(tab).detail = DetailState::Loading(task_id);
                fetch::spawn_detail_fetch(
                    Arc::clone(&self.service),
                    Arc::clone(&self.inbox),
                    tab,
                    task_id,
                );
            }
        }
    }

    pub fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::List {
                tab,
                generation,
                result,
            } => {
                if generation != self.tab_data(tab).generation {
                    debug!(
                        tab = tab.label(),
                        generation,
                        current = self.tab_data(tab).generation,
                        "discarding stale list response"
                    );
                    return;
                }
                match result {
                    Ok(tasks) => self.apply_list(tab, tasks),
                    Err(error) => {
                        self.toasts
                            .error(format!("Failed to load {} tasks: {error}", tab.label()));
                        self.tab_data_mut(tab).fail_list(error.to_string());
                    }
                }
            }
            FetchOutcome::Detail {
                tab,
                task_id,
                result,
            } => {
                if self.tab_data(tab).selected != Some(task_id) {
                    debug!(task_id, "discarding detail response for stale selection");
                    return;
                }
                match result {
                    Ok(task) => self.tab_data_mut(tab).detail = DetailState::Loaded(task),
                    Err(error) => {
                        self.tab_data_mut(tab).detail = DetailState::Failed;
                        self.toasts
                            .error(format!("Failed to load task #{task_id}: {error}"));
                    }
                }
            }
            FetchOutcome::Submit(outcome) => self.apply_submit_outcome(outcome),
        }
    }

    fn apply_list(&mut self, tab: ListTab, tasks: Vec<Task>) {
        let first = {
            let data = self.tab_data_mut(tab);
            data.replace_tasks(tasks);
            data.tasks.first().map(|task| task.id)
        };
        match first {
            Some(task_id) => self.select_task(tab, task_id),
            None => {
                let data = self.tab_data_mut(tab);
                data.selected = None;
                data.detail = DetailState::Empty;
            }
        }
    }

    fn apply_submit_outcome(&mut self, outcome: SubmitOutcome) {
        self.submit_in_flight = false;
        match outcome {
            SubmitOutcome::Created { task, uploaded } => {
                self.toasts
                    .success(format!("Task \"{}\" (#{}) created", task.title, task.id));
                if uploaded > 0 {
                    self.toasts
                        .success(format!("{uploaded} file(s) uploaded for task #{}", task.id));
                }
                self.form.reset();
                self.uploads.reset();
                self.switch_tab(Tab::Open);
            }
            SubmitOutcome::CreateFailed(error) => {
                self.toasts.error(format!("Failed to create task: {error}"));
            }
            SubmitOutcome::UploadFailed { task, error } => {
                // The task exists; only the attachments are missing. Stay on
                // the form so the staged files remain visible.
                self.toasts
                    .success(format!("Task \"{}\" (#{}) created", task.title, task.id));
                self.toasts.error(format!(
                    "Task #{} exists, but attachments were not uploaded: {error}",
                    task.id
                ));
            }
        }
    }

    pub fn submit_form(&mut self) {
        if self.submit_in_flight {
            self.toasts.info("Submission already in progress");
            return;
        }
        match self.form.draft() {
            Ok(draft) => {
                self.submit_in_flight = true;
                fetch::spawn_submit(
                    Arc::clone(&self.service),
                    Arc::clone(&self.inbox),
                    draft,
                    self.uploads.clone(),
                );
            }
            Err(error) => self.toasts.error(error.to_string()),
        }
    }

    /// Stage the path currently typed into the file input. Duplicates are
    /// dropped silently; unreadable paths produce an error toast.
    pub fn stage_file_input(&mut self) {
        let path = self.form.file_input.trim().to_string();
        if path.is_empty() {
            return;
        }
        match self.uploads.stage_path(std::path::Path::new(&path)) {
            Ok(_) => self.form.file_input.clear(),
            Err(error) => self.toasts.error(format!("Cannot stage {path}: {error}")),
        }
    }

    /// Tick: fire due debounces, drain finished fetches, expire toasts.
    pub fn handle_tick(&mut self) {
        let now = Instant::now();
        for tab in [ListTab::Open, ListTab::Closed] {
            if self.tab_data_mut(tab).take_due_debounce(now) {
                self.request_list_fetch(tab);
            }
        }
        for outcome in fetch::drain(&self.inbox) {
            self.apply_outcome(outcome);
        }
        self.toasts.sweep(now);
    }

    pub fn note_search_edit(&mut self, tab: ListTab) {
        let window = self.settings.debounce_window();
        self.tab_data_mut(tab)
            .note_search_edit(Instant::now(), window);
    }

    /// Activate the attachment under the cursor: images open the preview
    /// overlay, everything else is handed to the OS for a direct download.
    pub fn activate_attachment(&mut self, tab: ListTab) {
        let Some((attachment, task_title)) = ({
            let data = self.tab_data(tab);
            match &data.detail {
                DetailState::Loaded(task) => task
                    .files
                    .get(data.attachment_cursor)
                    .map(|attachment| (attachment.clone(), task.title.clone())),
                _ => None,
            }
        }) else {
            return;
        };

        if attachment.is_image() {
            self.overlay = ActiveOverlay::Preview(PreviewState {
                attachment,
                task_title,
            });
        } else {
            self.open_attachment_url(&attachment.url, &attachment.filename);
        }
    }

    pub fn open_attachment_url(&mut self, url: &str, filename: &str) {
        match open::that(url) {
            Ok(()) => self.toasts.info(format!("Opening {filename}")),
            Err(error) => self
                .toasts
                .error(format!("Failed to open {filename}: {error}")),
        }
    }

    pub fn move_attachment_cursor(&mut self, tab: ListTab, delta: i64) {
        let data = self.tab_data_mut(tab);
        let count = match &data.detail {
            DetailState::Loaded(task) => task.files.len(),
            _ => 0,
        };
        if count == 0 {
            data.attachment_cursor = 0;
            return;
        }
        let current = data.attachment_cursor as i64;
        data.attachment_cursor = (current + delta).clamp(0, count as i64 - 1) as usize;
    }

    pub fn select_adjacent(&mut self, tab: ListTab, delta: i64) {
        let next = {
            let data = self.tab_data(tab);
            if data.tasks.is_empty() {
                None
            } else {
                let current = data.selected_index().unwrap_or(0) as i64;
                let next = (current + delta).clamp(0, data.tasks.len() as i64 - 1) as usize;
                Some(data.tasks[next].id)
            }
        };
        if let Some(task_id) = next
            && self.tab_data(tab).selected != Some(task_id)
        {
            self.select_task(tab, task_id);
        }
    }
}
