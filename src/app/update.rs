//! Message dispatch: terminal events in, state mutations out.

use anyhow::Result;
use tuirealm::event::{Key, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tuirealm::ratatui::layout::Rect;

use super::{ActiveOverlay, App, FormField, ListTab, Message, Tab};

fn rect_contains(rect: &Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

impl App {
    pub fn update(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Tick => self.handle_tick(),
            Message::Resize(_, _) => {}
            Message::Key(key) => self.handle_key(key),
            Message::Mouse(mouse) => self.handle_mouse(mouse),
            Message::SelectTab(tab) => self.switch_tab(tab),
            Message::SelectTask(tab, task_id) => self.select_task(tab, task_id),
            Message::FocusField(field) => self.form.focused = field,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == Key::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        if matches!(self.overlay, ActiveOverlay::Preview(_)) {
            self.handle_preview_key(key);
            return;
        }

        match self.active_tab {
            Tab::NewTask => self.handle_form_key(key),
            Tab::Open => self.handle_list_key(ListTab::Open, key),
            Tab::Closed => self.handle_list_key(ListTab::Closed, key),
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) {
        let ActiveOverlay::Preview(preview) = &self.overlay else {
            return;
        };
        match key.code {
            Key::Esc | Key::Char('q') => self.overlay = ActiveOverlay::None,
            Key::Char('o') | Key::Enter => {
                let url = preview.attachment.url.clone();
                let filename = preview.attachment.filename.clone();
                self.open_attachment_url(&url, &filename);
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == Key::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.submit_form();
            return;
        }
        if key.code == Key::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.form.reset();
            self.uploads.reset();
            return;
        }

        match key.code {
            Key::Esc => self.switch_tab(Tab::Open),
            Key::Tab => self.form.focus_next(),
            Key::BackTab => self.form.focus_previous(),
            Key::Down => {
                if self.form.focused == FormField::Files && !self.uploads.is_empty() {
                    let last = self.uploads.len() - 1;
                    self.form.staged_cursor = (self.form.staged_cursor + 1).min(last);
                } else {
                    self.form.focus_next();
                }
            }
            Key::Up => {
                if self.form.focused == FormField::Files && self.form.staged_cursor > 0 {
                    self.form.staged_cursor -= 1;
                } else if self.form.focused != FormField::Files {
                    self.form.focus_previous();
                }
            }
            Key::Enter => match self.form.focused {
                FormField::Files => self.stage_file_input(),
                FormField::Submit => self.submit_form(),
                _ => self.form.focus_next(),
            },
            Key::Delete => {
                if self.form.focused == FormField::Files {
                    let index = self.form.staged_cursor;
                    if self.uploads.remove(index).is_some() && index > 0 {
                        self.form.staged_cursor = index - 1;
                    }
                }
            }
            Key::Backspace => {
                if let Some(text) = self.form.focused_text_mut() {
                    text.pop();
                }
            }
            Key::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = self.form.focused_text_mut() {
                    text.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, tab: ListTab, key: KeyEvent) {
        if self.tab_data(tab).search_editing {
            self.handle_search_key(tab, key);
            return;
        }

        match key.code {
            Key::Char('q') => self.quit(),
            Key::Char('n') => self.switch_tab(Tab::NewTask),
            Key::Char('o') => self.switch_tab(Tab::Open),
            Key::Char('c') => self.switch_tab(Tab::Closed),
            Key::Char('/') => self.tab_data_mut(tab).search_editing = true,
            Key::Char('r') => self.request_list_fetch(tab),
            Key::Down | Key::Char('j') => self.select_adjacent(tab, 1),
            Key::Up | Key::Char('k') => self.select_adjacent(tab, -1),
            Key::Right | Key::Char('l') => self.move_attachment_cursor(tab, 1),
            Key::Left | Key::Char('h') => self.move_attachment_cursor(tab, -1),
            Key::Enter => self.activate_attachment(tab),
            Key::Esc => self.toasts.clear(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, tab: ListTab, key: KeyEvent) {
        match key.code {
            Key::Esc | Key::Enter => self.tab_data_mut(tab).search_editing = false,
            Key::Backspace => {
                if self.tab_data_mut(tab).search.pop().is_some() {
                    self.note_search_edit(tab);
                }
            }
            Key::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.tab_data_mut(tab).search.push(ch);
                self.note_search_edit(tab);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = self
                    .hit_test_map
                    .iter()
                    .find(|(rect, _)| rect_contains(rect, mouse.column, mouse.row))
                    .map(|(_, message)| message.clone());
                if let Some(message) = hit {
                    let _ = self.update(message);
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some(tab) = self.active_tab.list_tab() {
                    self.select_adjacent(tab, 1);
                }
            }
            MouseEventKind::ScrollUp => {
                if let Some(tab) = self.active_tab.list_tab() {
                    self.select_adjacent(tab, -1);
                }
            }
            _ => {}
        }
    }
}
