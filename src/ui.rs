//! Frame rendering. Pure draw code: reads the `App`, writes widgets, and
//! rebuilds the hit-test map for mouse support. All state changes happen in
//! the update layer.

use tuirealm::Frame;
use tuirealm::ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{ActiveOverlay, App, DetailState, FormField, ListTab, Message, Tab, TabData};
use crate::notification::ToastLevel;
use crate::theme::Theme;
use crate::types::{Task, TaskStatus, format_size};

pub fn render(frame: &mut Frame<'_>, app: &mut App) {
    app.hit_test_map.clear();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, chunks[0], app);

    match app.active_tab {
        Tab::NewTask => render_form(frame, chunks[1], app),
        Tab::Open => render_list_tab(frame, chunks[1], app, ListTab::Open),
        Tab::Closed => render_list_tab(frame, chunks[1], app, ListTab::Closed),
    }

    render_footer(frame, chunks[2], app);
    render_toasts(frame, app);

    if let ActiveOverlay::Preview(preview) = &app.overlay {
        render_preview(frame, &app.theme, preview);
    }
}

fn render_tabs(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let mut spans = vec![Span::styled(
        " taskdeck ",
        Style::default()
            .fg(app.theme.base.header)
            .add_modifier(Modifier::BOLD),
    )];
    let mut column = area.x + " taskdeck ".len() as u16;

    for tab in Tab::ALL {
        let label = format!("  {}  ", tab.title());
        let width = label.len() as u16;
        let style = if tab == app.active_tab {
            Style::default()
                .fg(app.theme.interactive.focus)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(app.theme.base.text_muted)
        };
        spans.push(Span::styled(label, style));

        app.hit_test_map.push((
            Rect {
                x: column,
                y: area.y,
                width,
                height: 1,
            },
            Message::SelectTab(tab),
        ));
        column = column.saturating_add(width);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let hints = match app.active_tab {
        Tab::NewTask => {
            " Tab: next field  Enter: confirm field  Ctrl+S: submit  Ctrl+R: reset  Del: unstage file  Esc: open tasks "
        }
        Tab::Open | Tab::Closed => {
            " j/k: select  /: search  r: reload  h/l: attachment  Enter: open attachment  n/o/c: tabs  q: quit "
        }
    };
    let footer = Paragraph::new(hints).style(Style::default().fg(app.theme.base.text_muted));
    frame.render_widget(footer, area);
}

fn status_marker(status: TaskStatus, theme: &Theme) -> Span<'static> {
    let (icon, color) = match status {
        TaskStatus::New => ("○", theme.status.fresh),
        TaskStatus::InProgress => ("◐", theme.status.in_progress),
        TaskStatus::Done => ("●", theme.status.done),
    };
    Span::styled(format!("{icon} "), Style::default().fg(color))
}

fn render_list_tab(frame: &mut Frame<'_>, area: Rect, app: &mut App, tab: ListTab) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area);

    render_task_list(frame, columns[0], app, tab);
    render_detail_panel(frame, columns[1], app, tab);
}

fn render_task_list(frame: &mut Frame<'_>, area: Rect, app: &mut App, tab: ListTab) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_search_box(frame, rows[0], app, tab);

    let theme = app.theme;
    let data = app.tab_data(tab);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.interactive.border))
        .title(format!(" {} tasks ({}) ", tab.label(), data.tasks.len()));
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);

    if let Some(message) = list_placeholder(data) {
        let style = if data.list_error.is_some() {
            Style::default().fg(theme.base.danger)
        } else {
            Style::default().fg(theme.base.text_muted)
        };
        let placeholder = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center);
        frame.render_widget(placeholder, inner);
        return;
    }

    let selected_index = data.selected_index().unwrap_or(0);
    let window = visible_window(selected_index, data.tasks.len(), inner.height as usize);
    let mut hits = Vec::new();

    for (offset, task) in data.tasks[window.clone()].iter().enumerate() {
        let row = Rect {
            x: inner.x,
            y: inner.y + offset as u16,
            width: inner.width,
            height: 1,
        };
        let is_selected = data.selected == Some(task.id);
        let style = if is_selected {
            Style::default()
                .bg(theme.interactive.selected_bg)
                .fg(theme.base.text)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.base.text)
        };
        let line = Line::from(vec![
            status_marker(task.status, &theme),
            Span::styled(
                format!("{:<8} ", task.reference()),
                Style::default().fg(theme.base.accent),
            ),
            Span::raw(task.title.clone()),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), row);
        hits.push((row, Message::SelectTask(tab, task.id)));
    }

    app.hit_test_map.extend(hits);
}

fn render_search_box(frame: &mut Frame<'_>, area: Rect, app: &mut App, tab: ListTab) {
    let theme = app.theme;
    let data = app.tab_data(tab);
    let border_color = if data.search_editing {
        theme.interactive.focus
    } else {
        theme.interactive.border
    };
    let title = if data.loading {
        " search (loading…) "
    } else {
        " search "
    };
    let cursor = if data.search_editing { "▏" } else { "" };
    let search = Paragraph::new(format!("{}{cursor}", data.search))
        .style(Style::default().fg(theme.base.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(title),
        );
    frame.render_widget(search, area);
}

fn list_placeholder(data: &TabData) -> Option<&'static str> {
    if data.list_error.is_some() {
        Some("Failed to load tasks.")
    } else if data.tasks.is_empty() {
        if data.loading {
            Some("Loading…")
        } else {
            Some("No tasks.")
        }
    } else {
        None
    }
}

/// Window of list rows kept around the selection so it stays on screen.
fn visible_window(selected: usize, len: usize, height: usize) -> std::ops::Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    if len <= height {
        return 0..len;
    }
    let half = height / 2;
    let start = selected.saturating_sub(half).min(len - height);
    start..start + height
}

fn render_detail_panel(frame: &mut Frame<'_>, area: Rect, app: &mut App, tab: ListTab) {
    let theme = app.theme;
    let data = app.tab_data(tab);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.interactive.border))
        .title(" detail ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &data.detail {
        DetailState::Empty => {
            let placeholder = Paragraph::new("Select a task")
                .style(Style::default().fg(theme.base.text_muted))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, inner);
        }
        DetailState::Loading(task_id) => {
            let placeholder = Paragraph::new(format!("Loading task #{task_id}…"))
                .style(Style::default().fg(theme.base.text_muted))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, inner);
        }
        DetailState::Failed => {
            let placeholder = Paragraph::new("Failed to load task.")
                .style(Style::default().fg(theme.base.danger))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, inner);
        }
        DetailState::Loaded(task) => {
            render_task_detail(frame, inner, &theme, task, data.attachment_cursor);
        }
    }
}

fn render_task_detail(
    frame: &mut Frame<'_>,
    area: Rect,
    theme: &Theme,
    task: &Task,
    attachment_cursor: usize,
) {
    let mut lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default()
                .fg(theme.base.header)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} – {}",
                task.created_at.format("%Y-%m-%d"),
                task.updated_at.format("%Y-%m-%d")
            ),
            Style::default().fg(theme.base.text_muted),
        )),
        Line::from(vec![
            Span::styled("Project: ", Style::default().fg(theme.base.text_muted)),
            Span::raw(task.project.clone()),
            Span::styled("   Organisation: ", Style::default().fg(theme.base.text_muted)),
            Span::raw(task.organisation.clone()),
        ]),
        Line::default(),
    ];

    for text_line in task.description.lines() {
        lines.push(Line::from(Span::raw(text_line.to_string())));
    }

    lines.push(Line::default());
    if task.files.is_empty() {
        lines.push(Line::from(Span::styled(
            "No attachments",
            Style::default().fg(theme.base.text_muted),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Attachments ({})", task.files.len()),
            Style::default().fg(theme.base.header),
        )));
        for (index, attachment) in task.files.iter().enumerate() {
            let mut spans = vec![
                Span::styled(
                    format!("{} ", attachment.kind().icon()),
                    Style::default().fg(theme.base.accent),
                ),
                Span::raw(format!(
                    "{} ({})",
                    attachment.filename,
                    format_size(attachment.size)
                )),
            ];
            if attachment.is_image() {
                spans.push(Span::styled(
                    "  [preview]",
                    Style::default().fg(theme.base.text_muted),
                ));
            }
            let mut line = Line::from(spans);
            if index == attachment_cursor {
                line = line.style(
                    Style::default()
                        .bg(theme.interactive.selected_bg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            lines.push(line);
        }
    }

    let detail = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn render_form(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let theme = app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.interactive.border))
        .title(" new task ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    render_form_field(frame, rows[0], app, FormField::Title);
    render_form_field(frame, rows[1], app, FormField::Description);
    render_form_field(frame, rows[2], app, FormField::Project);
    render_form_field(frame, rows[3], app, FormField::Organisation);
    render_form_field(frame, rows[4], app, FormField::Files);
    render_staged_files(frame, rows[5], app);
}

fn render_form_field(frame: &mut Frame<'_>, area: Rect, app: &mut App, field: FormField) {
    let theme = app.theme;
    let focused = app.form.focused == field;
    let value = match field {
        FormField::Title => app.form.title.as_str(),
        FormField::Description => app.form.description.as_str(),
        FormField::Project => app.form.project.as_str(),
        FormField::Organisation => app.form.organisation.as_str(),
        FormField::Files => app.form.file_input.as_str(),
        FormField::Submit => "",
    };
    let border_color = if focused {
        theme.interactive.focus
    } else {
        theme.interactive.border
    };
    let cursor = if focused { "▏" } else { "" };
    let widget = Paragraph::new(format!("{value}{cursor}"))
        .style(Style::default().fg(theme.base.text))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(format!(" {} ", field.label())),
        );
    frame.render_widget(widget, area);
    app.hit_test_map.push((area, Message::FocusField(field)));
}

fn render_staged_files(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let theme = app.theme;
    let submit_focused = app.form.focused == FormField::Submit;

    let mut lines = Vec::new();
    if app.uploads.is_empty() {
        lines.push(Line::from(Span::styled(
            "No files staged. Type a path above and press Enter.",
            Style::default().fg(theme.base.text_muted),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Staged files ({})", app.uploads.len()),
            Style::default().fg(theme.base.header),
        )));
        for (index, file) in app.uploads.files().iter().enumerate() {
            let mut line = Line::from(Span::raw(format!(
                "  {} ({})",
                file.name,
                format_size(file.size)
            )));
            if app.form.focused == FormField::Files && index == app.form.staged_cursor {
                line = line.style(Style::default().bg(theme.interactive.selected_bg));
            }
            lines.push(line);
        }
    }

    lines.push(Line::default());
    let submit_style = if submit_focused {
        Style::default()
            .fg(theme.interactive.focus)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(theme.base.accent)
    };
    let submit_label = if app.submit_in_flight {
        "[ Creating… ]"
    } else {
        "[ Create task ]"
    };
    lines.push(Line::from(Span::styled(submit_label, submit_style)));

    frame.render_widget(Paragraph::new(lines), area);

    // the submit "button" is the last rendered line
    if area.height >= 1 {
        let button_row = Rect {
            x: area.x,
            y: area.y + (area.height - 1).min(app.uploads.len() as u16 + 2),
            width: area.width,
            height: 1,
        };
        app.hit_test_map
            .push((button_row, Message::FocusField(FormField::Submit)));
    }
}

fn render_toasts(frame: &mut Frame<'_>, app: &App) {
    let theme = app.theme;
    let area = frame.area();
    if app.toasts.is_empty() || area.height < 4 {
        return;
    }

    let max_visible = 4usize;
    let width = area.width.min(46);
    let x = area.width.saturating_sub(width);

    for (index, toast) in app.toasts.entries().iter().rev().take(max_visible).enumerate() {
        let y = area
            .height
            .saturating_sub(2)
            .saturating_sub(index as u16 * 3);
        if y < 1 {
            break;
        }
        let rect = Rect {
            x,
            y: y.saturating_sub(1),
            width,
            height: 3,
        };
        let color = match toast.level {
            ToastLevel::Success => theme.toast.success,
            ToastLevel::Error => theme.toast.error,
            ToastLevel::Info => theme.toast.info,
        };
        let widget = Paragraph::new(toast.message.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(format!(" {} ", toast.level.as_str())),
            );
        frame.render_widget(Clear, rect);
        frame.render_widget(widget, rect);
    }
}

fn render_preview(frame: &mut Frame<'_>, theme: &Theme, preview: &crate::app::PreviewState) {
    let area = centered_rect(frame.area(), 70, 60);
    frame.render_widget(Clear, area);

    let attachment = &preview.attachment;
    let lines = vec![
        Line::from(Span::styled(
            attachment.filename.clone(),
            Style::default()
                .fg(theme.base.header)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(format!("Task: {}", preview.task_title)),
        Line::from(format!("Type: {}", attachment.mimetype)),
        Line::from(format!("Size: {}", format_size(attachment.size))),
        Line::from(Span::styled(
            attachment.url.clone(),
            Style::default().fg(theme.base.accent),
        )),
        Line::default(),
        Line::from(Span::styled(
            "o/Enter: open in viewer   Esc: close",
            Style::default().fg(theme.base.text_muted),
        )),
    ];

    let widget = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(theme.interactive.focus))
            .title(" image preview "),
    );
    frame.render_widget(widget, area);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
