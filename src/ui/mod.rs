use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::App;
use crate::board::DayRef;
use crate::clipboard::FeedbackKind;
use crate::models::{Day, InputMode, Task};
use unicode_width::UnicodeWidthStr;

pub mod color_parser;
pub mod components;
pub mod popups;
pub mod theme;

use components::{markdown_lines, truncate, wrap_text};
use popups::{
    render_clear_confirm_popup, render_data_popup, render_delete_task_popup,
    render_fetch_confirm_popup, render_help_popup, render_import_popup, render_notes_editor,
    render_paste_confirm_popup, render_remote_popup, render_save_popup, render_task_editor,
};

pub fn ui(f: &mut Frame, app: &mut App) {
    let tokens = theme::ThemeTokens::from_theme(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], app, &tokens);
    render_week(f, chunks[1], app, &tokens);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_task_details(f, bottom[0], app, &tokens);
    render_weekly_notes(f, bottom[1], app, &tokens);

    render_status_bar(f, chunks[3], app, &tokens);

    if app.task_editor.is_some() {
        render_task_editor(f, app);
    }
    if app.notes_editor.is_some() {
        render_notes_editor(f, app);
    }

    // Drawn bottom-up so the popup that receives keys ends up on top.
    if app.show_data_popup {
        render_data_popup(f, app);
    }
    if app.import_input.is_some() {
        render_import_popup(f, app);
    }
    if app.show_clear_confirm {
        render_clear_confirm_popup(f);
    }
    if app.remote_form.is_some() {
        render_remote_popup(f, app);
    }
    if app.show_save_popup {
        render_save_popup(f, app);
    }
    if app.delete_target.is_some() {
        render_delete_task_popup(f);
    }
    if app.paste_target.is_some() {
        render_paste_confirm_popup(f, app);
    }
    if app.show_fetch_confirm {
        render_fetch_confirm_popup(f);
    }
    if app.show_help_popup {
        render_help_popup(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App, tokens: &theme::ThemeTokens) {
    let Some(month) = app.current_month() else {
        f.render_widget(
            Paragraph::new(" No months on the board. Fetch from Gist (f) or import a backup (i)."),
            area,
        );
        return;
    };
    let year = month.id.rsplit('-').next().unwrap_or_default();
    let week = app.current_week().map(|w| w.name.as_str()).unwrap_or("-");
    let months = app.engine.data().len();

    let line = Line::from(vec![
        Span::styled(
            format!(" {} {year} ", month.name),
            Style::default()
                .fg(tokens.day_header)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({}/{months})", app.month_index + 1),
            Style::default().fg(tokens.muted),
        ),
        Span::raw("  "),
        Span::styled(week.to_string(), Style::default().add_modifier(Modifier::BOLD)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_week(f: &mut Frame, area: Rect, app: &App, tokens: &theme::ThemeTokens) {
    let (Some(month), Some(week)) = (app.current_month(), app.current_week()) else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    if week.days.is_empty() {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, week.days.len() as u32); week.days.len()])
        .split(area);

    for (index, (day, column)) in week.days.iter().zip(columns.iter()).enumerate() {
        let at = DayRef::new(&month.id, &week.id, index);
        let selected = index == app.day_index;
        render_day(f, *column, app, tokens, day, &at, selected);
    }
}

fn render_day(
    f: &mut Frame,
    area: Rect,
    app: &App,
    tokens: &theme::ThemeTokens,
    day: &Day,
    at: &DayRef,
    selected: bool,
) {
    let mut title = vec![Span::styled(
        format!(" {} ", day.full_date),
        Style::default()
            .fg(tokens.day_header)
            .add_modifier(Modifier::BOLD),
    )];
    if app.feedback.is_active(FeedbackKind::Copy, at) || app.feedback.is_active(FeedbackKind::Paste, at)
    {
        title.push(Span::styled(
            "✓ ",
            Style::default()
                .fg(tokens.feedback)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let border_color = if selected {
        tokens.border_selected
    } else {
        tokens.border_default
    };
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner_width = block.inner(area).width as usize;
    let items: Vec<ListItem> = day
        .todos
        .iter()
        .map(|task| task_item(task, inner_width, tokens))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(tokens.highlight)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    if selected && app.input_mode == InputMode::Navigate && !day.todos.is_empty() {
        state.select(Some(app.task_index.min(day.todos.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn task_item(task: &Task, width: usize, tokens: &theme::ThemeTokens) -> ListItem<'static> {
    let check = if task.completed { "[x] " } else { "[ ] " };
    let link = if task.has_url() { " ↗" } else { "" };
    let text_width = width
        .saturating_sub(UnicodeWidthStr::width(check))
        .saturating_sub(UnicodeWidthStr::width(link));

    let text_style = if task.completed {
        Style::default()
            .fg(tokens.task_done)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(check, Style::default().fg(tokens.task_done)),
        Span::styled(truncate(&task.text, text_width), text_style),
        Span::styled(link, Style::default().fg(tokens.task_time)),
    ])];
    if !task.time.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    {}", truncate(&task.time, width.saturating_sub(4))),
            Style::default().fg(tokens.task_time),
        )));
    }
    ListItem::new(lines)
}

fn render_task_details(f: &mut Frame, area: Rect, app: &App, tokens: &theme::ThemeTokens) {
    let block = Block::default()
        .title(" Task ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let Some(task) = app.selected_task() else {
        let hint = Paragraph::new("No task selected. Press a to add one.")
            .style(Style::default().fg(tokens.muted))
            .block(block);
        f.render_widget(hint, area);
        return;
    };

    let width = block.inner(area).width as usize;
    let mut lines = Vec::new();
    for part in wrap_text(&task.text, width) {
        lines.push(Line::from(Span::styled(
            part,
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    let status = if task.completed { "done" } else { "open" };
    lines.push(Line::from(vec![
        Span::styled(task.time.clone(), Style::default().fg(tokens.task_time)),
        Span::styled(format!("  {status}"), Style::default().fg(tokens.muted)),
    ]));
    for url in task.urls() {
        lines.push(Line::from(Span::styled(
            url,
            Style::default()
                .fg(tokens.task_time)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }
    if let Some(notes) = task.notes.as_deref()
        && !notes.trim().is_empty()
    {
        lines.push(Line::from(""));
        lines.extend(markdown_lines(notes));
    }

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_weekly_notes(f: &mut Frame, area: Rect, app: &App, tokens: &theme::ThemeTokens) {
    let week = app.current_week().map(|w| w.name.as_str()).unwrap_or("Week");
    let block = Block::default()
        .title(format!(" {week} notes "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));

    let notes = app.weekly_notes();
    let body = if notes.trim().is_empty() {
        Paragraph::new("No notes yet. Press w to write some.").style(Style::default().fg(tokens.muted))
    } else {
        Paragraph::new(markdown_lines(notes))
    };
    f.render_widget(body.block(block).wrap(Wrap { trim: false }), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, tokens: &theme::ThemeTokens) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let mode_label = match app.input_mode {
        InputMode::Navigate => "NAV",
        InputMode::Editing => "EDIT",
    };
    let status = app.engine.status(&app.remote);
    let left_spans = vec![
        Span::styled(
            format!(" {mode_label} "),
            Style::default()
                .fg(tokens.border_selected)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("● {}", status.label()),
            Style::default()
                .fg(tokens.status_color(&status))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", app.clipboard.describe()),
            Style::default().fg(tokens.muted),
        ),
    ];

    let right = if let Some(toast) = app.toast_message.as_deref()
        && !toast.is_empty()
    {
        Some((toast.to_string(), tokens.feedback))
    } else {
        app.engine
            .error()
            .map(|error| (format!("Error: {error}"), tokens.status_error))
    };

    let Some((message, color)) = right else {
        f.render_widget(Paragraph::new(Line::from(left_spans)), area);
        return;
    };

    let min_left_width = 20u16;
    let right_width = (UnicodeWidthStr::width(message.as_str()) as u16)
        .min(area.width.saturating_sub(min_left_width));
    let status_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_width)])
        .split(area);

    f.render_widget(Paragraph::new(Line::from(left_spans)), status_chunks[0]);
    let right = Paragraph::new(Span::styled(
        truncate(&message, right_width as usize),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Right);
    f.render_widget(right, status_chunks[1]);
}
