use super::components::{centered_rect, fmt_keys, markdown_lines};
use crate::actions;
use crate::app::{App, RemoteField};
use crate::models::TaskField;
use crate::ui::theme::ThemeTokens;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render_help_popup(f: &mut Frame, app: &App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(2)
        .split(area);

    let mut lines = Vec::new();
    for (title, entries) in help_sections(app) {
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(tokens.day_header)
                .add_modifier(Modifier::BOLD),
        )));
        for (keys, description) in entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {keys:<22}"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(description),
            ]));
        }
        lines.push(Line::from(""));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner[0]);
    f.render_widget(
        Paragraph::new("Esc / ?: close").style(Style::default().fg(tokens.muted)),
        inner[1],
    );
}

fn help_sections(app: &App) -> Vec<(&'static str, Vec<(String, &'static str)>)> {
    let kb = &app.config.keybindings;
    vec![
        (
            "Board",
            vec![
                (
                    format!("{} / {}", fmt_keys(&kb.board.left), fmt_keys(&kb.board.right)),
                    "Previous / next day",
                ),
                (
                    format!("{} / {}", fmt_keys(&kb.board.up), fmt_keys(&kb.board.down)),
                    "Previous / next task",
                ),
                (fmt_keys(&kb.board.add), "Add task"),
                (fmt_keys(&kb.board.toggle), "Toggle done"),
                (fmt_keys(&kb.board.edit), "Edit task"),
                (fmt_keys(&kb.board.delete), "Delete task"),
                (fmt_keys(&kb.board.copy_day), "Copy day"),
                (fmt_keys(&kb.board.paste_day), "Paste day"),
                (fmt_keys(&kb.board.open_url), "Open task links"),
            ],
        ),
        (
            "Navigation",
            vec![
                (
                    format!(
                        "{} / {}",
                        fmt_keys(&kb.global.prev_week),
                        fmt_keys(&kb.global.next_week)
                    ),
                    "Previous / next week",
                ),
                (
                    format!(
                        "{} / {}",
                        fmt_keys(&kb.global.prev_month),
                        fmt_keys(&kb.global.next_month)
                    ),
                    "Previous / next month",
                ),
                (fmt_keys(&kb.global.weekly_notes), "Weekly notes"),
            ],
        ),
        (
            "Sync & data",
            vec![
                (fmt_keys(&kb.global.fetch), "Fetch from Gist"),
                (fmt_keys(&kb.global.save), "Save to Gist"),
                (fmt_keys(&kb.global.remote), "Gist settings"),
                (fmt_keys(&kb.global.data), "Backup / import / clear"),
                (fmt_keys(&kb.global.quit), "Quit"),
            ],
        ),
        (
            "Editor",
            vec![
                (fmt_keys(&kb.editor.submit), "Save"),
                (fmt_keys(&kb.editor.cancel), "Cancel"),
                (
                    format!(
                        "{} / {}",
                        fmt_keys(&kb.editor.next_field),
                        fmt_keys(&kb.editor.prev_field)
                    ),
                    "Next / previous field",
                ),
                (
                    format!(
                        "{} {} {} {}",
                        fmt_keys(&kb.editor.bold),
                        fmt_keys(&kb.editor.italic),
                        fmt_keys(&kb.editor.underline),
                        fmt_keys(&kb.editor.code)
                    ),
                    "Bold, italic, underline, code",
                ),
                (
                    format!(
                        "{} {} {}",
                        fmt_keys(&kb.editor.quote),
                        fmt_keys(&kb.editor.bullet),
                        fmt_keys(&kb.editor.numbered)
                    ),
                    "Quote, bullet, numbered line",
                ),
            ],
        ),
    ]
}

fn render_confirm(f: &mut Frame, title: &str, body: &str, help: &str, color: Color) {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .style(Style::default().fg(color));
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .margin(2)
        .split(area);

    let body = Paragraph::new(body.to_string())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true });
    let help_text = Paragraph::new(help.to_string()).style(Style::default().fg(Color::DarkGray));

    f.render_widget(body, text_area[0]);
    f.render_widget(help_text, text_area[1]);
}

pub fn render_fetch_confirm_popup(f: &mut Frame) {
    render_confirm(
        f,
        "Fetch from Gist?",
        "Fetching replaces the local board with the Gist copy. Local changes that were not saved will be lost.",
        "Enter/y: fetch  Esc/n: cancel",
        Color::Yellow,
    );
}

pub fn render_paste_confirm_popup(f: &mut Frame, app: &App) {
    let existing = app.current_day().map_or(0, |d| d.todos.len());
    let incoming = app.clipboard.copied().map_or(0, |c| c.tasks.len());
    render_confirm(
        f,
        "Replace tasks?",
        &format!("This day has {existing} task(s). Replace them with {incoming} copied task(s)?"),
        "Enter/y: replace  Esc/n: cancel",
        Color::Yellow,
    );
}

pub fn render_delete_task_popup(f: &mut Frame) {
    render_confirm(
        f,
        "Delete task?",
        "Delete this task? (y)es / (n)o",
        "Enter/y: delete  Esc/n: cancel",
        Color::LightRed,
    );
}

pub fn render_clear_confirm_popup(f: &mut Frame) {
    render_confirm(
        f,
        "Clear all data?",
        "This removes the stored board from this machine. Gist settings and the Gist itself are kept.",
        "Enter/y: clear  Esc/n: cancel",
        Color::LightRed,
    );
}

pub fn render_save_popup(f: &mut Frame, app: &App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let block = Block::default()
        .title(" Save to Gist ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_selected));
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(2)
        .split(area);

    let status = app.engine.status(&app.remote);
    let lines = vec![
        Line::from(vec![
            Span::raw("Gist: "),
            Span::styled(
                app.remote.remote_id.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(status.label(), Style::default().fg(tokens.status_color(&status))),
        ]),
        Line::from(format!(
            "Last saved: {}",
            app.engine
                .last_saved_at()
                .map_or_else(|| "never".to_string(), |at| at.format("%H:%M:%S").to_string())
        )),
        Line::from(""),
        Line::from("[s] Save    [d] Save and download a copy"),
    ];
    f.render_widget(Paragraph::new(lines), inner[0]);
    f.render_widget(
        Paragraph::new("Esc: cancel").style(Style::default().fg(tokens.muted)),
        inner[1],
    );
}

pub fn render_remote_popup(f: &mut Frame, app: &mut App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let Some(form) = app.remote_form.as_mut() else {
        return;
    };
    let block = Block::default().title(" Gist Settings ").borders(Borders::ALL);
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .margin(1)
        .split(area);

    let border = |focused: bool| {
        Style::default().fg(if focused {
            tokens.border_selected
        } else {
            tokens.border_default
        })
    };
    let id_focused = form.focus == RemoteField::Id;
    form.id_input.set_block(
        Block::default()
            .title(" Gist ID ")
            .borders(Borders::ALL)
            .border_style(border(id_focused)),
    );
    form.token_input.set_block(
        Block::default()
            .title(" Personal access token (gist scope) ")
            .borders(Borders::ALL)
            .border_style(border(!id_focused)),
    );
    f.render_widget(&form.id_input, chunks[0]);
    f.render_widget(&form.token_input, chunks[1]);
    f.render_widget(
        Paragraph::new("Tab: switch field  Enter: save & fetch  Esc: cancel")
            .style(Style::default().fg(tokens.muted)),
        chunks[2],
    );
}

pub fn render_data_popup(f: &mut Frame, app: &App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let block = Block::default()
        .title(" Data ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_default));
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(2)
        .split(area);

    let token = app.remote.masked_token();
    let lines = vec![
        Line::from(format!("Storage: {}", actions::storage_summary(app))),
        Line::from(format!("Data dir: {}", app.config.data.data_dir.display())),
        Line::from(format!("Exports: {}", app.config.data.export_dir.display())),
        Line::from(format!("Gist token: {token}")),
        Line::from(""),
        Line::from("[e] Export backup    [i] Import backup    [c] Clear all data"),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner[0]);
    f.render_widget(
        Paragraph::new("Esc: close").style(Style::default().fg(tokens.muted)),
        inner[1],
    );
}

pub fn render_import_popup(f: &mut Frame, app: &mut App) {
    let Some(input) = app.import_input.as_mut() else {
        return;
    };
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    input.set_block(
        Block::default()
            .title(" Import backup · Enter: import · Esc: cancel ")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan)),
    );
    let inner = Rect {
        height: area.height.min(3),
        ..area
    };
    f.render_widget(&*input, inner);
}

pub fn render_task_editor(f: &mut Frame, app: &mut App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let Some(editor) = app.task_editor.as_mut() else {
        return;
    };
    let block = Block::default()
        .title(" Edit task · Ctrl+S: save · Esc: cancel ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tokens.border_selected));
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .margin(1)
        .split(area);

    let active = editor.field;
    for (i, (field, textarea)) in TaskField::all()
        .iter()
        .zip(editor.inputs.iter_mut())
        .enumerate()
    {
        let color = if *field == active {
            tokens.border_selected
        } else {
            tokens.border_default
        };
        textarea.set_block(
            Block::default()
                .title(format!(" {} ", field.label()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        textarea.set_cursor_style(if *field == active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        f.render_widget(&*textarea, chunks[i]);
    }
}

pub fn render_notes_editor(f: &mut Frame, app: &mut App) {
    let tokens = ThemeTokens::from_theme(&app.config.theme);
    let week_name = app.current_week().map(|w| w.name.clone()).unwrap_or_default();
    let Some(editor) = app.notes_editor.as_mut() else {
        return;
    };
    let area = centered_rect(90, 85, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    editor.textarea.set_block(
        Block::default()
            .title(format!(" {week_name} notes · Ctrl+S: save · Esc: cancel "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(tokens.border_selected)),
    );
    editor
        .textarea
        .set_cursor_line_style(Style::default().bg(tokens.highlight));
    f.render_widget(&editor.textarea, chunks[0]);

    let preview_text = editor.textarea.lines().join("\n");
    let preview = Paragraph::new(markdown_lines(&preview_text))
        .block(
            Block::default()
                .title(" Preview ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(tokens.border_default)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(preview, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::help_sections;
    use crate::app::tests::test_app;

    #[test]
    fn help_lists_configured_keys() {
        let (mut app, _dir) = test_app();
        app.config.keybindings.board.copy_day = vec!["c".to_string()];
        let sections = help_sections(&app);
        let board = &sections[0].1;
        assert!(board.iter().any(|(keys, label)| keys == "c" && *label == "Copy day"));
        assert!(sections.iter().any(|(title, _)| *title == "Sync & data"));
    }
}
