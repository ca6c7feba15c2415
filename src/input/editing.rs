use crate::{
    actions,
    app::App,
    config::{EditorBindings, key_match},
    editor::format,
    models::{EditorTarget, InputMode, TaskField},
};
use crossterm::event::KeyEvent;
use tui_textarea::TextArea;

pub fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.editor_target() {
        Some(EditorTarget::Task) => handle_task_editor(app, key),
        Some(EditorTarget::WeeklyNotes) => handle_notes_editor(app, key),
        None => app.transition_to(InputMode::Navigate),
    }
}

fn handle_task_editor(app: &mut App, key: KeyEvent) {
    let bindings = app.config.keybindings.editor.clone();
    if key_match(&key, &bindings.submit) {
        actions::submit_task_editor(app);
        return;
    }
    if key_match(&key, &bindings.cancel) {
        app.transition_to(InputMode::Navigate);
        return;
    }

    let Some(editor) = app.task_editor.as_mut() else {
        return;
    };
    if key_match(&key, &bindings.next_field) {
        editor.next_field();
        return;
    }
    if key_match(&key, &bindings.prev_field) {
        editor.prev_field();
        return;
    }

    let field = editor.field;
    let Some(textarea) = editor.active_mut() else {
        return;
    };
    // Only notes may span lines.
    if field == TaskField::Notes {
        edit_markdown(textarea, &bindings, key);
    } else if !key_match(&key, &bindings.newline) {
        textarea.input(key);
    }
}

fn handle_notes_editor(app: &mut App, key: KeyEvent) {
    let bindings = app.config.keybindings.editor.clone();
    if key_match(&key, &bindings.submit) {
        actions::submit_weekly_notes(app);
        return;
    }
    if key_match(&key, &bindings.cancel) {
        app.transition_to(InputMode::Navigate);
        return;
    }
    if let Some(editor) = app.notes_editor.as_mut() {
        edit_markdown(&mut editor.textarea, &bindings, key);
    }
}

/// Formatting shortcuts mirror the markers `markdown::render_html` knows.
fn edit_markdown(textarea: &mut TextArea, bindings: &EditorBindings, key: KeyEvent) {
    if key_match(&key, &bindings.newline) {
        format::insert_newline_continuing_list(textarea);
    } else if key_match(&key, &bindings.bold) {
        format::wrap_inline(textarea, "**");
    } else if key_match(&key, &bindings.italic) {
        format::wrap_inline(textarea, "*");
    } else if key_match(&key, &bindings.underline) {
        format::wrap_inline(textarea, "__");
    } else if key_match(&key, &bindings.code) {
        format::wrap_inline(textarea, "`");
    } else if key_match(&key, &bindings.quote) {
        format::prefix_line(textarea, "> ");
    } else if key_match(&key, &bindings.bullet) {
        format::prefix_line(textarea, "- ");
    } else if key_match(&key, &bindings.numbered) {
        format::prefix_line(textarea, "1. ");
    } else {
        textarea.input(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_editing_mode(app, KeyEvent::new(code, modifiers));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn enter_does_not_split_single_line_fields() {
        let (mut app, _dir) = test_app();
        actions::add_task(&mut app);
        actions::start_edit_task(&mut app);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        type_text(&mut app, "!");
        press(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(app.input_mode, InputMode::Navigate);
        assert_eq!(app.selected_task().unwrap().text, "New task!");
    }

    #[test]
    fn notes_editor_supports_formatting_and_lists() {
        let (mut app, _dir) = test_app();
        actions::open_weekly_notes(&mut app);
        press(&mut app, KeyCode::Char('l'), KeyModifiers::ALT);
        type_text(&mut app, "one");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('b'), KeyModifiers::ALT);
        type_text(&mut app, "two");
        press(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(app.weekly_notes(), "- one\n- **two**");
    }

    #[test]
    fn cancel_discards_edits() {
        let (mut app, _dir) = test_app();
        actions::open_weekly_notes(&mut app);
        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);

        assert_eq!(app.input_mode, InputMode::Navigate);
        assert!(app.notes_editor.is_none());
        assert_eq!(app.weekly_notes(), "");
    }
}
