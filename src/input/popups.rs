use crate::{actions, app::App, config::key_match};
use crossterm::event::{KeyCode, KeyEvent};

/// Routes keys to the topmost open popup. Returns true when a popup consumed
/// the key.
pub fn handle_popup_events(app: &mut App, key: KeyEvent) -> bool {
    if app.show_help_popup {
        if key.code == KeyCode::Esc || key_match(&key, &app.config.keybindings.global.help) {
            app.show_help_popup = false;
        }
        return true;
    }
    if app.show_fetch_confirm {
        handle_fetch_confirm(app, key);
        return true;
    }
    if app.paste_target.is_some() {
        handle_paste_confirm(app, key);
        return true;
    }
    if app.delete_target.is_some() {
        handle_delete_confirm(app, key);
        return true;
    }
    if app.show_save_popup {
        handle_save_popup(app, key);
        return true;
    }
    if app.remote_form.is_some() {
        handle_remote_form(app, key);
        return true;
    }
    if app.show_clear_confirm {
        handle_clear_confirm(app, key);
        return true;
    }
    if app.import_input.is_some() {
        handle_import_input(app, key);
        return true;
    }
    if app.show_data_popup {
        handle_data_popup(app, key);
        return true;
    }
    false
}

enum Answer {
    Yes,
    No,
    Other,
}

fn answer(app: &App, key: &KeyEvent) -> Answer {
    if key_match(key, &app.config.keybindings.popup.confirm) {
        Answer::Yes
    } else if key_match(key, &app.config.keybindings.popup.cancel) || key.code == KeyCode::Esc {
        Answer::No
    } else {
        Answer::Other
    }
}

fn handle_fetch_confirm(app: &mut App, key: KeyEvent) {
    match answer(app, &key) {
        Answer::Yes => {
            app.show_fetch_confirm = false;
            actions::start_fetch(app);
        }
        Answer::No => app.show_fetch_confirm = false,
        Answer::Other => {}
    }
}

fn handle_paste_confirm(app: &mut App, key: KeyEvent) {
    match answer(app, &key) {
        Answer::Yes => {
            if let Some(at) = app.paste_target.take() {
                actions::execute_paste(app, at);
            }
        }
        Answer::No => app.paste_target = None,
        Answer::Other => {}
    }
}

fn handle_delete_confirm(app: &mut App, key: KeyEvent) {
    match answer(app, &key) {
        Answer::Yes => actions::confirm_delete_task(app),
        Answer::No => app.delete_target = None,
        Answer::Other => {}
    }
}

fn handle_save_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') | KeyCode::Enter => actions::start_save(app, false),
        KeyCode::Char('d') => actions::start_save(app, true),
        KeyCode::Esc | KeyCode::Char('n') => app.show_save_popup = false,
        _ => {}
    }
}

fn handle_remote_form(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.remote_form = None,
        KeyCode::Enter => actions::submit_remote_form(app),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            if let Some(form) = app.remote_form.as_mut() {
                form.toggle_focus();
            }
        }
        _ => {
            if let Some(form) = app.remote_form.as_mut() {
                form.active_mut().input(key);
            }
        }
    }
}

fn handle_data_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') => actions::export_backup(app),
        KeyCode::Char('i') => actions::start_import(app),
        KeyCode::Char('c') => app.show_clear_confirm = true,
        KeyCode::Esc | KeyCode::Char('q') => app.show_data_popup = false,
        _ => {}
    }
}

fn handle_import_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.import_input = None,
        KeyCode::Enter => actions::submit_import(app),
        _ => {
            if let Some(input) = app.import_input.as_mut() {
                input.input(key);
            }
        }
    }
}

fn handle_clear_confirm(app: &mut App, key: KeyEvent) {
    match answer(app, &key) {
        Answer::Yes => actions::confirm_clear_data(app),
        Answer::No => app.show_clear_confirm = false,
        Answer::Other => {}
    }
}
