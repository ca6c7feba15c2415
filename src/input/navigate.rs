use crate::{actions, app::App, config::key_match};
use crossterm::event::KeyEvent;

/// Global bindings are checked first: `shift+h` must win over the board's `h`.
pub fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let global = &app.config.keybindings.global;
    if key_match(&key, &global.quit) {
        app.quit();
    } else if key_match(&key, &global.help) {
        app.show_help_popup = true;
    } else if key_match(&key, &global.fetch) {
        actions::request_fetch(app);
    } else if key_match(&key, &global.save) {
        actions::open_save_dialog(app);
    } else if key_match(&key, &global.remote) {
        app.remote_form = Some(crate::app::RemoteForm::new(&app.remote));
    } else if key_match(&key, &global.data) {
        app.show_data_popup = true;
    } else if key_match(&key, &global.prev_month) {
        app.prev_month();
    } else if key_match(&key, &global.next_month) {
        app.next_month();
    } else if key_match(&key, &global.prev_week) {
        app.prev_week();
    } else if key_match(&key, &global.next_week) {
        app.next_week();
    } else if key_match(&key, &global.weekly_notes) {
        actions::open_weekly_notes(app);
    } else {
        handle_board_keys(app, key);
    }
}

fn handle_board_keys(app: &mut App, key: KeyEvent) {
    let board = &app.config.keybindings.board;
    if key_match(&key, &board.left) {
        app.move_day(false);
    } else if key_match(&key, &board.right) {
        app.move_day(true);
    } else if key_match(&key, &board.up) {
        app.move_task(false);
    } else if key_match(&key, &board.down) {
        app.move_task(true);
    } else if key_match(&key, &board.add) {
        actions::add_task(app);
    } else if key_match(&key, &board.toggle) {
        actions::toggle_task(app);
    } else if key_match(&key, &board.edit) {
        actions::start_edit_task(app);
    } else if key_match(&key, &board.delete) {
        actions::request_delete_task(app);
    } else if key_match(&key, &board.copy_day) {
        actions::copy_day(app);
    } else if key_match(&key, &board.paste_day) {
        actions::paste_day(app);
    } else if key_match(&key, &board.open_url) {
        actions::open_task_urls(app);
    }
}
