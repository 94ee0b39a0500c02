use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use crate::app::{App, FocusPane, InputMode};
use crate::backend::BackendCommand;
use crate::config::Config;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Route one event through the app. Key presses that start a backend
/// request hand the command back to the caller for dispatch.
pub fn handle_event(app: &mut App, event: AppEvent) -> Result<Option<BackendCommand>> {
    match event {
        AppEvent::Key(key) => return handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::UploadDone { result } => {
            app.absorb_upload(result);
        }
        AppEvent::AskDone { generation, result } => {
            app.absorb_ask(generation, result);
        }
    }
    Ok(None)
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<Option<BackendCommand>> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(None);
    }

    // The upload prompt captures the keyboard while it is open
    if app.upload.prompt_open {
        return Ok(handle_upload_prompt(app, key));
    }

    match app.input_mode {
        InputMode::Normal => {
            handle_normal_mode(app, key);
            Ok(None)
        }
        InputMode::Editing => Ok(handle_editing_mode(app, key)),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Enter editing mode on the question input
        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => match app.focus {
            FocusPane::Sources => app.sources.toggle_selected(),
            _ => {
                app.focus = FocusPane::Input;
                app.input_mode = InputMode::Editing;
            }
        },
        KeyCode::Char(' ') => {
            if app.focus == FocusPane::Sources {
                app.sources.toggle_selected();
            }
        }

        // Document upload prompt
        KeyCode::Char('o') => app.upload.open_prompt(),

        // Sidebar, theme, fresh conversation
        KeyCode::Char('s') => {
            app.sidebar.toggle();
            if app.sidebar.is_collapsed() && app.focus == FocusPane::Sources {
                app.focus = FocusPane::Chat;
            }
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            let _ = Config::save_theme(app.theme.name());
        }
        KeyCode::Char('n') => app.new_conversation(),

        // Focus cycling
        KeyCode::Tab => cycle_focus(app),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Sources => app.sources.select_next(),
            _ => app.chat_scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Sources => app.sources.select_prev(),
            _ => app.chat_scroll_up(),
        },
        KeyCode::Char('g') => {
            if app.focus != FocusPane::Sources {
                app.chat_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if app.focus != FocusPane::Sources {
                app.scroll_chat_to_bottom();
            }
        }

        _ => {}
    }
}

fn cycle_focus(app: &mut App) {
    app.focus = match app.focus {
        FocusPane::Chat => FocusPane::Input,
        FocusPane::Input => {
            if app.sidebar.is_collapsed() {
                FocusPane::Chat
            } else {
                FocusPane::Sources
            }
        }
        FocusPane::Sources => FocusPane::Chat,
    };
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) -> Option<BackendCommand> {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            None
        }
        KeyCode::Enter => app.submit_question(),
        KeyCode::Char(c) => {
            let byte_idx = char_to_byte_index(&app.question_input, app.question_cursor);
            app.question_input.insert(byte_idx, c);
            app.question_cursor += 1;
            None
        }
        KeyCode::Backspace => {
            if app.question_cursor > 0 {
                app.question_cursor -= 1;
                let byte_idx = char_to_byte_index(&app.question_input, app.question_cursor);
                app.question_input.remove(byte_idx);
            }
            None
        }
        KeyCode::Delete => {
            if app.question_cursor < app.question_input.chars().count() {
                let byte_idx = char_to_byte_index(&app.question_input, app.question_cursor);
                app.question_input.remove(byte_idx);
            }
            None
        }
        KeyCode::Left => {
            app.question_cursor = app.question_cursor.saturating_sub(1);
            None
        }
        KeyCode::Right => {
            let max = app.question_input.chars().count();
            app.question_cursor = (app.question_cursor + 1).min(max);
            None
        }
        KeyCode::Home => {
            app.question_cursor = 0;
            None
        }
        KeyCode::End => {
            app.question_cursor = app.question_input.chars().count();
            None
        }
        _ => None,
    }
}

fn handle_upload_prompt(app: &mut App, key: KeyEvent) -> Option<BackendCommand> {
    match key.code {
        KeyCode::Esc => {
            app.upload.close_prompt();
            None
        }
        KeyCode::Enter => {
            let command = app.upload.submit(&mut app.conversation);
            app.scroll_chat_to_bottom();
            command
        }
        KeyCode::Char(c) => {
            let byte_idx = char_to_byte_index(&app.upload.path_input, app.upload.path_cursor);
            app.upload.path_input.insert(byte_idx, c);
            app.upload.path_cursor += 1;
            None
        }
        KeyCode::Backspace => {
            if app.upload.path_cursor > 0 {
                app.upload.path_cursor -= 1;
                let byte_idx = char_to_byte_index(&app.upload.path_input, app.upload.path_cursor);
                app.upload.path_input.remove(byte_idx);
            }
            None
        }
        KeyCode::Delete => {
            if app.upload.path_cursor < app.upload.path_input.chars().count() {
                let byte_idx = char_to_byte_index(&app.upload.path_input, app.upload.path_cursor);
                app.upload.path_input.remove(byte_idx);
            }
            None
        }
        KeyCode::Left => {
            app.upload.path_cursor = app.upload.path_cursor.saturating_sub(1);
            None
        }
        KeyCode::Right => {
            let max = app.upload.path_input.chars().count();
            app.upload.path_cursor = (app.upload.path_cursor + 1).min(max);
            None
        }
        KeyCode::Home => {
            app.upload.path_cursor = 0;
            None
        }
        KeyCode::End => {
            app.upload.path_cursor = app.upload.path_input.chars().count();
            None
        }
        _ => None,
    }
}

fn hit(area: Option<Rect>, column: u16, row: u16) -> bool {
    area.map(|rect| rect.contains(Position::new(column, row)))
        .unwrap_or(false)
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            if hit(app.sources_area, mouse.column, mouse.row) {
                app.sources.select_prev();
            } else {
                app.chat_scroll_up();
            }
        }
        MouseEventKind::ScrollDown => {
            if hit(app.sources_area, mouse.column, mouse.row) {
                app.sources.select_next();
            } else {
                app.chat_scroll_down();
            }
        }
        _ => {}
    }
}
