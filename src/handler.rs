use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, FocusPane, InputMode, Screen};
use crate::api::FileKind;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Agents => handle_agents_normal(app, key),
        Screen::Detail => handle_detail_normal(app, key),
    }
}

fn handle_agents_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.agents_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.agents_nav_up(),

        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            app.open_selected_agent();
        }

        KeyCode::Char('r') => app.start_load_agents(),

        _ => {}
    }
}

fn handle_detail_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the agents screen; the transcript does not survive this.
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            app.leave_detail();
        }

        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Chat => FocusPane::Files,
                FocusPane::Files => FocusPane::Chat,
            };
        }

        // Start typing a prompt
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }

        // Upload path prompt
        KeyCode::Char('u') => {
            app.show_upload_prompt = true;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('r') => {
            app.start_refresh_files(FileKind::Uploads);
            app.start_refresh_files(FileKind::Outputs);
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Chat => app.scroll_chat_down(),
            FocusPane::Files => app.files_nav_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Chat => app.scroll_chat_up(),
            FocusPane::Files => app.files_nav_up(),
        },

        KeyCode::Char('s') => {
            if app.focus == FocusPane::Files {
                app.toggle_files_section();
            }
        }

        KeyCode::Enter => {
            if app.focus == FocusPane::Files {
                app.start_download();
            } else {
                app.input_mode = InputMode::Editing;
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if app.show_upload_prompt {
        handle_upload_editing(app, key);
    } else {
        handle_chat_editing(app, key);
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // Submitting keeps the input focused for the next prompt.
        KeyCode::Enter => {
            app.start_send();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_upload_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_upload_prompt = false;
            app.upload_input.clear();
            app.upload_cursor = 0;
            app.input_mode = InputMode::Normal;
        }
        // The prompt stays open until the upload reports back, so a failed
        // path can be corrected and retried.
        KeyCode::Enter => {
            app.start_upload();
        }
        KeyCode::Backspace => {
            if app.upload_cursor > 0 {
                app.upload_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.upload_input, app.upload_cursor);
                app.upload_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.upload_cursor = app.upload_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.upload_input.chars().count();
            app.upload_cursor = (app.upload_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.upload_cursor = 0;
        }
        KeyCode::End => {
            app.upload_cursor = app.upload_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.upload_input, app.upload_cursor);
            app.upload_input.insert(byte_pos, c);
            app.upload_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Agent, FoundryClient};
    use crate::app::AppUpdate;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = FoundryClient::new("http://localhost:8000");
        let mut app = App::new(client, tx, PathBuf::from("."));
        app.agents = vec![Agent {
            name: "Researcher".to_string(),
            slug: "researcher".to_string(),
            description: "Looks things up".to_string(),
        }];
        app.agents_state.select(Some(0));
        (app, rx)
    }

    #[tokio::test]
    async fn enter_opens_the_selected_agent() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Detail);
        assert_eq!(app.agent.as_ref().unwrap().slug, "researcher");
    }

    #[tokio::test]
    async fn escape_from_detail_returns_to_agents() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Agents);
    }

    #[tokio::test]
    async fn typed_characters_land_at_the_cursor() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "héllo".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input, "hélo");
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_any_mode() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('i')));
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
