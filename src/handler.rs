use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, Focus, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(
    app: &mut App,
    event: AppEvent,
    tx: &UnboundedSender<AppEvent>,
) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse, tx),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Session(event) => app.dispatch(event),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key, tx),
        InputMode::Editing => handle_editing_mode(app, key).await,
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.focus_next(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.focus_prev(),

        // Edit the focused path
        KeyCode::Char('i') | KeyCode::Char('e') => {
            if app.focus.document().is_some() {
                app.input_mode = InputMode::Editing;
            }
        }

        KeyCode::Enter => match app.focus.document() {
            Some(_) => app.input_mode = InputMode::Editing,
            None => app.submit(tx.clone()),
        },

        KeyCode::Char('g') => app.submit(tx.clone()),

        // Progress list scrolling
        KeyCode::Char('J') | KeyCode::PageDown => app.scroll_progress_down(),
        KeyCode::Char('K') | KeyCode::PageUp => app.scroll_progress_up(),

        _ => {}
    }
}

async fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let Some(kind) = app.focus.document() else {
        app.input_mode = InputMode::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.select_file(kind).await;
            if app.status.is_none() {
                app.focus_next();
            }
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus_next();
        }
        KeyCode::Backspace => {
            let input = app.input_mut(kind);
            if input.cursor > 0 {
                input.cursor -= 1;
                let byte_pos = char_to_byte_index(&input.value, input.cursor);
                input.value.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let input = app.input_mut(kind);
            if input.cursor < input.value.chars().count() {
                let byte_pos = char_to_byte_index(&input.value, input.cursor);
                input.value.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            let input = app.input_mut(kind);
            input.cursor = input.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let input = app.input_mut(kind);
            input.cursor = (input.cursor + 1).min(input.value.chars().count());
        }
        KeyCode::Home => {
            app.input_mut(kind).cursor = 0;
        }
        KeyCode::End => {
            let input = app.input_mut(kind);
            input.cursor = input.value.chars().count();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let input = app.input_mut(kind);
            input.value.clear();
            input.cursor = 0;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let input = app.input_mut(kind);
            let byte_pos = char_to_byte_index(&input.value, input.cursor);
            input.value.insert(byte_pos, c);
            input.cursor += 1;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, tx: &UnboundedSender<AppEvent>) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let (x, y) = (mouse.column, mouse.row);
            if app.proposal_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.focus = Focus::Proposal;
                app.input_mode = InputMode::Editing;
            } else if app.financial_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.focus = Focus::Financial;
                app.input_mode = InputMode::Editing;
            } else if app.submit_area.is_some_and(|r| point_in_rect(x, y, r)) {
                app.focus = Focus::Submit;
                app.input_mode = InputMode::Normal;
                app.submit(tx.clone());
            }
        }
        MouseEventKind::ScrollDown => app.scroll_progress_down(),
        MouseEventKind::ScrollUp => app.scroll_progress_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use quotation_client::{QuotationClient, ResponseMode};
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        App::new(QuotationClient::new(
            "http://127.0.0.1:9",
            ResponseMode::Buffered,
            Duration::from_secs(1),
        ))
    }

    #[test]
    fn byte_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("résumé.pdf", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn typing_edits_focused_path() {
        let mut app = app();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('i'))), &tx).await.unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "a.pdx".chars() {
            handle_event(&mut app, AppEvent::Key(key(KeyCode::Char(c))), &tx).await.unwrap();
        }
        handle_event(&mut app, AppEvent::Key(key(KeyCode::Backspace)), &tx).await.unwrap();
        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('f'))), &tx).await.unwrap();
        assert_eq!(app.proposal_input.value, "a.pdf");
        assert_eq!(app.proposal_input.cursor, 5);
        assert!(app.financial_input.value.is_empty());
    }

    #[tokio::test]
    async fn control_chords_do_not_insert_text() {
        let mut app = app();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let ctrl = |c| KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(c))
        };

        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('i'))), &tx).await.unwrap();
        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('x'))), &tx).await.unwrap();
        handle_event(&mut app, AppEvent::Key(ctrl('a')), &tx).await.unwrap();
        assert_eq!(app.proposal_input.value, "x");
        assert_eq!(app.proposal_input.cursor, 1);
        assert_eq!(app.input_mode, InputMode::Editing);

        // Shifted characters are still typed.
        let shifted = KeyEvent {
            modifiers: KeyModifiers::SHIFT,
            ..key(KeyCode::Char('Y'))
        };
        handle_event(&mut app, AppEvent::Key(shifted), &tx).await.unwrap();
        assert_eq!(app.proposal_input.value, "xY");

        handle_event(&mut app, AppEvent::Key(ctrl('u')), &tx).await.unwrap();
        assert!(app.proposal_input.value.is_empty());
    }

    #[tokio::test]
    async fn generate_is_ignored_until_both_files_selected() {
        let mut app = app();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        handle_event(&mut app, AppEvent::Key(key(KeyCode::Char('g'))), &tx).await.unwrap();
        assert!(!app.session.request.is_processing());
        assert!(app.request_task.is_none());
    }

    #[tokio::test]
    async fn quit_keys() {
        let mut app = app();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        handle_event(&mut app, AppEvent::Key(ctrl_c), &tx).await.unwrap();
        assert!(app.should_quit);
    }
}
