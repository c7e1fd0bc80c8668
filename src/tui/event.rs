//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes.
//! Key behavior depends on which panel has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Handles a keyboard event and updates the app state accordingly.
///
/// Returns `true` if the application should quit, `false` otherwise.
///
/// # Event Handling
///
/// - `q`: Quit application (outside the search input)
/// - `Ctrl+C`: Quit application (from any focus state)
/// - `Tab`: Cycle focus between panels
/// - `Esc`: Return to search input focus
/// - When `SearchInput` focused: character input updates filter buffer
/// - When `NoteList` focused: j/k navigation, Enter opens the detail view
/// - When `DetailView` focused: j/k scroll, n/p pick a link, Enter follows
///   it, b goes back
///
/// # Examples
///
/// ```
/// use lore::tui::{App, event::handle_key_event};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// app.next_focus();
/// let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
/// let should_quit = handle_key_event(&mut app, key);
/// assert!(should_quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // Titles contain q, so it only quits outside the search input.
    if key.code == KeyCode::Char('q')
        && key.modifiers.is_empty()
        && app.focus() != Focus::SearchInput
    {
        return true;
    }

    // Global focus cycling with Tab / Shift+Tab (BackTab)
    if key.code == KeyCode::Tab {
        app.next_focus();
        return false;
    }
    if key.code == KeyCode::BackTab {
        app.prev_focus();
        return false;
    }

    // Global Esc - return to search input
    if key.code == KeyCode::Esc {
        app.reset_focus();
        app.clear_selection();
        return false;
    }

    // Focus-specific handling
    match app.focus() {
        Focus::SearchInput => handle_search_input(app, key),
        Focus::NoteList => handle_note_list(app, key),
        Focus::DetailView => handle_detail_view(app, key),
    }

    false
}

/// Handles keyboard input when search input is focused.
///
/// Accepts character input and backspace for editing the filter buffer.
/// Changes mark the filter as pending search (debounced in event loop).
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_search_char(c);
        }
        KeyCode::Backspace => {
            app.pop_search_char();
        }
        KeyCode::Enter => {
            app.next_focus();
        }
        _ => {}
    }
}

/// Handles keyboard input when note list is focused.
fn handle_note_list(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
        }
        KeyCode::Enter if app.selected_note().is_some() => {
            app.next_focus();
        }
        _ => {}
    }
}

/// Handles keyboard input when detail view is focused.
fn handle_detail_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_detail_down(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_detail_up(1);
        }
        KeyCode::Char('n') => {
            app.next_link();
        }
        KeyCode::Char('p') => {
            app.previous_link();
        }
        KeyCode::Enter => {
            app.follow_link();
        }
        KeyCode::Char('b') | KeyCode::Backspace => {
            app.go_back();
        }
        _ => {}
    }
}
