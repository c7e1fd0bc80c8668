//! Terminal User Interface module for lore.
//!
//! Provides a three-panel TUI with note list, detail view, and search input
//! using ratatui for rendering and crossterm for terminal management. Links in
//! the detail view can be followed from note to note.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::service::{ListNotesOptions, NoteService};

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, References};

/// How long typing must pause before the filter is re-applied.
const SEARCH_DEBOUNCE_MS: u64 = 150;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI,
/// even in error cases, to prevent terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook.
///
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before panicking.
///
/// The original panic hook is preserved and called after restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Polls for keyboard events, updates app state, and re-renders until the
/// user quits. Terminal state is always restored, even on error.
///
/// # Errors
///
/// Returns an error if event polling, rendering, reference loading or
/// terminal operations fail.
pub fn run_event_loop(app: &mut App, service: &NoteService) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, service, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    service: &NoteService,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        if app.should_search(SEARCH_DEBOUNCE_MS) {
            app.apply_filter();
            app.clear_search_pending();
        }
        load_references(app, service)?;

        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
            && event::handle_key_event(app, key)
        {
            break;
        }
    }

    Ok(())
}

/// Loads every note into the App, most recently updated first.
///
/// The whole collection is loaded because links resolve against all of it.
fn load_notes(app: &mut App, service: &NoteService) -> Result<()> {
    let notes = service
        .list_notes(ListNotesOptions::default())
        .context("Failed to load notes")?;

    app.set_notes(notes);
    Ok(())
}

/// Fetches reference panels for the selected note if they are stale.
fn load_references(app: &mut App, service: &NoteService) -> Result<()> {
    if let Some(note) = app.references_needed() {
        let outgoing = service.list_outgoing(note)?;
        let incoming = service.list_incoming(note)?;
        app.set_references(References {
            note,
            outgoing,
            incoming,
        });
    }
    Ok(())
}

/// Entry point for the TUI application.
///
/// Loads notes through `service` and starts the event loop.
///
/// # Errors
///
/// Returns an error if note loading, terminal initialization or the event
/// loop fails.
pub fn run(service: &NoteService) -> Result<()> {
    init_panic_hook();

    let mut app = App::new();
    load_notes(&mut app, service).context("Failed to load notes from database")?;
    tracing::debug!(notes = app.all_notes().len(), "starting tui");

    run_event_loop(&mut app, service).context("TUI event loop failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::service::NewNote;

    fn service() -> NoteService {
        let db = Database::in_memory().expect("failed to create in-memory database");
        NoteService::new(db)
    }

    #[test]
    fn load_notes_populates_app_state() {
        let service = service();
        service
            .create_note(NewNote::new("First"))
            .expect("failed to create note");
        service
            .create_note(NewNote::new("Second"))
            .expect("failed to create note");

        let mut app = App::new();
        load_notes(&mut app, &service).expect("failed to load notes");

        assert_eq!(app.notes().len(), 2);
        assert_eq!(app.snapshot()[0].title(), "First");
    }

    #[test]
    fn load_notes_with_empty_database() {
        let service = service();
        let mut app = App::new();

        let result = load_notes(&mut app, &service);
        assert!(result.is_ok(), "should handle empty database gracefully");
        assert_eq!(app.notes().len(), 0);
    }

    #[test]
    fn load_references_fills_panels_for_selection() {
        let service = service();
        let camp = service.create_note(NewNote::new("Goblin Camp")).unwrap();
        let grukk = service.create_note(NewNote::new("Grukk")).unwrap();
        service.add_reference(camp.id(), grukk.id()).unwrap();

        let mut app = App::new();
        load_notes(&mut app, &service).unwrap();
        app.select_note(camp.id());

        load_references(&mut app, &service).unwrap();

        let refs = app.references().expect("references should be loaded");
        assert_eq!(refs.outgoing.len(), 1);
        assert_eq!(refs.outgoing[0].peer.title, "Grukk");
        assert!(refs.incoming.is_empty());
        assert_eq!(app.references_needed(), None);
    }

    #[test]
    fn workflow_follow_link_between_stored_notes() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let service = service();
        service
            .create_note(NewNote::new("Grukk").content("Lives in [[goblin camp]]"))
            .unwrap();
        service.create_note(NewNote::new("Goblin Camp")).unwrap();

        let mut app = App::new();
        load_notes(&mut app, &service).unwrap();
        for c in "grukk".chars() {
            event::handle_key_event(&mut app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.apply_filter();

        for code in [KeyCode::Tab, KeyCode::Enter, KeyCode::Char('n'), KeyCode::Enter] {
            event::handle_key_event(&mut app, KeyEvent::new(code, KeyModifiers::NONE));
        }

        assert_eq!(app.focus(), Focus::DetailView);
        assert_eq!(app.selected_note().unwrap().title(), "Goblin Camp");
    }
}
