use std::time::Instant;

use crate::links::{self, Segment};
use crate::models::{Note, NoteId, ReferenceEdge};
use crate::search::{self, SearchFilters};

/// Application state for the TUI.
///
/// Manages the note list, selection, search input, panel focus and link
/// navigation inside the detail view.
#[derive(Debug, Clone)]
pub struct App {
    /// All loaded notes in list order (unfiltered, used when the filter is empty)
    all_notes: Vec<Note>,
    /// The same notes in creation order, which is what links resolve against
    snapshot: Vec<Note>,
    /// Currently displayed notes (search results or all notes)
    notes: Vec<Note>,
    /// Currently selected note index (None if no selection)
    selected_index: Option<usize>,
    /// Filter input buffer
    search_input: String,
    /// Currently focused panel
    focus: Focus,
    /// When the filter was last changed (for debouncing search)
    search_changed_at: Option<Instant>,
    /// Whether we need to run a search (filter changed but not yet searched)
    search_pending: bool,
    /// Scroll offset for detail view
    detail_scroll: u16,
    /// Index of the highlighted link among the selected note's links
    link_cursor: Option<usize>,
    /// Notes visited before following links, most recent last
    history: Vec<NoteId>,
    /// Reference panels for the selected note
    references: Option<References>,
}

/// Persisted reference edges of one note, as shown in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct References {
    pub note: NoteId,
    pub outgoing: Vec<ReferenceEdge>,
    pub incoming: Vec<ReferenceEdge>,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Filter input bar is focused (typing updates filter buffer and filters notes)
    SearchInput,
    /// Note list panel is focused (j/k navigation)
    NoteList,
    /// Detail view panel is focused (scrolling and link navigation)
    DetailView,
}

impl App {
    /// Creates a new App with default state.
    ///
    /// Default focus is `SearchInput`.
    /// Notes list is empty, selection is None, filter input is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::tui::App;
    ///
    /// let app = App::new();
    /// assert!(app.notes().is_empty());
    /// assert_eq!(app.selected_index(), None);
    /// ```
    pub fn new() -> Self {
        Self {
            all_notes: Vec::new(),
            snapshot: Vec::new(),
            notes: Vec::new(),
            selected_index: None,
            search_input: String::new(),
            focus: Focus::SearchInput,
            search_changed_at: None,
            search_pending: false,
            detail_scroll: 0,
            link_cursor: None,
            history: Vec::new(),
            references: None,
        }
    }

    /// Returns the currently displayed (filtered) notes.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns all loaded notes (unfiltered).
    pub fn all_notes(&self) -> &[Note] {
        &self.all_notes
    }

    /// Returns every loaded note in creation order, for link resolution.
    pub fn snapshot(&self) -> &[Note] {
        &self.snapshot
    }

    /// Returns the currently selected note index.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    /// Returns the filter input buffer.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Returns the current focus state.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Sets the notes list and resets selection to None.
    ///
    /// Used when loading notes from the database. `notes` should be in list
    /// order; the creation-order snapshot is derived from it.
    pub fn set_notes(&mut self, notes: Vec<Note>) {
        let mut snapshot = notes.clone();
        snapshot.sort_by_key(Note::id);
        self.snapshot = snapshot;
        self.all_notes = notes.clone();
        self.notes = notes;
        self.reset_selection();
        // Apply current filter if any
        if !self.search_input.is_empty() {
            self.apply_filter();
        }
    }

    /// Applies the current filter to notes.
    ///
    /// Matches `search_input` against titles, content and tags,
    /// case-insensitively. Resets selection when the filter changes.
    pub fn apply_filter(&mut self) {
        let filters = SearchFilters {
            query: self.search_input.clone(),
            ..Default::default()
        };
        self.notes = search::search_and_filter(&self.all_notes, &filters)
            .into_iter()
            .cloned()
            .collect();

        self.reset_selection();
    }

    /// Returns the currently selected note, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::tui::App;
    /// use lore::{NoteBuilder, NoteId};
    ///
    /// let mut app = App::new();
    /// let note = NoteBuilder::new()
    ///     .id(NoteId::new(1))
    ///     .title("Goblin Camp")
    ///     .build();
    /// app.set_notes(vec![note]);
    /// app.select_next();
    ///
    /// assert_eq!(app.selected_note().unwrap().title(), "Goblin Camp");
    /// ```
    pub fn selected_note(&self) -> Option<&Note> {
        self.selected_index.and_then(|i| self.notes.get(i))
    }

    /// Renders the selected note's content against the snapshot.
    pub fn selected_segments(&self) -> Vec<Segment<'_>> {
        match self.selected_note() {
            Some(note) => links::render_lines(note.content(), &self.snapshot),
            None => Vec::new(),
        }
    }

    /// Cycles focus to the next panel in Tab order.
    ///
    /// Order: `SearchInput` -> `NoteList` -> `DetailView` -> `SearchInput`
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::tui::{App, Focus};
    ///
    /// let mut app = App::new();
    /// assert_eq!(app.focus(), Focus::SearchInput);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::NoteList);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::DetailView);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::SearchInput);
    /// ```
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::SearchInput => Focus::NoteList,
            Focus::NoteList => Focus::DetailView,
            Focus::DetailView => Focus::SearchInput,
        };
        self.auto_select_on_note_list_focus();
    }

    /// Cycles focus to the previous panel in reverse Tab order.
    ///
    /// Order: `SearchInput` -> `DetailView` -> `NoteList` -> `SearchInput`
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::SearchInput => Focus::DetailView,
            Focus::NoteList => Focus::SearchInput,
            Focus::DetailView => Focus::NoteList,
        };
        self.auto_select_on_note_list_focus();
    }

    /// Auto-selects first note when entering NoteList focus with no selection.
    fn auto_select_on_note_list_focus(&mut self) {
        if self.focus == Focus::NoteList && self.selected_index.is_none() && !self.notes.is_empty()
        {
            self.select_index(0);
        }
    }

    /// Moves selection down in the notes list (j key navigation).
    ///
    /// If no selection, selects first note.
    /// If at end of list, wraps to beginning.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::tui::App;
    /// use lore::{NoteBuilder, NoteId};
    ///
    /// let mut app = App::new();
    /// let notes = vec![
    ///     NoteBuilder::new().id(NoteId::new(1)).title("One").build(),
    ///     NoteBuilder::new().id(NoteId::new(2)).title("Two").build(),
    /// ];
    /// app.set_notes(notes);
    ///
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(0));
    ///
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(1));
    ///
    /// app.select_next(); // Wraps to beginning
    /// assert_eq!(app.selected_index(), Some(0));
    /// ```
    pub fn select_next(&mut self) {
        if self.notes.is_empty() {
            self.reset_selection();
            return;
        }

        let next = match self.selected_index {
            None => 0,
            Some(i) if i + 1 >= self.notes.len() => 0,
            Some(i) => i + 1,
        };
        self.select_index(next);
    }

    /// Moves selection up in the notes list (k key navigation).
    ///
    /// If no selection, selects last note.
    /// If at beginning of list, wraps to end.
    pub fn select_previous(&mut self) {
        if self.notes.is_empty() {
            self.reset_selection();
            return;
        }

        let previous = match self.selected_index {
            None | Some(0) => self.notes.len() - 1,
            Some(i) => i - 1,
        };
        self.select_index(previous);
    }

    fn select_index(&mut self, index: usize) {
        self.selected_index = Some(index);
        self.detail_scroll = 0;
        self.link_cursor = None;
    }

    fn reset_selection(&mut self) {
        self.selected_index = None;
        self.detail_scroll = 0;
        self.link_cursor = None;
    }

    /// Returns the current detail view scroll offset.
    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    /// Scrolls the detail view down by the specified amount.
    pub fn scroll_detail_down(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(amount);
    }

    /// Scrolls the detail view up by the specified amount.
    pub fn scroll_detail_up(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }

    /// Returns which link in the detail view is highlighted.
    ///
    /// Counts resolved and broken links alike, in reading order.
    pub fn link_cursor(&self) -> Option<usize> {
        self.link_cursor
    }

    fn link_count(&self) -> usize {
        self.selected_segments()
            .iter()
            .filter(|segment| segment.is_link())
            .count()
    }

    /// Highlights the next link in the selected note, wrapping at the end.
    pub fn next_link(&mut self) {
        let count = self.link_count();
        self.link_cursor = match (count, self.link_cursor) {
            (0, _) => None,
            (_, None) => Some(0),
            (count, Some(i)) => Some((i + 1) % count),
        };
    }

    /// Highlights the previous link in the selected note, wrapping at the start.
    pub fn previous_link(&mut self) {
        let count = self.link_count();
        self.link_cursor = match (count, self.link_cursor) {
            (0, _) => None,
            (count, None | Some(0)) => Some(count - 1),
            (_, Some(i)) => Some(i - 1),
        };
    }

    /// Follows the highlighted link to its note.
    ///
    /// Returns `false` when nothing is highlighted or the link is broken.
    /// Following a link clears the search filter if the target is hidden by
    /// it, and remembers the current note for [`App::go_back`].
    pub fn follow_link(&mut self) -> bool {
        let Some(cursor) = self.link_cursor else {
            return false;
        };

        let mut target = None;
        let activated = self
            .selected_segments()
            .iter()
            .filter(|segment| segment.is_link())
            .nth(cursor)
            .is_some_and(|segment| segment.activate(|note| target = Some(note.id())));

        match target {
            Some(id) if activated => {
                if let Some(current) = self.selected_note().map(Note::id) {
                    self.history.push(current);
                }
                self.select_note(id)
            }
            _ => false,
        }
    }

    /// Returns to the note visited before the last followed link.
    pub fn go_back(&mut self) -> bool {
        match self.history.pop() {
            Some(id) => self.select_note(id),
            None => false,
        }
    }

    /// Selects the note with `id`, clearing the filter if it hides the note.
    pub fn select_note(&mut self, id: NoteId) -> bool {
        if !self.notes.iter().any(|note| note.id() == id) {
            self.search_input.clear();
            self.search_pending = false;
            self.notes = self.all_notes.clone();
        }

        match self.notes.iter().position(|note| note.id() == id) {
            Some(index) => {
                self.select_index(index);
                true
            }
            None => false,
        }
    }

    /// Returns the reference panels, if they belong to the selected note.
    pub fn references(&self) -> Option<&References> {
        let selected = self.selected_note()?.id();
        self.references.as_ref().filter(|refs| refs.note == selected)
    }

    /// Returns the selected note if its reference panels still need loading.
    pub fn references_needed(&self) -> Option<NoteId> {
        let selected = self.selected_note()?.id();
        match &self.references {
            Some(refs) if refs.note == selected => None,
            _ => Some(selected),
        }
    }

    /// Stores reference panels loaded for a note.
    pub fn set_references(&mut self, references: References) {
        self.references = Some(references);
    }

    /// Adds a character to the filter input buffer and marks search as pending.
    ///
    /// Used when `SearchInput` is focused and user types.
    /// Sets `search_changed_at` for debouncing.
    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.mark_search_changed();
    }

    /// Removes the last character from the filter input buffer and marks search as pending.
    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.mark_search_changed();
    }

    /// Marks the filter as changed, triggering a debounced search.
    fn mark_search_changed(&mut self) {
        self.search_changed_at = Some(Instant::now());
        self.search_pending = true;
    }

    /// Returns whether a search is pending and enough time has passed (debounce).
    ///
    /// Returns `true` if filter changed and at least `debounce_ms` milliseconds
    /// have passed since the last change.
    pub fn should_search(&self, debounce_ms: u64) -> bool {
        if !self.search_pending {
            return false;
        }
        match self.search_changed_at {
            Some(changed_at) => changed_at.elapsed().as_millis() >= u128::from(debounce_ms),
            None => false,
        }
    }

    /// Clears the search pending flag after a search is executed.
    pub fn clear_search_pending(&mut self) {
        self.search_pending = false;
    }

    /// Clears the selection (Esc key behavior).
    pub fn clear_selection(&mut self) {
        self.reset_selection();
    }

    /// Returns focus to `SearchInput` (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::SearchInput;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
