use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lore::config::{self, Config};
use lore::links::{self, InsertError, Segment};
use lore::search::{self, SearchFilters};
use lore::{
    Category, CategoryParseError, Database, FolderId, FolderNode, ListNotesOptions, NewFolder,
    NewNote, Note, NoteId, NoteService, NoteUpdate, ReferenceEdge, ReferenceError, SortOrder,
    ValidationError, folder_tree,
};
use serde_json::json;
use thiserror::Error;

/// lore - campaign notes with [[wiki-link]] cross references
#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Campaign notes with [[wiki-link]] cross references")]
#[command(version)]
struct Cli {
    /// Database file (overrides LORE_DB)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note
    Add(AddCommand),
    /// Show a note with its links resolved
    Show(ShowCommand),
    /// List notes, most recently updated first
    List(ListCommand),
    /// Search titles, content and tags
    Search(SearchCommand),
    /// Change a note's title, content, category or tags
    Edit(EditCommand),
    /// Delete a note and its reference edges
    Delete(DeleteCommand),
    /// Record that one note references another
    Link(EdgeCommand),
    /// Remove a reference edge
    Unlink(EdgeCommand),
    /// Show reference edges from and to a note
    Refs(RefsCommand),
    /// Insert a [[link]] into a note's content
    InsertLink(InsertLinkCommand),
    /// Report links that point at no note
    Check(CheckCommand),
    /// List every tag in use
    Tags,
    /// Create, list, rename and delete folders
    Folder(FolderCommand),
    /// Launch interactive terminal UI
    Tui,
}

#[derive(Args)]
struct AddCommand {
    /// Title of the note, used as its link key
    #[arg(value_name = "TITLE")]
    title: String,

    /// Note content; may contain [[Title]] or [[Title|label]] links
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    content: String,

    /// Category (general, npc, location, quest, session, item, lore, pantheon)
    #[arg(short = 'k', long, value_name = "CATEGORY", default_value = "general")]
    category: Category,

    /// Comma-separated tags
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Folder to file the note in
    #[arg(long, value_name = "FOLDER")]
    folder: Option<FolderId>,
}

#[derive(Args)]
struct ShowCommand {
    #[arg(value_name = "ID")]
    id: NoteId,
}

#[derive(Args)]
struct ListCommand {
    /// Maximum number of notes to show
    #[arg(short = 'n', long, value_name = "N")]
    limit: Option<usize>,

    /// Only notes in this category
    #[arg(short = 'k', long, value_name = "CATEGORY")]
    category: Option<Category>,

    /// Only notes with this exact tag
    #[arg(short, long, value_name = "TAG")]
    tag: Option<String>,

    /// Only notes filed directly in this folder
    #[arg(long, value_name = "FOLDER")]
    folder: Option<FolderId>,

    /// Least recently updated first
    #[arg(long)]
    oldest_first: bool,
}

#[derive(Args)]
struct SearchCommand {
    /// Text to look for; omit to match everything
    #[arg(value_name = "QUERY", default_value = "")]
    query: String,

    /// Only notes in this category
    #[arg(short = 'k', long, value_name = "CATEGORY")]
    category: Option<Category>,

    /// Only notes with this exact tag
    #[arg(short, long, value_name = "TAG")]
    tag: Option<String>,
}

#[derive(Args)]
struct EditCommand {
    #[arg(value_name = "ID")]
    id: NoteId,

    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    #[arg(short, long, value_name = "TEXT")]
    content: Option<String>,

    #[arg(short = 'k', long, value_name = "CATEGORY")]
    category: Option<Category>,

    /// Comma-separated tags, replacing the current ones
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Move the note into this folder
    #[arg(long, value_name = "FOLDER", conflicts_with = "unfile")]
    folder: Option<FolderId>,

    /// Take the note out of its folder
    #[arg(long)]
    unfile: bool,
}

#[derive(Args)]
struct DeleteCommand {
    #[arg(value_name = "ID")]
    id: NoteId,
}

#[derive(Args)]
struct EdgeCommand {
    /// Note the edge starts from
    #[arg(value_name = "SOURCE")]
    source: NoteId,

    /// Note the edge points at
    #[arg(value_name = "TARGET")]
    target: NoteId,
}

#[derive(Args)]
struct RefsCommand {
    #[arg(value_name = "ID")]
    id: NoteId,
}

#[derive(Args)]
struct InsertLinkCommand {
    /// Note whose content receives the link
    #[arg(value_name = "ID")]
    id: NoteId,

    /// Title of the linked note
    #[arg(value_name = "TITLE")]
    title: String,

    /// Byte offset to insert at; defaults to the end of the content
    #[arg(long, value_name = "OFFSET")]
    at: Option<usize>,

    /// Label shown instead of the title
    #[arg(short, long, value_name = "LABEL")]
    display: Option<String>,
}

#[derive(Args)]
struct CheckCommand {
    /// Only check this note
    #[arg(value_name = "ID")]
    id: Option<NoteId>,
}

#[derive(Args)]
struct FolderCommand {
    #[command(subcommand)]
    action: FolderAction,
}

#[derive(Subcommand)]
enum FolderAction {
    /// Create a folder
    Add(FolderAddCommand),
    /// Show the folder tree
    List,
    /// Rename a folder
    Rename(FolderRenameCommand),
    /// Delete a folder and its subfolders; their notes become unfiled
    Delete(FolderDeleteCommand),
}

#[derive(Args)]
struct FolderAddCommand {
    #[arg(value_name = "NAME")]
    name: String,

    /// Folder to nest the new one under
    #[arg(short, long, value_name = "FOLDER")]
    parent: Option<FolderId>,

    /// Category whose glyph marks the folder
    #[arg(short, long, value_name = "CATEGORY")]
    icon: Option<Category>,
}

#[derive(Args)]
struct FolderRenameCommand {
    #[arg(value_name = "FOLDER")]
    id: FolderId,

    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(Args)]
struct FolderDeleteCommand {
    #[arg(value_name = "FOLDER")]
    id: FolderId,
}

/// Command-level mistakes that are the user's to fix.
#[derive(Debug, Error)]
enum CliError {
    #[error("Note {0} not found")]
    NoteNotFound(NoteId),

    #[error("Folder {0} not found")]
    FolderNotFound(FolderId),

    #[error("Nothing to update: pass --title, --content, --category, --tags, --folder or --unfile")]
    NothingToUpdate,
}

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env(cli.db)?;
    lore::logging::init(cli.verbose, config.log_filter.as_deref());

    config::ensure_database_directory(&config.database_path)?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;
    let service = NoteService::new(db);

    if let Commands::Tui = cli.command {
        return lore::tui::run(&service);
    }

    let output = if cli.json { Output::Json } else { Output::Text };
    let stdout = io::stdout();
    execute(&cli.command, &service, output, &mut stdout.lock())
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input and missing notes. Database failures and I/O
/// errors are internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<ValidationError>()
            || cause.is::<InsertError>()
            || cause.is::<CategoryParseError>()
            || cause.is::<CliError>()
            || matches!(
                cause.downcast_ref::<ReferenceError>(),
                Some(ReferenceError::NoteNotFound(_))
            )
    })
}

/// Runs one non-interactive command against `service`, writing to `out`.
///
/// Separated from `run` to allow testing with in-memory databases.
fn execute(
    command: &Commands,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Add(cmd) => execute_add(cmd, service, output, out),
        Commands::Show(cmd) => execute_show(cmd, service, output, out),
        Commands::List(cmd) => execute_list(cmd, service, output, out),
        Commands::Search(cmd) => execute_search(cmd, service, output, out),
        Commands::Edit(cmd) => execute_edit(cmd, service, output, out),
        Commands::Delete(cmd) => execute_delete(cmd, service, output, out),
        Commands::Link(cmd) => execute_link(cmd, service, output, out),
        Commands::Unlink(cmd) => execute_unlink(cmd, service, output, out),
        Commands::Refs(cmd) => execute_refs(cmd, service, output, out),
        Commands::InsertLink(cmd) => execute_insert_link(cmd, service, output, out),
        Commands::Check(cmd) => execute_check(cmd, service, output, out),
        Commands::Tags => execute_tags(service, output, out),
        Commands::Folder(cmd) => execute_folder(cmd, service, output, out),
        Commands::Tui => Ok(()),
    }
}

fn execute_add(
    cmd: &AddCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let new = NewNote::new(&cmd.title)
        .content(&cmd.content)
        .category(cmd.category)
        .tags(cmd.tags.as_deref().map(parse_tags).unwrap_or_default());
    let new = match cmd.folder {
        Some(folder) => new.folder(folder),
        None => new,
    };

    let note = service.create_note(new).context("Failed to create note")?;

    match output {
        Output::Json => print_json(out, &note),
        Output::Text => {
            write!(out, "Note created (id: {})", note.id())?;
            if !note.tags().is_empty() {
                write!(out, " with tags: {}", note.tags().join(", "))?;
            }
            writeln!(out)?;
            Ok(())
        }
    }
}

fn execute_show(
    cmd: &ShowCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let notes = service.notes_snapshot()?;
    let note = notes
        .iter()
        .find(|note| note.id() == cmd.id)
        .ok_or(CliError::NoteNotFound(cmd.id))?;

    let segments = links::render_lines(note.content(), &notes);
    let outgoing = service.list_outgoing(note.id())?;
    let incoming = service.list_incoming(note.id())?;

    if output == Output::Json {
        return print_json(
            out,
            &json!({
                "note": note,
                "links": links::outgoing_titles(note.content()),
                "segments": segments,
                "references": { "outgoing": outgoing, "incoming": incoming },
            }),
        );
    }

    writeln!(
        out,
        "{} {} (#{}, {})",
        note.category().glyph(),
        note.title(),
        note.id(),
        note.category()
    )?;
    if !note.tags().is_empty() {
        writeln!(out, "tags: {}", note.tags().join(", "))?;
    }
    if let Some(folder_id) = note.folder_id()
        && let Some(folder) = service.get_folder(folder_id)?
    {
        writeln!(out, "folder: {} {}", folder.glyph(), folder.name)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", format_segments(&segments))?;
    write_edges(out, "References", "→", &outgoing)?;
    write_edges(out, "Referenced by", "←", &incoming)?;
    Ok(())
}

/// Flattens segments to terminal text.
///
/// Resolved links show as `label[#id]` and broken ones as `label[?]`.
fn format_segments(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Link { label, note } => format!("{label}[#{}]", note.id()),
            Segment::BrokenLink { label, .. } => format!("{label}[?]"),
            other => other.as_str().to_string(),
        })
        .collect()
}

fn write_edges(
    out: &mut impl Write,
    heading: &str,
    arrow: &str,
    edges: &[ReferenceEdge],
) -> Result<()> {
    if edges.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{heading}:")?;
    for edge in edges {
        writeln!(
            out,
            "  {arrow} {} {} (#{})",
            edge.peer.category.glyph(),
            edge.peer.title,
            edge.peer.id
        )?;
    }
    Ok(())
}

fn execute_list(
    cmd: &ListCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let options = ListNotesOptions {
        limit: cmd.limit,
        category: cmd.category,
        tag: cmd.tag.clone(),
        folder: cmd.folder,
        order: if cmd.oldest_first {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        },
    };

    let notes = service.list_notes(options).context("Failed to list notes")?;
    write_notes(out, output, &notes)
}

fn execute_search(
    cmd: &SearchCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let notes = service.list_notes(ListNotesOptions::default())?;
    let filters = SearchFilters {
        query: cmd.query.clone(),
        category: cmd.category,
        tag: cmd.tag.clone(),
    };

    let found: Vec<Note> = search::search_and_filter(&notes, &filters)
        .into_iter()
        .cloned()
        .collect();
    write_notes(out, output, &found)
}

fn write_notes(out: &mut impl Write, output: Output, notes: &[Note]) -> Result<()> {
    if output == Output::Json {
        return print_json(out, &notes);
    }

    if notes.is_empty() {
        writeln!(out, "No notes found.")?;
        return Ok(());
    }
    for note in notes {
        write!(
            out,
            "#{} {} {}",
            note.id(),
            note.category().glyph(),
            note.title()
        )?;
        if !note.tags().is_empty() {
            write!(out, "  [{}]", note.tags().join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn execute_edit(
    cmd: &EditCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let update = NoteUpdate {
        title: cmd.title.clone(),
        content: cmd.content.clone(),
        category: cmd.category,
        tags: cmd.tags.as_deref().map(parse_tags),
        folder: if cmd.unfile {
            Some(None)
        } else {
            cmd.folder.map(Some)
        },
    };
    if update.is_empty() {
        return Err(CliError::NothingToUpdate.into());
    }

    let note = service
        .update_note(cmd.id, update)
        .context("Failed to update note")?
        .ok_or(CliError::NoteNotFound(cmd.id))?;

    match output {
        Output::Json => print_json(out, &note),
        Output::Text => {
            writeln!(out, "Note {} updated", note.id())?;
            Ok(())
        }
    }
}

fn execute_delete(
    cmd: &DeleteCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    if !service.delete_note(cmd.id)? {
        return Err(CliError::NoteNotFound(cmd.id).into());
    }

    match output {
        Output::Json => print_json(out, &json!({ "deleted": cmd.id })),
        Output::Text => {
            writeln!(out, "Note {} deleted", cmd.id)?;
            Ok(())
        }
    }
}

fn execute_link(
    cmd: &EdgeCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let reference = service.add_reference(cmd.source, cmd.target)?;

    match output {
        Output::Json => print_json(out, &reference),
        Output::Text => {
            writeln!(out, "Note {} now references note {}", cmd.source, cmd.target)?;
            Ok(())
        }
    }
}

fn execute_unlink(
    cmd: &EdgeCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let removed = service.remove_reference(cmd.source, cmd.target)?;

    match output {
        Output::Json => print_json(out, &json!({ "removed": removed })),
        Output::Text if removed == 0 => {
            writeln!(
                out,
                "Note {} did not reference note {}",
                cmd.source, cmd.target
            )?;
            Ok(())
        }
        Output::Text => {
            writeln!(out, "Removed reference from {} to {}", cmd.source, cmd.target)?;
            Ok(())
        }
    }
}

fn execute_refs(
    cmd: &RefsCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let note = service
        .get_note(cmd.id)?
        .ok_or(CliError::NoteNotFound(cmd.id))?;
    let outgoing = service.list_outgoing(note.id())?;
    let incoming = service.list_incoming(note.id())?;

    if output == Output::Json {
        return print_json(out, &json!({ "outgoing": outgoing, "incoming": incoming }));
    }

    if outgoing.is_empty() && incoming.is_empty() {
        writeln!(out, "{} has no references.", note.title())?;
        return Ok(());
    }
    write!(out, "{}", note.title())?;
    write_edges(out, "References", "→", &outgoing)?;
    write_edges(out, "Referenced by", "←", &incoming)?;
    Ok(())
}

fn execute_insert_link(
    cmd: &InsertLinkCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let at = match cmd.at {
        Some(at) => at,
        None => service
            .get_note(cmd.id)?
            .ok_or(CliError::NoteNotFound(cmd.id))?
            .content()
            .len(),
    };

    let (note, cursor) = service
        .insert_link(cmd.id, at, &cmd.title, cmd.display.as_deref())?
        .ok_or(CliError::NoteNotFound(cmd.id))?;

    match output {
        Output::Json => print_json(out, &json!({ "note": note, "cursor": cursor })),
        Output::Text => {
            writeln!(
                out,
                "Inserted {} into note {} (cursor now at {cursor})",
                links::link_literal(&cmd.title, cmd.display.as_deref()),
                note.id()
            )?;
            Ok(())
        }
    }
}

fn execute_check(
    cmd: &CheckCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    let notes = service.notes_snapshot()?;
    if let Some(id) = cmd.id
        && !notes.iter().any(|note| note.id() == id)
    {
        return Err(CliError::NoteNotFound(id).into());
    }

    let mut report = Vec::new();
    for note in notes
        .iter()
        .filter(|note| cmd.id.is_none_or(|id| note.id() == id))
    {
        for link in links::broken_links(note.content(), &notes) {
            report.push(json!({
                "note_id": note.id(),
                "note_title": note.title(),
                "link": link.full_match,
                "title": link.note_title,
                "start": link.start,
                "end": link.end,
            }));
            if output == Output::Text {
                writeln!(
                    out,
                    "#{} {}: {} at {}..{}",
                    note.id(),
                    note.title(),
                    link.full_match,
                    link.start,
                    link.end
                )?;
            }
        }
    }

    match output {
        Output::Json => print_json(out, &report),
        Output::Text if report.is_empty() => {
            writeln!(out, "No broken links.")?;
            Ok(())
        }
        Output::Text => Ok(()),
    }
}

fn execute_tags(service: &NoteService, output: Output, out: &mut impl Write) -> Result<()> {
    let tags = search::available_tags(&service.notes_snapshot()?);

    if output == Output::Json {
        return print_json(out, &tags);
    }
    for tag in tags {
        writeln!(out, "{tag}")?;
    }
    Ok(())
}

fn execute_folder(
    cmd: &FolderCommand,
    service: &NoteService,
    output: Output,
    out: &mut impl Write,
) -> Result<()> {
    match &cmd.action {
        FolderAction::Add(add) => {
            let mut new = NewFolder::new(&add.name);
            new.icon = add.icon;
            new.parent = add.parent;
            let folder = service.create_folder(new).context("Failed to create folder")?;

            match output {
                Output::Json => print_json(out, &folder),
                Output::Text => {
                    writeln!(out, "Folder created (id: {})", folder.id)?;
                    Ok(())
                }
            }
        }
        FolderAction::List => {
            let tree = folder_tree(service.list_folders()?);

            if output == Output::Json {
                return print_json(out, &tree);
            }
            if tree.is_empty() {
                writeln!(out, "No folders.")?;
                return Ok(());
            }
            write_folder_tree(out, &tree, 0)
        }
        FolderAction::Rename(rename) => {
            let folder = service
                .rename_folder(rename.id, &rename.name)
                .context("Failed to rename folder")?
                .ok_or(CliError::FolderNotFound(rename.id))?;

            match output {
                Output::Json => print_json(out, &folder),
                Output::Text => {
                    writeln!(out, "Folder {} renamed to {}", folder.id, folder.name)?;
                    Ok(())
                }
            }
        }
        FolderAction::Delete(delete) => {
            let removed = service.delete_folder(delete.id)?;
            if removed == 0 {
                return Err(CliError::FolderNotFound(delete.id).into());
            }

            match output {
                Output::Json => print_json(
                    out,
                    &json!({ "deleted": delete.id, "removed": removed }),
                ),
                Output::Text => {
                    write!(out, "Folder {} deleted", delete.id)?;
                    if removed > 1 {
                        write!(out, " with {} subfolders", removed - 1)?;
                    }
                    writeln!(out)?;
                    Ok(())
                }
            }
        }
    }
}

fn write_folder_tree(out: &mut impl Write, nodes: &[FolderNode], depth: usize) -> Result<()> {
    for node in nodes {
        writeln!(
            out,
            "{:indent$}{} {} (#{})",
            "",
            node.folder.glyph(),
            node.folder.name,
            node.folder.id,
            indent = depth * 2
        )?;
        write_folder_tree(out, &node.children, depth + 1)?;
    }
    Ok(())
}

fn print_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
