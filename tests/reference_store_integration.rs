//! Integration tests for persisted reference edges.

use anyhow::Result;
use lore::{Database, NewNote, NoteId, NoteService, ReferenceError};
use tempfile::tempdir;

#[test]
fn test_edges_survive_reopening_the_database() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("campaign.db");

    let (camp, grukk) = {
        let service = NoteService::new(Database::open(&path)?);
        let camp = service.create_note(NewNote::new("Goblin Camp"))?;
        let grukk = service.create_note(NewNote::new("Grukk"))?;
        service.add_reference(camp.id(), grukk.id())?;
        (camp.id(), grukk.id())
    };

    let service = NoteService::new(Database::open(&path)?);
    let outgoing = service.list_outgoing(camp)?;
    let incoming = service.list_incoming(grukk)?;

    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].peer.id, grukk);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].peer.id, camp);
    assert_eq!(outgoing[0].reference, incoming[0].reference);
    Ok(())
}

#[test]
fn test_references_are_directed() -> Result<()> {
    let service = NoteService::new(Database::in_memory()?);
    let a = service.create_note(NewNote::new("A"))?;
    let b = service.create_note(NewNote::new("B"))?;

    service.add_reference(a.id(), b.id())?;

    assert_eq!(service.list_outgoing(a.id())?.len(), 1);
    assert!(service.list_outgoing(b.id())?.is_empty());
    assert_eq!(service.remove_reference(b.id(), a.id())?, 0);
    assert_eq!(service.list_incoming(b.id())?.len(), 1);
    Ok(())
}

#[test]
fn test_missing_notes_are_reported_by_id() -> Result<()> {
    let service = NoteService::new(Database::in_memory()?);
    let a = service.create_note(NewNote::new("A"))?;

    let err = service.add_reference(a.id(), NoteId::new(404)).unwrap_err();

    assert_eq!(err.to_string(), "Note 404 not found");
    assert!(matches!(err, ReferenceError::NoteNotFound(_)));
    Ok(())
}

#[test]
fn test_inline_links_and_edges_are_independent() -> Result<()> {
    let service = NoteService::new(Database::in_memory()?);
    let camp = service.create_note(NewNote::new("Goblin Camp").content("Ruled by [[Grukk]]"))?;
    let grukk = service.create_note(NewNote::new("Grukk"))?;

    // An inline link does not create an edge.
    assert!(service.list_outgoing(camp.id())?.is_empty());

    // Removing an edge leaves content alone.
    service.add_reference(camp.id(), grukk.id())?;
    service.remove_reference(camp.id(), grukk.id())?;
    let camp = service.get_note(camp.id())?.expect("note exists");
    assert_eq!(camp.content(), "Ruled by [[Grukk]]");
    Ok(())
}

#[test]
fn test_picker_excludes_current_note() -> Result<()> {
    let service = NoteService::new(Database::in_memory()?);
    let current = service.create_note(NewNote::new("Session 4"))?;
    service.create_note(NewNote::new("Bhaal"))?;
    service.create_note(NewNote::new("Astarion"))?;

    let titles: Vec<_> = service
        .notes_for_reference(Some(current.id()))?
        .into_iter()
        .map(|summary| summary.title)
        .collect();

    assert_eq!(titles, vec!["Astarion", "Bhaal"]);
    Ok(())
}
