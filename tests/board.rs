use qboard::{Board, Error, Fault, MemoryReplica, ReplicatedStore};
use std::sync::Arc;

fn board() -> (Arc<MemoryReplica>, Arc<MemoryReplica>, Board) {
    let primary = Arc::new(MemoryReplica::new("primary"));
    let backup = Arc::new(MemoryReplica::new("backup"));
    let board = Board::new(ReplicatedStore::new(primary.clone(), backup.clone()));
    (primary, backup, board)
}

// ---- create -----------------------------------------------------------------

#[tokio::test]
async fn create_prepends_fresh_record() {
    let (_, _, board) = board();
    board.create("first").await.unwrap();
    let before = board.list().await.unwrap();

    let created = board.create("  hello ").await.unwrap();
    assert_eq!(created.text, "hello");
    assert_eq!(created.votes, 0);
    assert!(!created.hidden);

    let after = board.list().await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0], created);
    assert_eq!(&after[1..], &before[..]);
}

#[tokio::test]
async fn create_blank_text_never_touches_storage() {
    let (primary, backup, board) = board();
    for text in ["", "   ", "\t\n"] {
        assert_eq!(
            board.create(text).await.unwrap_err(),
            Error::Validation("text_required".into())
        );
    }
    assert_eq!(primary.writes(), 0);
    assert_eq!(backup.writes(), 0);
}

#[tokio::test]
async fn create_fails_when_storage_is_down() {
    let (primary, backup, board) = board();
    primary.inject(Fault::All);
    backup.inject(Fault::All);
    assert!(matches!(
        board.create("hi").await,
        Err(Error::ReadFailure(_))
    ));
}

// ---- mutate -----------------------------------------------------------------

#[tokio::test]
async fn upvote_n_times() {
    let (_, _, board) = board();
    let row = board.create("q").await.unwrap();
    for _ in 0..5 {
        board.mutate(&row.id, "upvote").await.unwrap();
    }
    let row = board.mutate(&row.id, "upvote").await.unwrap();
    assert_eq!(row.votes, 6);
    assert_eq!(board.list().await.unwrap()[0].votes, 6);
}

#[tokio::test]
async fn mutate_unknown_id_is_not_found_and_writes_nothing() {
    let (primary, _, board) = board();
    board.create("q").await.unwrap();
    let before = board.list().await.unwrap();
    let writes = primary.writes();

    assert_eq!(
        board.mutate("nope", "upvote").await.unwrap_err(),
        Error::NotFound("nope".into())
    );
    assert_eq!(board.list().await.unwrap(), before);
    assert_eq!(primary.writes(), writes);
}

#[tokio::test]
async fn mutate_unknown_action_writes_nothing() {
    let (primary, _, board) = board();
    let row = board.create("q").await.unwrap();
    let writes = primary.writes();

    assert_eq!(
        board.mutate(&row.id, "delete").await.unwrap_err(),
        Error::UnknownAction("delete".into())
    );
    assert_eq!(primary.writes(), writes);
}

#[tokio::test]
async fn hide_synonyms_are_equivalent() {
    let (_, _, board) = board();
    let row = board.create("q").await.unwrap();
    for (hide, unhide) in [("hide", "unhide"), ("mute", "unmute"), ("blind", "unblind")] {
        assert!(board.mutate(&row.id, hide).await.unwrap().hidden);
        assert!(board.list().await.unwrap()[0].hidden);
        assert!(!board.mutate(&row.id, unhide).await.unwrap().hidden);
        assert!(!board.list().await.unwrap()[0].hidden);
    }
}

#[tokio::test]
async fn mutate_keeps_immutable_fields() {
    let (_, _, board) = board();
    let row = board.create("q").await.unwrap();
    let hidden = board.mutate(&row.id, "hide").await.unwrap();
    assert_eq!(hidden.id, row.id);
    assert_eq!(hidden.created_at, row.created_at);
    assert_eq!(hidden.text, row.text);
}

// ---- list -------------------------------------------------------------------

#[tokio::test]
async fn list_includes_hidden_records() {
    let (_, _, board) = board();
    let row = board.create("secret").await.unwrap();
    board.create("public").await.unwrap();
    board.mutate(&row.id, "hide").await.unwrap();

    let all = board.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|r| r.hidden));
}

// ---- delete -----------------------------------------------------------------

#[tokio::test]
async fn delete_absent_id_is_noop() {
    let (_, _, board) = board();
    board.create("a").await.unwrap();
    let before = board.list().await.unwrap();

    board.delete(Some("missing")).await.unwrap();
    assert_eq!(board.list().await.unwrap(), before);
}

#[tokio::test]
async fn delete_without_id_still_rewrites_document() {
    let (primary, backup, board) = board();
    board.create("a").await.unwrap();
    let before = board.list().await.unwrap();
    let writes = primary.writes();

    board.delete(None).await.unwrap();
    assert_eq!(board.list().await.unwrap(), before);
    assert_eq!(primary.writes(), writes + 1);

    primary.inject(Fault::All);
    backup.inject(Fault::All);
    assert!(matches!(board.delete(None).await, Err(Error::ReadFailure(_))));
}

#[tokio::test]
async fn delete_removes_exactly_one() {
    let (_, _, board) = board();
    let a = board.create("a").await.unwrap();
    let b = board.create("b").await.unwrap();
    let c = board.create("c").await.unwrap();

    board.delete(Some(b.id.as_str())).await.unwrap();
    let ids: Vec<_> = board.list().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![c.id, a.id]);
}

#[tokio::test]
async fn delete_all_empties_board() {
    let (primary, backup, board) = board();
    for i in 0..10 {
        board.create(&format!("q{i}")).await.unwrap();
    }
    board.delete_all().await.unwrap();
    assert!(board.list().await.unwrap().is_empty());
    assert!(primary.snapshot().is_empty());
    assert!(backup.snapshot().is_empty());

    board.delete_all().await.unwrap();
    assert!(board.list().await.unwrap().is_empty());
}

// ---- degraded replicas ------------------------------------------------------

#[tokio::test]
async fn operations_survive_a_dead_primary() {
    let (primary, backup, board) = board();
    primary.inject(Fault::All);

    let row = board.create("still works").await.unwrap();
    board.mutate(&row.id, "upvote").await.unwrap();
    assert_eq!(board.list().await.unwrap()[0].votes, 1);
    assert_eq!(backup.snapshot()[0].votes, 1);
    assert!(primary.snapshot().is_empty());
}
