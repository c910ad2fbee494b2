use super::*;
use shared::domain::VoteEvent;
use std::{path::Path, sync::Arc};
use storage::VoteLog;

fn context_for(path: &Path) -> ApiContext {
    let (writer, _task) = LogWriter::spawn(Arc::new(VoteLog::new(path)), 8);
    ApiContext { writer }
}

fn setup() -> (tempfile::TempDir, ApiContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context_for(&dir.path().join("votes-log.jsonl"));
    (dir, ctx)
}

#[tokio::test]
async fn export_without_log_file_is_not_found() {
    let (_dir, ctx) = setup();
    let err = export_votes_csv(&ctx).await.expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::NotFound));
    assert_eq!(status_for(&err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_of_unreadable_log_is_internal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context_for(dir.path());
    let err = export_votes_csv(&ctx).await.expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::Internal));
    assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn reset_then_export_is_header_only() {
    let (_dir, ctx) = setup();
    ctx.writer
        .log()
        .append(VoteEvent::parse_line(r#"{"id":3,"voto":1}"#).expect("vote"))
        .await
        .expect("append");

    reset_votes_log(&ctx).await.expect("reset");
    assert_eq!(
        export_votes_csv(&ctx).await.expect("csv"),
        "id,voto,receivedAt"
    );
}

#[tokio::test]
async fn reset_in_missing_directory_is_internal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context_for(&dir.path().join("gone").join("votes.jsonl"));
    let err = reset_votes_log(&ctx).await.expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::Internal));
}

#[tokio::test]
async fn reset_waits_for_votes_already_queued() {
    let (_dir, ctx) = setup();
    assert!(ctx
        .writer
        .submit(VoteEvent::parse_line(r#"{"id":4,"voto":0}"#).expect("vote")));

    reset_votes_log(&ctx).await.expect("reset");
    assert_eq!(
        export_votes_csv(&ctx).await.expect("csv"),
        "id,voto,receivedAt"
    );
}
