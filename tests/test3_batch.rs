mod common;

use common::{books, library_db, titles};
use sql_steward::prelude::*;

const INSERT_WITH_ID: &str = "INSERT INTO books(id, title) VALUES (?, ?)";

#[tokio::test]
async fn test3_puts_apply_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(2).await?;

    let mut batch = db.rdbms.batch("INSERT INTO books(title) VALUES (?)").await?;
    for title in ["Clean Code", "Code Complete", "Refactoring"] {
        batch.put(&[title.into()])?;
    }
    assert_eq!(batch.pending(), 3);
    assert_eq!(batch.apply()?, vec![1, 1, 1]);
    assert_eq!(batch.pending(), 0);
    batch.close();

    assert_eq!(
        titles(&books(&db.rdbms).await?),
        ["Clean Code", "Code Complete", "Refactoring"]
    );
    Ok(())
}

#[tokio::test]
async fn test3_batch_is_reusable_until_closed() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(2).await?;

    let mut batch = db.rdbms.batch(INSERT_WITH_ID).await?;
    assert!(batch.apply()?.is_empty(), "nothing queued, nothing run");

    batch.put(&["a".into(), "First".into()])?;
    batch.apply()?;
    batch.put(&["b".into(), "Second".into()])?;
    batch.apply()?;
    batch.close();

    assert_eq!(titles(&books(&db.rdbms).await?), ["First", "Second"]);
    Ok(())
}

#[tokio::test]
async fn test3_argument_count_must_match() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(2).await?;

    let mut batch = db.rdbms.batch(INSERT_WITH_ID).await?;
    let err = batch.put(&["only-id".into()]).expect_err("one argument for two markers");
    assert_eq!(err.kind(), ErrorKind::Binding);
    assert_eq!(batch.pending(), 0);
    Ok(())
}

#[tokio::test]
async fn test3_failure_reports_completed_operations() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(2).await?;

    let mut batch = db.rdbms.batch(INSERT_WITH_ID).await?;
    batch.put(&["a".into(), "First".into()])?;
    batch.put(&["b".into(), "Second".into()])?;
    batch.put(&["a".into(), "Duplicate".into()])?;
    batch.put(&["c".into(), "Never".into()])?;

    let err = batch.apply().expect_err("primary key violation");
    match &err {
        SqlStewardError::BatchError {
            index, completed, ..
        } => {
            assert_eq!(*index, 2);
            assert_eq!(completed, &vec![1, 1]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(batch.pending(), 0);
    batch.close();

    // outside a transaction every operation commits on its own
    assert_eq!(titles(&books(&db.rdbms).await?), ["First", "Second"]);
    Ok(())
}

#[tokio::test]
async fn test3_close_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(1).await?;

    let mut batch = db.rdbms.batch(INSERT_WITH_ID).await?;
    batch.put(&["a".into(), "Queued".into()])?;
    batch.close();
    batch.close();
    assert!(batch.is_closed());

    assert!(matches!(
        batch.put(&["b".into(), "Late".into()]),
        Err(SqlStewardError::BatchClosed)
    ));
    assert!(matches!(batch.apply(), Err(SqlStewardError::BatchClosed)));
    drop(batch);

    let state = db.pool().state();
    assert_eq!(state.connections, 1);
    assert_eq!(state.idle_connections, 1);
    assert!(books(&db.rdbms).await?.is_empty(), "queued work was discarded");
    Ok(())
}

#[tokio::test]
async fn test3_prepare_failure_releases_connection() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(1).await?;

    let Err(err) = db.rdbms.batch("INSERT INTO no_such_table(x) VALUES (?)").await else {
        panic!("preparing against an unknown table must fail");
    };
    assert_eq!(err.kind(), ErrorKind::Execution);

    let state = db.pool().state();
    assert_eq!(state.connections, state.idle_connections);

    // the only connection is available again
    db.rdbms
        .change("INSERT INTO books(title) VALUES ('Clean Code')", &[])
        .apply()
        .await?;
    assert_eq!(books(&db.rdbms).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test3_batch_inside_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let db = library_db(2).await?;

    let mut tx = db.rdbms.transaction().await?;
    {
        let mut batch = tx.batch(INSERT_WITH_ID)?;
        batch.put(&["a".into(), "Clean Code".into()])?;
        batch.put(&["b".into(), "Refactoring".into()])?;
        assert_eq!(batch.apply()?, vec![1, 1]);
        batch.close();
    }
    assert!(!tx.is_closed(), "closing the batch leaves the transaction's connection alone");
    assert!(books(&db.rdbms).await?.is_empty());

    tx.commit()?;
    tx.close()?;
    assert_eq!(titles(&books(&db.rdbms).await?), ["Clean Code", "Refactoring"]);
    Ok(())
}

#[tokio::test]
async fn test3_failed_batch_in_transaction_can_be_rolled_back() -> Result<(), Box<dyn std::error::Error>>
{
    let db = library_db(2).await?;

    let mut tx = db.rdbms.transaction().await?;
    {
        let mut batch = tx.batch(INSERT_WITH_ID)?;
        batch.put(&["a".into(), "First".into()])?;
        batch.put(&["a".into(), "Duplicate".into()])?;
        assert!(batch.apply().is_err());
    }
    tx.rollback()?;
    tx.close()?;

    assert!(books(&db.rdbms).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test3_batch_resumes_transaction_ended_by_database() -> Result<(), Box<dyn std::error::Error>>
{
    let db = library_db(2).await?;
    db.rdbms
        .change("INSERT INTO books(id, title) VALUES ('a', 'Existing')", &[])
        .apply()
        .await?;

    let mut tx = db.rdbms.transaction().await?;
    {
        let mut batch = tx.batch("INSERT OR ROLLBACK INTO books(id, title) VALUES (?, ?)")?;
        batch.put(&["a".into(), "Dup".into()])?;
        assert!(batch.apply().is_err());

        batch.put(&["b".into(), "Uncommitted".into()])?;
        assert_eq!(batch.apply()?, vec![1]);
        batch.close();
    }
    assert_eq!(titles(&books(&db.rdbms).await?), ["Existing"]);
    tx.close()?;

    assert_eq!(titles(&books(&db.rdbms).await?), ["Existing"]);
    Ok(())
}
