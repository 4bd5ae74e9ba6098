use std::{future::Future, pin::Pin};

use libsql::Connection;

use crate::Db;

/// Body of a transaction, borrowing the locked connection for `'a`.
pub type TxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

#[derive(Debug)]
pub enum TransactionError {
    Begin,
    Commit,
}

/// Runs `body` between `BEGIN` and `COMMIT` while holding the write lock.
/// An `Err` from `body` rolls everything back and is returned unchanged.
pub async fn with_transaction<F, T, E>(db: &Db, body: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> TxFuture<'a, T, E>,
    E: From<TransactionError>,
{
    let conn = db.write().await;

    if let Err(e) = conn.execute("BEGIN", ()).await {
        tracing::error!(error = %e, "could not open transaction");
        return Err(TransactionError::Begin.into());
    }

    let outcome = body(&*conn).await;
    if outcome.is_err() {
        if let Err(e) = conn.execute("ROLLBACK", ()).await {
            tracing::error!(error = %e, "rollback failed");
        }
        return outcome;
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        tracing::error!(error = %e, "could not commit transaction");
        return Err(TransactionError::Commit.into());
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use libsql::Builder;
    use tokio::sync::RwLock;

    use super::*;
    use crate::error::AppError;

    async fn scratch_db() -> Db {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .expect("open in-memory db");
        let conn = db.connect().expect("connect");
        conn.execute("CREATE TABLE notes (body TEXT NOT NULL)", ())
            .await
            .expect("create table");
        Arc::new(RwLock::new(conn))
    }

    async fn count_notes(db: &Db) -> i64 {
        let conn = db.read().await;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM notes", ())
            .await
            .expect("count");
        let row = rows.next().await.expect("row").expect("one row");
        row.get::<i64>(0).expect("count column")
    }

    #[tokio::test]
    async fn failed_body_leaves_no_writes() {
        let db = scratch_db().await;

        let result: Result<(), AppError> = with_transaction(&db, |conn| {
            Box::pin(async move {
                conn.execute("INSERT INTO notes (body) VALUES ('first')", ())
                    .await
                    .map_err(|e| AppError::internal(e.to_string()))?;
                Err(AppError::not_found("id", "gone"))
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(count_notes(&db).await, 0);
    }

    #[tokio::test]
    async fn successful_body_is_committed() {
        let db = scratch_db().await;

        let inserted: Result<u64, AppError> = with_transaction(&db, |conn| {
            Box::pin(async move {
                conn.execute("INSERT INTO notes (body) VALUES ('kept')", ())
                    .await
                    .map_err(|e| AppError::internal(e.to_string()))
            })
        })
        .await;

        assert_eq!(inserted.expect("commit"), 1);
        assert_eq!(count_notes(&db).await, 1);
    }
}
