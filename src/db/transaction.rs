//! Transaction helper: commit on `Ok`, roll back on `Err`.

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};
use uuid::Uuid;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute `f` within a database transaction.
///
/// The transaction is committed when `f` returns `Ok` and rolled back when it
/// returns `Err`; the caller's error is handed back unchanged.
///
/// ```rust,ignore
/// let product = run_in_transaction(&db, |txn| {
///     Box::pin(async move {
///         let model = product::ActiveModel { .. }.insert(txn).await?;
///         Ok::<_, ServiceError>(model)
///     })
/// })
/// .await?;
/// ```
pub async fn run_in_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>> + Send,
    T: Send,
    E: From<DbErr> + std::fmt::Display + std::fmt::Debug + Send,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, "Starting database transaction");
    counter!("inventory_db.transaction.started", 1);

    let result = db.transaction(f).await;

    let elapsed = start.elapsed();
    histogram!("inventory_db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("inventory_db.transaction.committed", 1);
            debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
        }
        Err(TransactionError::Connection(e)) => {
            counter!("inventory_db.transaction.rolled_back", 1);
            warn!(transaction_id = %transaction_id, error = %e, "Transaction failed after {:?}", elapsed);
        }
        Err(TransactionError::Transaction(e)) => {
            counter!("inventory_db.transaction.rolled_back", 1);
            warn!(transaction_id = %transaction_id, error = %e, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}
