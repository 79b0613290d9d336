//! The seam the Runner opens one batch transaction through.

use futures::future::BoxFuture;

use crate::{
    change_log::{ChangeLogSink, ChangeLogSource}, error::StoreError, row_ops::StoreRowOps, status::StatusStore,
};

/// A store capable of opening the single transaction a batch runs inside
/// (`# 5`). A generic associated type rather than a boxed trait object,
/// since the transaction type borrows from `Self`.
pub trait TransactionalStore: Send + Sync {
    type Tx<'a>: StoreRowOps + ChangeLogSink + ChangeLogSource + StatusStore + Send + 'a
    where
        Self: 'a;

    fn begin(&self) -> BoxFuture<'_, Result<Self::Tx<'_>, StoreError>>;

    /// Commits a batch's transaction. A method on the store rather than the
    /// `Tx` associated type itself, since the GAT bound can't easily name
    /// an additional by-value method without fixing its own lifetime.
    fn commit<'a>(tx: Self::Tx<'a>) -> BoxFuture<'a, Result<(), StoreError>>
    where
        Self: 'a;
}

impl TransactionalStore for crate::PgStore {
    type Tx<'a> = crate::PgTx<'a>;

    fn begin(&self) -> BoxFuture<'_, Result<crate::PgTx<'_>, StoreError>> {
        Box::pin(async move { crate::PgStore::begin(self).await })
    }

    fn commit<'a>(tx: crate::PgTx<'a>) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { tx.commit().await })
    }
}
