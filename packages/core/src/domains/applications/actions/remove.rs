//! Applicant-side deletions: withdrawal and orphan cleanup.

use docstore::{run_transaction, DocumentStore, StoreError, StoreResult, TxAbort, TxError};
use thiserror::Error;
use tracing::info;

use crate::common::ApplicationId;
use crate::domains::applications::models::application::Application;
use crate::kernel::ServerDeps;

#[derive(Error, Debug)]
pub enum WithdrawError {
    /// A decision landed first; the record is no longer `Pending` and
    /// must not be deleted.
    #[error("this request was already handled")]
    AlreadyDecided,

    #[error("application not found")]
    ApplicationNotFound,

    #[error("could not withdraw the application, please try again")]
    ConflictRetryExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TxError<WithdrawError>> for WithdrawError {
    fn from(err: TxError<WithdrawError>) -> Self {
        match err {
            TxError::Aborted(abort) => abort,
            TxError::RetriesExhausted { .. } => WithdrawError::ConflictRetryExhausted,
            TxError::Store(store) => WithdrawError::Store(store),
        }
    }
}

/// Withdraw a still-pending application.
///
/// Transactional so that a withdrawal racing a decision loses cleanly:
/// the deletion only commits if the record is still `Pending` at commit
/// time.
pub async fn withdraw_application(
    deps: &ServerDeps,
    application_id: ApplicationId,
) -> Result<(), WithdrawError> {
    let store = deps.store.as_ref();
    let app_ref = Application::doc_ref(application_id);

    run_transaction(store, deps.retry, |tx| {
        let app_ref = &app_ref;
        Box::pin(async move {
            let doc = tx
                .get(app_ref)
                .await?
                .ok_or(TxAbort::Abort(WithdrawError::ApplicationNotFound))?;
            let application = Application::decode(&doc)?;

            if application.status.is_terminal() {
                return Err(TxAbort::Abort(WithdrawError::AlreadyDecided));
            }

            tx.delete(app_ref.clone());
            Ok(())
        })
    })
    .await
    .map_err(WithdrawError::from)?;

    info!("Application {} withdrawn", application_id);
    Ok(())
}

/// Permanently delete an orphaned application record.
///
/// A direct, non-transactional delete: the opportunity is already gone
/// and no invariant depends on this record.
pub async fn remove_orphaned_application(
    deps: &ServerDeps,
    application_id: ApplicationId,
) -> StoreResult<()> {
    deps.store
        .delete(&Application::doc_ref(application_id))
        .await?;
    info!("Removed orphaned application {}", application_id);
    Ok(())
}
