//! In-memory [`Database`] implementation.
//!
//! Keeps the whole marketplace [`State`] behind a single asynchronous lock.
//! A transaction owns that lock from [`Transact`] until [`Commit`] (or until
//! being dropped), working on a copy of the [`State`], so transactions are
//! fully serialized and a dropped transaction leaves no trace.
//!
//! Every operation yields to the scheduler before touching the [`State`],
//! so concurrently polled operations interleave the same way they would
//! with a real database server.

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        contact_info, listing, listing::details, listing::media, user,
        ContactInfo, Listing, ListingDetails, MediaAttachment, User,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;
#[cfg(doc)]
use common::operations::{Commit, Transact};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<C = NonTx>(C);

/// Rows of every marketplace table.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// [`User`]s by their IDs, including soft-deleted ones.
    users: HashMap<user::Id, User>,

    /// [`ContactInfo`]s by their IDs.
    contact_infos: HashMap<contact_info::Id, ContactInfo>,

    /// [`ListingDetails`] by their IDs.
    listing_details: HashMap<details::Id, ListingDetails>,

    /// [`Listing`]s by their IDs.
    listings: HashMap<listing::Id, Listing>,

    /// [`MediaAttachment`]s by their IDs.
    media_attachments: HashMap<media::Id, MediaAttachment>,
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Ongoing transaction, or [`None`] once committed.
    inner: Arc<Mutex<Option<Transaction>>>,
}

/// Ongoing [`Tx`] transaction.
#[derive(Debug)]
struct Transaction {
    /// Exclusive access to the shared [`State`].
    guard: OwnedMutexGuard<State>,

    /// Copy of the [`State`] the transaction works on.
    working: State,
}

impl Tx {
    /// Begins a new [`Tx`] by taking exclusive access to the shared [`State`].
    async fn begin(non_tx: &NonTx) -> Self {
        tokio::task::yield_now().await;

        let guard = Arc::clone(&non_tx.state).lock_owned().await;
        let working = guard.clone();
        Self {
            inner: Arc::new(Mutex::new(Some(Transaction { guard, working }))),
        }
    }

    /// Commits this [`Tx`], publishing its changes.
    async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Transaction { mut guard, working } = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        *guard = working;
        Ok(())
    }
}

/// Access to the [`State`] of a [`Memory`] client.
pub trait Connection {
    /// Reads the [`State`] with the provided function.
    ///
    /// # Errors
    ///
    /// If the transaction of this [`Connection`] is already finished.
    fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Modifies the [`State`] with the provided function.
    ///
    /// The function must leave the [`State`] untouched when returning an
    /// [`Error`].
    ///
    /// # Errors
    ///
    /// If the function fails, or the transaction of this [`Connection`] is
    /// already finished.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Connection for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        tokio::task::yield_now().await;

        Ok(f(&*self.state.lock().await))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        tokio::task::yield_now().await;

        f(&mut *self.state.lock().await)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Connection for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        tokio::task::yield_now().await;

        self.inner
            .lock()
            .await
            .as_ref()
            .map(|tx| f(&tx.working))
            .ok_or(Error::TxFinished)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        tokio::task::yield_now().await;

        self.inner
            .lock()
            .await
            .as_mut()
            .ok_or(Error::TxFinished)
            .and_then(|tx| f(&mut tx.working))
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C: Connection> Connection for Memory<C> {
    fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>> {
        self.0.read(f)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>> {
        self.0.write(f)
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Row violates a unique constraint.
    #[display("unique constraint `{_0}` violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Row references a missing row or is referenced by an existing one.
    #[display("foreign key constraint `{_0}` violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),

    /// Transaction was already committed.
    #[display("transaction is already finished")]
    TxFinished,
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint
    /// (or any constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
            Self::ForeignKeyViolation(_) | Self::TxFinished => false,
        }
    }

    /// Checks if the error is a foreign key violation of the specified
    /// constraint (or any constraint, if [`None`]).
    #[must_use]
    pub fn is_foreign_key_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::ForeignKeyViolation(c) => {
                constraint.map_or(true, |n| n == *c)
            }
            Self::UniqueViolation(_) | Self::TxFinished => false,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Delete, Insert, Select, Transact};

    use crate::{
        domain::{
            listing::{media, Status},
            user, MediaAttachment,
        },
        infra::Database as _,
        Service,
    };

    fn order_of(gallery: &[MediaAttachment]) -> Vec<(media::Id, u32)> {
        gallery
            .iter()
            .map(|m| (m.id, u32::from(m.display_order)))
            .collect()
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;
        let first = svc.seed_media(listing.id, 0).await;
        let second = svc.seed_media(listing.id, 1).await;
        let before = order_of(&svc.stored_gallery(listing.id).await);

        let tx = svc.database().execute(Transact).await.unwrap();
        tx.execute(Insert(MediaAttachment {
            display_order: media::DisplayOrder::at(5),
            ..first.clone()
        }))
        .await
        .unwrap();
        tx.execute(Delete(By::<MediaAttachment, _>::new(second.id)))
            .await
            .unwrap();
        let inside = tx
            .execute(Select(By::<Vec<MediaAttachment>, _>::new(listing.id)))
            .await
            .unwrap();
        assert_eq!(order_of(&inside), [(first.id, 5)]);
        drop(tx);

        let after = order_of(&svc.stored_gallery(listing.id).await);
        assert_eq!(after, before);
        assert_eq!(after, [(first.id, 0), (second.id, 1)]);

        // Lock is released, so the next transaction begins.
        drop(svc.database().execute(Transact).await.unwrap());
    }
}
