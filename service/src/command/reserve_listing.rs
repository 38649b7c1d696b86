//! [`Command`] for reserving a [`Listing`].

use common::operations::{By, CompareAndSwap, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::Status;
use crate::{
    domain::{listing, Listing},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for holding a [`Status::Published`] [`Listing`] for a
/// prospective buyer.
#[derive(Clone, Copy, Debug)]
pub struct ReserveListing {
    /// ID of the [`Listing`] to be reserved.
    pub listing_id: listing::Id,

    /// Moment the reservation lapses at. Must be in the future.
    pub until: listing::ReservationDeadline,
}

impl<Db> Command<ReserveListing> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            CompareAndSwap<Listing>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReserveListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReserveListing { listing_id, until } = cmd;

        if until.is_past() {
            return Err(tracerr::new!(E::DeadlineNotInFuture(until)));
        }

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        listing.reserve(until).map_err(tracerr::from_and_wrap!(=> E))?;

        let swapped = self
            .database()
            .execute(CompareAndSwap(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !swapped {
            return Err(tracerr::new!(E::ConcurrentlyModified(listing_id)));
        }
        listing.version = listing.version.next();

        Ok(listing)
    }
}

/// Error of [`ReserveListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Listing`] was modified by another operation in the meantime.
    #[display("`Listing(id: {_0})` was modified concurrently")]
    ConcurrentlyModified(#[error(not(source))] listing::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Reservation deadline is not in the future.
    #[display("Reservation deadline `{_0}` is not in the future")]
    DeadlineNotInFuture(#[error(not(source))] listing::ReservationDeadline),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Listing`] is not [`Status::Published`].
    #[display("{_0}")]
    #[from]
    Transition(listing::TransitionError),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::ConcurrentlyModified(_) => Category::Conflict,
            Self::Db(e) => e.category(),
            Self::DeadlineNotInFuture(_) => Category::Validation,
            Self::ListingNotExists(_) => Category::NotFound,
            Self::Transition(_) => Category::InvalidTransition,
        }
    }
}
