//! [`Command`] for releasing a [`Listing`] reservation.

use common::operations::{By, CompareAndSwap, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{Reservation, Status};
use crate::{
    domain::{listing, Listing},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for returning a [`Status::Reserved`] [`Listing`] back to
/// [`Status::Published`].
#[derive(Clone, Copy, Debug)]
pub struct ReleaseListingReservation {
    /// ID of the [`Listing`] to be released.
    pub listing_id: listing::Id,

    /// [`Reason`] of the release.
    pub reason: Reason,
}

/// Reason of releasing a [`Reservation`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Reason {
    /// Requested by a caller regardless of the deadline.
    #[display("manual")]
    Manual,

    /// Deadline of the [`Reservation`] has passed.
    #[display("expired")]
    Expired,
}

impl<Db> Command<ReleaseListingReservation> for Service<Db>
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

    async fn execute(
        &self,
        cmd: ReleaseListingReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReleaseListingReservation { listing_id, reason } = cmd;

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        if reason == Reason::Expired
            && listing.reservation().is_some_and(|r| !r.is_expired())
        {
            return Err(tracerr::new!(E::NotExpired(listing_id)));
        }

        _ = listing
            .release_reservation()
            .map_err(tracerr::from_and_wrap!(=> E))?;

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

/// Error of [`ReleaseListingReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Listing`] was modified by another operation in the meantime.
    #[display("`Listing(id: {_0})` was modified concurrently")]
    ConcurrentlyModified(#[error(not(source))] listing::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Reservation`] deadline has not passed yet.
    #[display("Reservation of `Listing(id: {_0})` has not expired yet")]
    NotExpired(#[error(not(source))] listing::Id),

    /// [`Listing`] is not [`Status::Reserved`].
    #[display("{_0}")]
    #[from]
    Transition(listing::TransitionError),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::ConcurrentlyModified(_) => Category::Conflict,
            Self::Db(e) => e.category(),
            Self::ListingNotExists(_) => Category::NotFound,
            Self::NotExpired(_) | Self::Transition(_) => {
                Category::InvalidTransition
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category, ReserveListing},
        domain::{
            listing::{Availability, Status},
            user,
        },
        for_tests::in_days,
        Service,
    };

    use super::{Command as _, Reason, ReleaseListingReservation};

    #[tokio::test]
    async fn round_trips_reservation() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let published = svc.seed_listing(Status::Published).await;
        _ = svc
            .execute(ReserveListing {
                listing_id: published.id,
                until: in_days(3),
            })
            .await
            .unwrap();

        let listing = svc
            .execute(ReleaseListingReservation {
                listing_id: published.id,
                reason: Reason::Manual,
            })
            .await
            .unwrap();

        assert_eq!(listing.status(), Status::Published);
        assert_eq!(listing.availability(), Availability::Available);
        assert!(listing.reservation().is_none());
        let stored = svc.stored_listing(published.id).await.unwrap();
        assert!(stored.reservation().is_none());
        assert_eq!(stored.version, listing.version);
    }

    #[tokio::test]
    async fn expiry_requires_passed_deadline() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let live = svc.seed_reserved_listing(in_days(1)).await;
        let lapsed = svc.seed_reserved_listing(in_days(-1)).await;

        let err = svc
            .execute(ReleaseListingReservation {
                listing_id: live.id,
                reason: Reason::Expired,
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::InvalidTransition);

        let released = svc
            .execute(ReleaseListingReservation {
                listing_id: lapsed.id,
                reason: Reason::Expired,
            })
            .await
            .unwrap();
        assert_eq!(released.status(), Status::Published);
    }

    #[tokio::test]
    async fn requires_reservation() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let published = svc.seed_listing(Status::Published).await;

        let err = svc
            .execute(ReleaseListingReservation {
                listing_id: published.id,
                reason: Reason::Manual,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::InvalidTransition);
    }
}
