//! [`Command`] for publishing a [`Listing`].

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

/// [`Command`] for making a reviewed [`Listing`] visible to buyers.
#[derive(Clone, Copy, Debug)]
pub struct PublishListing {
    /// ID of the [`Status::PendingReview`] [`Listing`] to be published.
    pub listing_id: listing::Id,
}

impl<Db> Command<PublishListing> for Service<Db>
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

    async fn execute(&self, cmd: PublishListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PublishListing { listing_id } = cmd;

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        listing.publish().map_err(tracerr::from_and_wrap!(=> E))?;

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

/// Error of [`PublishListing`] [`Command`] execution.
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

    /// [`Listing`] is not [`Status::PendingReview`].
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
            Self::Transition(_) => Category::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::{
            listing::{Availability, Status},
            user,
        },
        Service,
    };

    use super::{Command as _, PublishListing};

    #[tokio::test]
    async fn makes_listing_available() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let pending = svc.seed_listing(Status::PendingReview).await;

        let listing = svc
            .execute(PublishListing {
                listing_id: pending.id,
            })
            .await
            .unwrap();

        assert_eq!(listing.status(), Status::Published);
        assert_eq!(listing.availability(), Availability::Available);
    }

    #[tokio::test]
    async fn requires_review_first() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        for status in [Status::Draft, Status::Published, Status::Archived] {
            let listing = svc.seed_listing(status).await;

            let err = svc
                .execute(PublishListing {
                    listing_id: listing.id,
                })
                .await
                .unwrap_err();

            assert_eq!(err.category(), Category::InvalidTransition, "{status}");
        }
    }
}
