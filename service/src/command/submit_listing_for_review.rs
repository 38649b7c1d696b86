//! [`Command`] for submitting a [`Listing`] for a review.

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

/// [`Command`] for moving a [`Status::Draft`] [`Listing`] to
/// [`Status::PendingReview`].
#[derive(Clone, Copy, Debug)]
pub struct SubmitListingForReview {
    /// ID of the [`Listing`] to be submitted.
    pub listing_id: listing::Id,
}

impl<Db> Command<SubmitListingForReview> for Service<Db>
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
        cmd: SubmitListingForReview,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitListingForReview { listing_id } = cmd;

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        listing
            .submit_for_review()
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

/// Error of [`SubmitListingForReview`] [`Command`] execution.
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

    /// [`Listing`] cannot be submitted in its current [`Status`].
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
            listing::{self, Availability, Status, Version},
            user,
        },
        Service,
    };

    use super::{Command as _, SubmitListingForReview};

    #[tokio::test]
    async fn moves_draft_to_review() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let draft = svc.seed_listing(Status::Draft).await;

        let listing = svc
            .execute(SubmitListingForReview { listing_id: draft.id })
            .await
            .unwrap();

        assert_eq!(listing.status(), Status::PendingReview);
        assert_eq!(listing.availability(), Availability::Unavailable);
        assert_eq!(listing.version, Version::INITIAL.next());
        let stored = svc.stored_listing(draft.id).await.unwrap();
        assert_eq!(stored.status(), Status::PendingReview);
        assert_eq!(stored.version, listing.version);
    }

    #[tokio::test]
    async fn rejects_non_draft() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let published = svc.seed_listing(Status::Published).await;

        let err = svc
            .execute(SubmitListingForReview {
                listing_id: published.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::InvalidTransition);
        let stored = svc.stored_listing(published.id).await.unwrap();
        assert_eq!(stored.status(), Status::Published);
        assert_eq!(stored.version, Version::INITIAL);
    }

    #[tokio::test]
    async fn fails_on_unknown_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        let err = svc
            .execute(SubmitListingForReview {
                listing_id: listing::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::NotFound);
    }
}
