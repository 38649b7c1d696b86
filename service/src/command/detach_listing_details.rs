//! [`Command`] for detaching [`ListingDetails`] from a [`Listing`].

use common::{
    operations::{By, CompareAndSwap, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{listing::Status, ListingDetails};
use crate::{
    domain::{listing, Listing},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for detaching [`ListingDetails`] from a [`Listing`].
///
/// The [`ListingDetails`] themselves are kept, so may be attached to another
/// [`Listing`] afterwards.
#[derive(Clone, Copy, Debug)]
pub struct DetachListingDetails {
    /// ID of the [`Listing`] to detach [`ListingDetails`] from.
    pub listing_id: listing::Id,
}

impl<Db> Command<DetachListingDetails> for Service<Db>
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
        cmd: DetachListingDetails,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DetachListingDetails { listing_id } = cmd;

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        if listing.is_archived() {
            return Err(tracerr::new!(E::ListingArchived(listing_id)));
        }
        if listing.details_id.take().is_none() {
            return Ok(listing);
        }
        listing.updated_at = DateTime::now().coerce();

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

/// Error of [`DetachListingDetails`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Listing`] was modified by another operation in the meantime.
    #[display("`Listing(id: {_0})` was modified concurrently")]
    ConcurrentlyModified(#[error(not(source))] listing::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] is [`Status::Archived`].
    #[display("`Listing(id: {_0})` is archived")]
    ListingArchived(#[error(not(source))] listing::Id),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::ConcurrentlyModified(_) => Category::Conflict,
            Self::Db(e) => e.category(),
            Self::ListingArchived(_) => Category::InvalidTransition,
            Self::ListingNotExists(_) => Category::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            AttachListingDetails, Categorized as _, Category,
            CreateListingDetails,
        },
        domain::{listing::Status, user},
        Service,
    };

    use super::{Command as _, DetachListingDetails};

    #[tokio::test]
    async fn frees_details_for_another_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let first = svc.seed_listing(Status::Draft).await;
        let second = svc.seed_listing(Status::Draft).await;
        let details = svc
            .execute(CreateListingDetails::default())
            .await
            .unwrap();
        _ = svc
            .execute(AttachListingDetails {
                listing_id: first.id,
                details_id: details.id,
            })
            .await
            .unwrap();

        let detached = svc
            .execute(DetachListingDetails {
                listing_id: first.id,
            })
            .await
            .unwrap();
        assert!(detached.details_id.is_none());

        let attached = svc
            .execute(AttachListingDetails {
                listing_id: second.id,
                details_id: details.id,
            })
            .await
            .unwrap();
        assert_eq!(attached.details_id, Some(details.id));
    }

    #[tokio::test]
    async fn is_noop_without_details() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Published).await;

        let detached = svc
            .execute(DetachListingDetails {
                listing_id: listing.id,
            })
            .await
            .unwrap();

        assert_eq!(detached.version, listing.version);
    }

    #[tokio::test]
    async fn rejects_archived() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Archived).await;

        let err = svc
            .execute(DetachListingDetails {
                listing_id: listing.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::InvalidTransition);
    }
}
