//! [`Command`] for attaching [`ListingDetails`] to a [`Listing`].

use common::{
    operations::{
        By, Commit, CompareAndSwap, Lock, Select, Transact, Transacted,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::Status;
use crate::{
    domain::{
        listing::{self, details},
        Listing, ListingDetails,
    },
    infra::{database, database::constraint, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for attaching [`ListingDetails`] to a [`Listing`].
///
/// Attaching the [`ListingDetails`] already attached to the same [`Listing`]
/// changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct AttachListingDetails {
    /// ID of the [`Listing`] to attach [`ListingDetails`] to.
    pub listing_id: listing::Id,

    /// ID of the [`ListingDetails`] to be attached.
    pub details_id: details::Id,
}

impl<Db> Command<AttachListingDetails> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, details::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ListingDetails>, details::Id>>,
            Ok = Option<ListingDetails>,
            Err = Traced<database::Error>,
        > + Database<
            CompareAndSwap<Listing>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AttachListingDetails,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AttachListingDetails {
            listing_id,
            details_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Listing, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.is_archived() {
            return Err(tracerr::new!(E::ListingArchived(listing_id)));
        }

        tx.execute(Select(By::<Option<ListingDetails>, _>::new(details_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DetailsNotExists(details_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if listing.details_id == Some(details_id) {
            return Ok(listing);
        }

        let holder = tx
            .execute(Select(By::<Option<Listing>, _>::new(details_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(holder) = holder {
            return Err(tracerr::new!(E::DetailsOccupied(details_id, holder.id)));
        }

        listing.details_id = Some(details_id);
        listing.updated_at = DateTime::now().coerce();

        let swapped = tx
            .execute(CompareAndSwap(listing.clone()))
            .await
            .map_err(|e| {
                if e.as_ref()
                    .is_unique_violation(Some(constraint::LISTINGS_DETAILS_ID))
                {
                    tracerr::new!(E::DetailsOccupied(details_id, listing_id))
                } else {
                    tracerr::map_from(e)
                }
            })?;
        if !swapped {
            return Err(tracerr::new!(E::ConcurrentlyModified(listing_id)));
        }
        listing.version = listing.version.next();

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(listing)
    }
}

/// Error of [`AttachListingDetails`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Listing`] was modified by another operation in the meantime.
    #[display("`Listing(id: {_0})` was modified concurrently")]
    ConcurrentlyModified(#[error(not(source))] listing::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`ListingDetails`] with the provided ID do not exist.
    #[display("`ListingDetails(id: {_0})` do not exist")]
    DetailsNotExists(#[error(not(source))] details::Id),

    /// [`ListingDetails`] are attached to another [`Listing`] already.
    #[display("`ListingDetails(id: {_0})` are attached to `Listing(id: {_1})`")]
    DetailsOccupied(details::Id, listing::Id),

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
            Self::ConcurrentlyModified(_) | Self::DetailsOccupied(..) => {
                Category::Conflict
            }
            Self::Db(e) => e.category(),
            Self::DetailsNotExists(_) | Self::ListingNotExists(_) => {
                Category::NotFound
            }
            Self::ListingArchived(_) => Category::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category, CreateListingDetails},
        domain::{
            listing::{details, Status},
            user,
        },
        query, Query as _, Service,
    };

    use super::{AttachListingDetails, Command as _};

    #[tokio::test]
    async fn attaches_details() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;
        let details = svc
            .execute(CreateListingDetails {
                general_description: details::Text::new("Low hours"),
                ..CreateListingDetails::default()
            })
            .await
            .unwrap();

        let attached = svc
            .execute(AttachListingDetails {
                listing_id: listing.id,
                details_id: details.id,
            })
            .await
            .unwrap();

        assert_eq!(attached.details_id, Some(details.id));
        let holder = svc
            .execute(query::listing::ByDetailsId::by(details.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(holder.id, listing.id);
    }

    #[tokio::test]
    async fn is_idempotent_for_same_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;
        let details = svc
            .execute(CreateListingDetails::default())
            .await
            .unwrap();
        let cmd = AttachListingDetails {
            listing_id: listing.id,
            details_id: details.id,
        };

        let first = svc.execute(cmd).await.unwrap();
        let second = svc.execute(cmd).await.unwrap();

        assert_eq!(second.details_id, Some(details.id));
        assert_eq!(second.version, first.version);
    }

    #[tokio::test]
    async fn rejects_details_of_another_listing() {
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

        let err = svc
            .execute(AttachListingDetails {
                listing_id: second.id,
                details_id: details.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Conflict);
        let stored = svc.stored_listing(second.id).await.unwrap();
        assert!(stored.details_id.is_none());
    }

    #[tokio::test]
    async fn requires_existing_details() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;

        let err = svc
            .execute(AttachListingDetails {
                listing_id: listing.id,
                details_id: details::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::NotFound);
    }

    #[tokio::test]
    async fn rejects_archived() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Archived).await;
        let details = svc
            .execute(CreateListingDetails::default())
            .await
            .unwrap();

        let err = svc
            .execute(AttachListingDetails {
                listing_id: listing.id,
                details_id: details.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::InvalidTransition);
    }
}
