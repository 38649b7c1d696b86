//! [`Command`] for deleting a [`Listing`].

use common::operations::{By, Commit, Delete, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, Listing, MediaAttachment},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for deleting a [`Listing`] along with its gallery.
///
/// Sold [`Listing`]s are kept as the record of their sale.
#[derive(Clone, Copy, Debug)]
pub struct DeleteListing {
    /// ID of the [`Listing`] to delete.
    pub listing_id: listing::Id,
}

impl<Db> Command<DeleteListing> for Service<Db>
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
            Select<By<Vec<MediaAttachment>, listing::Id>>,
            Ok = Vec<MediaAttachment>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    /// [`MediaAttachment`]s of the deleted [`Listing`], so their stored files
    /// may be cleaned up.
    type Ok = Vec<MediaAttachment>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteListing { listing_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Listing, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.sale().is_some() {
            return Err(tracerr::new!(E::ListingSold(listing_id)));
        }

        let gallery = tx
            .execute(Select(By::<Vec<MediaAttachment>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Listing, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(gallery)
    }
}

/// Error of [`DeleteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Listing`] was sold already.
    #[display("`Listing(id: {_0})` was sold")]
    ListingSold(#[error(not(source))] listing::Id),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::ListingNotExists(_) => Category::NotFound,
            Self::ListingSold(_) => Category::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::{listing::Status, user},
        Service,
    };

    use super::{Command as _, DeleteListing};

    #[tokio::test]
    async fn deletes_listing_with_gallery() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Published).await;
        let a = svc.seed_media(listing.id, 0).await;
        let b = svc.seed_media(listing.id, 1).await;

        let removed = svc
            .execute(DeleteListing {
                listing_id: listing.id,
            })
            .await
            .unwrap();

        assert_eq!(
            removed.iter().map(|m| m.id).collect::<Vec<_>>(),
            [a.id, b.id],
        );
        assert!(svc.stored_listing(listing.id).await.is_none());
        assert!(svc.stored_gallery(listing.id).await.is_empty());
    }

    #[tokio::test]
    async fn keeps_sold_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Sold).await;

        let err = svc
            .execute(DeleteListing {
                listing_id: listing.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::InvalidTransition);
        assert!(svc.stored_listing(listing.id).await.is_some());
    }

    #[tokio::test]
    async fn rejects_missing_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        let err = svc
            .execute(DeleteListing {
                listing_id: crate::domain::listing::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::NotFound);
    }
}
