//! [`Command`] for removing a [`MediaAttachment`] from a [`Listing`] gallery.

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::Status;
use crate::{
    domain::{
        listing::{self, media},
        Listing, MediaAttachment,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for removing a [`MediaAttachment`] from a [`Listing`] gallery.
///
/// The [`MediaAttachment`]s following the removed one are shifted, so the
/// gallery stays gapless.
#[derive(Clone, Copy, Debug)]
pub struct RemoveMediaAttachment {
    /// ID of the [`Listing`] owning the [`MediaAttachment`].
    pub listing_id: listing::Id,

    /// ID of the [`MediaAttachment`] to remove.
    pub attachment_id: media::Id,
}

impl<Db> Command<RemoveMediaAttachment> for Service<Db>
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
            Delete<By<MediaAttachment, media::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<MediaAttachment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Removed [`MediaAttachment`], so its stored file may be cleaned up.
    type Ok = MediaAttachment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemoveMediaAttachment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveMediaAttachment {
            listing_id,
            attachment_id,
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

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.is_archived() {
            return Err(tracerr::new!(E::ListingArchived(listing_id)));
        }

        let mut gallery = tx
            .execute(Select(By::<Vec<MediaAttachment>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let idx = gallery
            .iter()
            .position(|m| m.id == attachment_id)
            .ok_or(E::AttachmentNotExists(attachment_id))
            .map_err(tracerr::wrap!())?;
        let removed = gallery.remove(idx);

        tx.execute(Delete(By::<MediaAttachment, _>::new(attachment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for (position, mut attachment) in gallery.into_iter().enumerate() {
            let display_order = media::DisplayOrder::at(position);
            if attachment.display_order != display_order {
                attachment.display_order = display_order;
                tx.execute(Insert(attachment))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(removed)
    }
}

/// Error of [`RemoveMediaAttachment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`MediaAttachment`] with the provided ID doesn't belong to the
    /// [`Listing`].
    #[display("`MediaAttachment(id: {_0})` does not exist")]
    AttachmentNotExists(#[error(not(source))] media::Id),

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
            Self::Db(e) => e.category(),
            Self::AttachmentNotExists(_) | Self::ListingNotExists(_) => {
                Category::NotFound
            }
            Self::ListingArchived(_) => Category::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::{
            listing::{media, Status},
            user,
        },
        Service,
    };

    use super::{Command as _, RemoveMediaAttachment};

    #[tokio::test]
    async fn compacts_gallery() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Published).await;
        let a = svc.seed_media(listing.id, 0).await;
        let b = svc.seed_media(listing.id, 1).await;
        let c = svc.seed_media(listing.id, 2).await;

        let removed = svc
            .execute(RemoveMediaAttachment {
                listing_id: listing.id,
                attachment_id: b.id,
            })
            .await
            .unwrap();

        assert_eq!(removed.id, b.id);
        let gallery = svc.stored_gallery(listing.id).await;
        assert_eq!(
            gallery
                .iter()
                .map(|m| (m.id, m.display_order))
                .collect::<Vec<_>>(),
            [
                (a.id, media::DisplayOrder::at(0)),
                (c.id, media::DisplayOrder::at(1)),
            ],
        );
    }

    #[tokio::test]
    async fn rejects_attachment_of_another_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Published).await;
        let other = svc.seed_listing(Status::Published).await;
        let foreign = svc.seed_media(other.id, 0).await;

        let err = svc
            .execute(RemoveMediaAttachment {
                listing_id: listing.id,
                attachment_id: foreign.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::NotFound);
        assert_eq!(svc.stored_gallery(other.id).await.len(), 1);
    }
}
