//! [`Command`] for adding a [`MediaAttachment`] to a [`Listing`] gallery.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{
    media::{FileType, MimeType},
    Status,
};
use crate::{
    domain::{
        listing::{self, media},
        Listing, MediaAttachment,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for appending an already stored [`media::File`] to the end of
/// a [`Listing`] gallery.
#[derive(Clone, Debug)]
pub struct AddMediaAttachment {
    /// ID of the [`Listing`] to add the [`media::File`] to.
    pub listing_id: listing::Id,

    /// Stored [`media::File`] to be added.
    pub file: media::File,
}

impl<Db> Command<AddMediaAttachment> for Service<Db>
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
        > + Database<Insert<MediaAttachment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = MediaAttachment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddMediaAttachment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddMediaAttachment { listing_id, file } = cmd;

        if !file.is_consistent() {
            return Err(tracerr::new!(E::MimeTypeMismatch(
                file.kind,
                file.mime_type,
            )));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Concurrent additions must not pick the same `DisplayOrder`.
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

        let gallery = tx
            .execute(Select(By::<Vec<MediaAttachment>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let display_order = gallery
            .iter()
            .map(|m| m.display_order)
            .max()
            .map_or(media::DisplayOrder::FIRST, media::DisplayOrder::next);

        let attachment = MediaAttachment {
            id: media::Id::new(),
            listing_id,
            file,
            display_order,
            uploaded_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(attachment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(attachment)
    }
}

/// Error of [`AddMediaAttachment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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

    /// [`MimeType`] doesn't agree with the [`FileType`].
    #[display("`{_1}` is not a valid `{_0}` MIME type")]
    MimeTypeMismatch(media::FileType, media::MimeType),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::ListingArchived(_) => Category::InvalidTransition,
            Self::ListingNotExists(_) => Category::NotFound,
            Self::MimeTypeMismatch(..) => Category::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::{
            listing::{self, media, Status},
            user,
        },
        for_tests::image_file,
        Service,
    };

    use super::{AddMediaAttachment, Command as _};

    #[tokio::test]
    async fn appends_to_gallery_end() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;

        let first = svc
            .execute(AddMediaAttachment {
                listing_id: listing.id,
                file: image_file("front.jpg"),
            })
            .await
            .unwrap();
        let second = svc
            .execute(AddMediaAttachment {
                listing_id: listing.id,
                file: image_file("back.jpg"),
            })
            .await
            .unwrap();

        assert_eq!(first.display_order, media::DisplayOrder::at(0));
        assert_eq!(second.display_order, media::DisplayOrder::at(1));
        let gallery = svc.stored_gallery(listing.id).await;
        assert_eq!(
            gallery.iter().map(|m| m.id).collect::<Vec<_>>(),
            [first.id, second.id],
        );
    }

    #[tokio::test]
    async fn rejects_mismatching_mime_type() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;

        let err = svc
            .execute(AddMediaAttachment {
                listing_id: listing.id,
                file: media::File {
                    kind: media::FileType::Video,
                    ..image_file("front.jpg")
                },
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Validation);
        assert!(svc.stored_gallery(listing.id).await.is_empty());
    }

    #[tokio::test]
    async fn rejects_archived_or_missing_listing() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let archived = svc.seed_listing(Status::Archived).await;

        let err = svc
            .execute(AddMediaAttachment {
                listing_id: archived.id,
                file: image_file("front.jpg"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::InvalidTransition);

        let err = svc
            .execute(AddMediaAttachment {
                listing_id: listing::Id::new(),
                file: image_file("front.jpg"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::NotFound);
    }
}
