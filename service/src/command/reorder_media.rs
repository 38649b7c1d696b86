//! [`Command`] for reordering a [`Listing`] gallery.

use std::collections::HashSet;

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{media::DisplayOrder, Status};
use crate::{
    domain::{
        listing::{self, media},
        Listing, MediaAttachment,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for reordering all the [`MediaAttachment`]s of a [`Listing`]
/// at once.
///
/// Either every [`MediaAttachment`] gets its new [`DisplayOrder`], or none
/// does.
#[derive(Clone, Debug)]
pub struct ReorderMedia {
    /// ID of the [`Listing`] whose gallery is reordered.
    pub listing_id: listing::Id,

    /// IDs of all the [`MediaAttachment`]s of the [`Listing`] in their new
    /// order.
    pub ordered_ids: Vec<media::Id>,
}

impl<Db> Command<ReorderMedia> for Service<Db>
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
    type Ok = Vec<MediaAttachment>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReorderMedia) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReorderMedia {
            listing_id,
            ordered_ids,
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

        let current: HashSet<_> = gallery.iter().map(|m| m.id).collect();
        let requested: HashSet<_> = ordered_ids.iter().copied().collect();
        if ordered_ids.len() != gallery.len()
            || requested.len() != ordered_ids.len()
            || requested != current
        {
            return Err(tracerr::new!(E::NotPermutation(listing_id)));
        }

        let mut reordered = Vec::with_capacity(gallery.len());
        for (position, id) in ordered_ids.into_iter().enumerate() {
            let Some(idx) = gallery.iter().position(|m| m.id == id) else {
                // Every ID is checked to be in the gallery above.
                return Err(tracerr::new!(E::NotPermutation(listing_id)));
            };
            let mut attachment = gallery.swap_remove(idx);
            let display_order = media::DisplayOrder::at(position);
            if attachment.display_order != display_order {
                attachment.display_order = display_order;
                tx.execute(Insert(attachment.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
            reordered.push(attachment);
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(reordered)
    }
}

/// Error of [`ReorderMedia`] [`Command`] execution.
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

    /// Provided IDs are not exactly the IDs of the [`Listing`] gallery.
    #[display(
        "Provided IDs are not a permutation of `Listing(id: {_0})` gallery"
    )]
    NotPermutation(#[error(not(source))] listing::Id),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::ListingArchived(_) => Category::InvalidTransition,
            Self::ListingNotExists(_) => Category::NotFound,
            Self::NotPermutation(_) => Category::Validation,
        }
    }
}
