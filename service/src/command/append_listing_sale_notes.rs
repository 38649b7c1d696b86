//! [`Command`] for appending notes to a [`Listing`] sale.

use common::operations::{By, CompareAndSwap, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::Sale;
use crate::{
    domain::{
        listing::{self, SaleNotes},
        Listing,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for appending [`SaleNotes`] to the [`Sale`] of a [`Listing`].
///
/// The only change a [`Sale`] accepts once recorded.
#[derive(Clone, Debug)]
pub struct AppendListingSaleNotes {
    /// ID of the sold [`Listing`].
    pub listing_id: listing::Id,

    /// [`SaleNotes`] to be appended.
    pub notes: SaleNotes,
}

impl<Db> Command<AppendListingSaleNotes> for Service<Db>
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
        cmd: AppendListingSaleNotes,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AppendListingSaleNotes { listing_id, notes } = cmd;

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        listing
            .append_sale_notes(&notes)
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

/// Error of [`AppendListingSaleNotes`] [`Command`] execution.
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

    /// [`SaleNotes`] cannot be appended to the [`Listing`].
    #[display("{_0}")]
    #[from]
    Notes(listing::SaleNotesError),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::ConcurrentlyModified(_) => Category::Conflict,
            Self::Db(e) => e.category(),
            Self::ListingNotExists(_) => Category::NotFound,
            Self::Notes(listing::SaleNotesError::NotSold(_)) => {
                Category::InvalidTransition
            }
            Self::Notes(listing::SaleNotesError::TooLong(_)) => {
                Category::Validation
            }
        }
    }
}
