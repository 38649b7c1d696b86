//! [`Command`] for marking a [`Listing`] as sold.

use common::{
    operations::{By, CompareAndSwap, Select},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{Sale, Status};
use crate::{
    domain::{
        listing::{self, Buyer, SaleNotes},
        Listing,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for recording the [`Sale`] of a [`Status::Published`] or
/// [`Status::Reserved`] [`Listing`].
#[derive(Clone, Debug)]
pub struct MarkListingSold {
    /// ID of the sold [`Listing`].
    pub listing_id: listing::Id,

    /// Price the [`Listing`] was sold for.
    pub price: Money,

    /// [`Buyer`] the [`Listing`] was sold to.
    pub buyer: Buyer,

    /// [`SaleNotes`] of the deal.
    pub notes: Option<SaleNotes>,
}

impl<Db> Command<MarkListingSold> for Service<Db>
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
        cmd: MarkListingSold,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkListingSold {
            listing_id,
            price,
            buyer,
            notes,
        } = cmd;

        if price.is_negative() {
            return Err(tracerr::new!(E::NegativePrice(price)));
        }
        if !price.fits_precision() {
            return Err(tracerr::new!(E::PriceTooLarge(price)));
        }

        let mut listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        listing
            .mark_sold(price, buyer, notes)
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

/// Error of [`MarkListingSold`] [`Command`] execution.
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

    /// Sale price is below zero.
    #[display("Sale price `{_0}` is negative")]
    NegativePrice(#[error(not(source))] Money),

    /// Sale price has more digits than can be stored.
    #[display("Sale price `{_0}` exceeds {} digits", Money::PRECISION)]
    PriceTooLarge(#[error(not(source))] Money),

    /// [`Listing`] is neither [`Status::Published`] nor
    /// [`Status::Reserved`].
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
            Self::NegativePrice(_) | Self::PriceTooLarge(_) => {
                Category::Validation
            }
            Self::Transition(_) => Category::InvalidTransition,
        }
    }
}
