//! [`Command`] for creating new [`ListingDetails`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Listing;
use crate::{
    domain::{listing::details, ListingDetails},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating new [`ListingDetails`], not attached to any
/// [`Listing`] yet.
#[derive(Clone, Debug, Default)]
pub struct CreateListingDetails {
    /// General description of the equipment.
    pub general_description: Option<details::Text>,

    /// Locating systems shipped with the equipment.
    pub locating_systems: Option<details::Text>,

    /// Mixing systems shipped with the equipment.
    pub mixing_systems: Option<details::Text>,

    /// Accessories shipped with the equipment.
    pub accessories: Option<details::Text>,

    /// Trailers shipped with the equipment.
    pub trailers: Option<details::Text>,

    /// Recent work or modifications done to the equipment.
    pub recent_work: Option<details::Text>,

    /// Drill pipe information.
    pub pipe_info: Option<details::Text>,
}

impl<Db> Command<CreateListingDetails> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<ListingDetails>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ListingDetails;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateListingDetails,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateListingDetails {
            general_description,
            locating_systems,
            mixing_systems,
            accessories,
            trailers,
            recent_work,
            pipe_info,
        } = cmd;

        let now = DateTime::now();
        let details = ListingDetails {
            id: details::Id::new(),
            general_description,
            locating_systems,
            mixing_systems,
            accessories,
            trailers,
            recent_work,
            pipe_info,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;
        tx.execute(Insert(details.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(details)
    }
}

/// Error of [`CreateListingDetails`] [`Command`] execution.
pub type ExecutionError = database::Error;
