//! [`Query`] collection related to a single [`Listing`].

use common::operations::By;

use crate::domain::{listing, Listing};
#[cfg(doc)]
use crate::{domain::ListingDetails, Query};

use super::DatabaseQuery;

/// Queries a [`Listing`] by its [`listing::Id`].
pub type ById = DatabaseQuery<By<Option<Listing>, listing::Id>>;

/// Queries a [`Listing`] by the ID of its attached [`ListingDetails`].
pub type ByDetailsId =
    DatabaseQuery<By<Option<Listing>, listing::details::Id>>;
