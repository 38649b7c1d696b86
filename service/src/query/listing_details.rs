//! [`Query`] collection related to a single [`ListingDetails`].

use common::operations::By;

use crate::domain::{listing::details, ListingDetails};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`ListingDetails`] by their [`details::Id`].
pub type ById = DatabaseQuery<By<Option<ListingDetails>, details::Id>>;
