//! [`Query`] collection related to the multiple [`Listing`]s.

use common::operations::By;

use crate::domain::{user, Listing};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries all [`Listing`]s owned by a [`User`], oldest first.
pub type ByOwner = DatabaseQuery<By<Vec<Listing>, user::Id>>;
