//! [`Query`] collection related to the gallery of a [`Listing`].

use common::operations::By;

use crate::domain::{listing, MediaAttachment};
#[cfg(doc)]
use crate::{domain::Listing, Query};

use super::DatabaseQuery;

/// Queries the [`MediaAttachment`]s of a [`Listing`] in their display order.
pub type ByListing = DatabaseQuery<By<Vec<MediaAttachment>, listing::Id>>;
