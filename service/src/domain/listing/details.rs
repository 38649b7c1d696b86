//! [`ListingDetails`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::define_text;
#[cfg(doc)]
use crate::domain::Listing;

/// Optional long-form specification sheet of a [`Listing`].
///
/// May exist without being attached to any [`Listing`].
#[derive(Clone, Debug)]
pub struct ListingDetails {
    /// ID of these [`ListingDetails`].
    pub id: Id,

    /// General description of the equipment.
    pub general_description: Option<Text>,

    /// Locating systems shipped with the equipment.
    pub locating_systems: Option<Text>,

    /// Mixing systems shipped with the equipment.
    pub mixing_systems: Option<Text>,

    /// Accessories shipped with the equipment.
    pub accessories: Option<Text>,

    /// Trailers shipped with the equipment.
    pub trailers: Option<Text>,

    /// Recent work done on or modifications of the equipment.
    pub recent_work: Option<Text>,

    /// Drill pipe information.
    pub pipe_info: Option<Text>,

    /// [`DateTime`] when these [`ListingDetails`] were created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when these [`ListingDetails`] were last modified.
    pub updated_at: ModificationDateTime,
}

/// ID of [`ListingDetails`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Free-text section of [`ListingDetails`]."]
    Text(16384);
}

/// [`DateTime`] when [`ListingDetails`] were created.
pub type CreationDateTime = DateTimeOf<(ListingDetails, unit::Creation)>;

/// [`DateTime`] when [`ListingDetails`] were last modified.
pub type ModificationDateTime =
    DateTimeOf<(ListingDetails, unit::Modification)>;
