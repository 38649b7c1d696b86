//! [`User`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::define_text;
#[cfg(doc)]
use super::Listing;

/// Marketplace account.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Email`] of this [`User`], unique across all [`User`]s.
    pub email: Email,

    /// Indicator whether the [`Email`] of this [`User`] was verified.
    pub email_verified: bool,

    /// Avatar [`Image`] of this [`User`], if any.
    pub image: Option<Image>,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was last modified.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`User`] was soft-deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`User`].
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
    Ord,
    PartialEq,
    PartialOrd,
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
    #[doc = "Display name of a [`User`]."]
    Name(256);

    #[doc = "URL of a [`User`] avatar image."]
    Image(2048);
}

/// Email address, stored lowercased.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: &str) -> bool {
        /// Loose shape of an email: `local@domain.tld` without whitespace.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("valid regex")
        });

        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

define_kind! {
    #[doc = "Policy of what happens to owned [`Listing`]s once their \
             [`User`] is deleted."]
    enum DeletionPolicy {
        #[doc = "[`User`] owning any [`Listing`] cannot be deleted."]
        Restrict,

        #[doc = "Owned [`Listing`]s are deleted together with the [`User`]."]
        Cascade,

        #[doc = "[`User`] is only marked as deleted, keeping everything it \
                 owns intact."]
        SoftDelete,
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was last modified.
pub type ModificationDateTime = DateTimeOf<(User, unit::Modification)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::Email;

    #[test]
    fn email_is_lowercased() {
        let email = Email::new("Sales@Acme.Example").unwrap();
        let address: &str = email.as_ref();
        assert_eq!(address, "sales@acme.example");
    }

    #[test]
    fn email_format() {
        assert!(Email::new("a@b.co").is_some());
        assert!(Email::new("a@b").is_none());
        assert!(Email::new("a b@c.de").is_none());
        assert!(Email::new("@c.de").is_none());
        assert!(Email::new("a@c.").is_none());
    }
}
