//! [`ContactInfo`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use super::Listing;
use super::{address::Address, define_text, user::Email};

/// Seller contact snapshot taken when a [`Listing`] is submitted.
///
/// A single [`ContactInfo`] may back many [`Listing`]s.
#[derive(Clone, Debug)]
pub struct ContactInfo {
    /// ID of this [`ContactInfo`].
    pub id: Id,

    /// [`Name`] of the contact person.
    pub name: Name,

    /// [`Company`] the contact person represents, if any.
    pub company: Option<Company>,

    /// Postal [`Address`] of the contact person.
    pub address: Address,

    /// [`Phone`] of the contact person, if any.
    pub phone: Option<Phone>,

    /// [`Email`] of the contact person, if any.
    pub email: Option<Email>,

    /// [`Website`] of the contact person, if any.
    pub website: Option<Website>,

    /// Answers to "how did you hear about us".
    pub referral_sources: Vec<ReferralSource>,

    /// Indicator whether the seller accepted the marketplace terms.
    pub terms_accepted: bool,

    /// [`DateTime`] when this [`ContactInfo`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`ContactInfo`] was last modified.
    pub updated_at: ModificationDateTime,
}

/// ID of a [`ContactInfo`].
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
    #[doc = "Name of a contact person."]
    Name(256);

    #[doc = "Company name of a contact person."]
    Company(256);

    #[doc = "Website URL of a contact person."]
    Website(2048);

    #[doc = "Single \"how did you hear about us\" answer."]
    ReferralSource(128);
}

/// Phone number of a contact person.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: &str) -> bool {
        /// Digits optionally prefixed with `+` and separated by spaces,
        /// dashes, dots or parentheses.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[0-9](?:[0-9 ().-]{5,30})[0-9]$")
                .expect("valid regex")
        });

        REGEX.is_match(number)
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`ContactInfo`] was created.
pub type CreationDateTime = DateTimeOf<(ContactInfo, unit::Creation)>;

/// [`DateTime`] when a [`ContactInfo`] was last modified.
pub type ModificationDateTime = DateTimeOf<(ContactInfo, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::Phone;

    #[test]
    fn phone_format() {
        assert!(Phone::new("+1 (713) 555-0100").is_some());
        assert!(Phone::new("713.555.0100").is_some());
        assert!(Phone::new("555").is_none());
        assert!(Phone::new("call me").is_none());
        assert!(Phone::new("+1 713 555 0100 ").is_none());
    }
}
