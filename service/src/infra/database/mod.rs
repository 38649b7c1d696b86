//! [`Database`]-related implementations.

#[cfg(any(feature = "memory", test))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(feature = "memory", test))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Names of the constraints guarding the marketplace invariants.
pub mod constraint {
    /// Uniqueness of an email among not deleted users.
    pub const USERS_EMAIL: &str = "users_email_key";

    /// Uniqueness of a details sheet among listings.
    pub const LISTINGS_DETAILS_ID: &str = "listings_details_id_key";

    /// Reference from a listing to its owner.
    pub const LISTINGS_OWNER_ID: &str = "listings_owner_id_fkey";

    /// Reference from a listing to its contact info.
    pub const LISTINGS_CONTACT_INFO_ID: &str = "listings_contact_info_id_fkey";

    /// Reference from a listing to its details sheet.
    pub const LISTINGS_DETAILS_ID_FKEY: &str = "listings_details_id_fkey";

    /// Reference from a media attachment to its listing.
    pub const MEDIA_ATTACHMENTS_LISTING_ID: &str =
        "media_attachments_listing_id_fkey";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(feature = "memory", test))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint
    /// (or any constraint, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(feature = "memory", test))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }

    /// Checks if the error is a foreign key violation of the specified
    /// constraint (or any constraint, if [`None`]).
    #[must_use]
    pub fn is_foreign_key_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(feature = "memory", test))]
            Self::Memory(e) => e.is_foreign_key_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_foreign_key_violation(constraint),
        }
    }
}
