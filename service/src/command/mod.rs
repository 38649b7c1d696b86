//! [`Command`] definition.

pub mod add_media_attachment;
pub mod append_listing_sale_notes;
pub mod archive_listing;
pub mod attach_listing_details;
pub mod create_contact_info;
pub mod create_listing;
pub mod create_listing_details;
pub mod create_user;
pub mod delete_listing;
pub mod delete_user;
pub mod detach_listing_details;
pub mod mark_listing_sold;
pub mod publish_listing;
pub mod release_listing_reservation;
pub mod remove_media_attachment;
pub mod reorder_media;
pub mod reserve_listing;
pub mod submit_listing_for_review;

use derive_more::Display;
use tracerr::Traced;

use crate::infra::database;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_media_attachment::AddMediaAttachment,
    append_listing_sale_notes::AppendListingSaleNotes,
    archive_listing::ArchiveListing,
    attach_listing_details::AttachListingDetails,
    create_contact_info::CreateContactInfo, create_listing::CreateListing,
    create_listing_details::CreateListingDetails, create_user::CreateUser,
    delete_listing::DeleteListing, delete_user::DeleteUser,
    detach_listing_details::DetachListingDetails,
    mark_listing_sold::MarkListingSold, publish_listing::PublishListing,
    release_listing_reservation::ReleaseListingReservation,
    remove_media_attachment::RemoveMediaAttachment,
    reorder_media::ReorderMedia, reserve_listing::ReserveListing,
    submit_listing_for_review::SubmitListingForReview,
};

/// Category of a [`Command`] execution error, telling the caller how to
/// react on it.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Category {
    /// Malformed input.
    #[display("VALIDATION")]
    Validation,

    /// Referenced entity does not exist.
    #[display("NOT_FOUND")]
    NotFound,

    /// Operation is not permitted in the current state of the entity.
    #[display("INVALID_TRANSITION")]
    InvalidTransition,

    /// Violated uniqueness or reference, or a lost concurrent modification
    /// race.
    #[display("CONFLICT")]
    Conflict,

    /// Infrastructure failure not caused by the caller.
    #[display("INTERNAL")]
    Internal,
}

impl Category {
    /// Indicates whether the caller may fix the error by changing its
    /// request or retrying it.
    #[must_use]
    pub fn is_recoverable(self) -> bool {
        self != Self::Internal
    }
}

/// Helper trait for classifying errors into [`Category`]s.
pub trait Categorized {
    /// Returns the [`Category`] of this error.
    fn category(&self) -> Category;
}

impl<E: Categorized> Categorized for Traced<E> {
    fn category(&self) -> Category {
        self.as_ref().category()
    }
}

impl Categorized for database::Error {
    fn category(&self) -> Category {
        // Referenced rows may be deleted concurrently.
        if self.is_unique_violation(None)
            || self.is_foreign_key_violation(None)
        {
            Category::Conflict
        } else {
            Category::Internal
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::infra::database::{self, constraint, memory};

    use super::{Categorized as _, Category};

    #[test]
    fn categorizes_database_errors() {
        for (err, expected) in [
            (
                memory::Error::UniqueViolation(constraint::USERS_EMAIL),
                Category::Conflict,
            ),
            (
                memory::Error::ForeignKeyViolation(
                    constraint::LISTINGS_OWNER_ID,
                ),
                Category::Conflict,
            ),
            (memory::Error::TxFinished, Category::Internal),
        ] {
            assert_eq!(database::Error::from(err).category(), expected);
        }
    }

    #[test]
    fn only_internal_is_unrecoverable() {
        assert!(Category::Conflict.is_recoverable());
        assert!(Category::Validation.is_recoverable());
        assert!(!Category::Internal.is_recoverable());
    }
}
