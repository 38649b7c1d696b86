//! [`Query`] definition.

pub mod contact_info;
pub mod listing;
pub mod listing_details;
pub mod listings;
pub mod media_attachments;
pub mod user;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::{
        command::{AttachListingDetails, CreateListingDetails},
        domain::{listing::Status, user},
        query::{self, Query as _},
        Service,
    };

    #[tokio::test]
    async fn selects_owned_listings_in_creation_order() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let first = svc.seed_listing_of(&owner, Status::Draft).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = svc.seed_listing_of(&owner, Status::Published).await;
        _ = svc.seed_listing(Status::Published).await;

        let owned = svc
            .execute(query::listings::ByOwner::by(owner.id))
            .await
            .unwrap();

        assert_eq!(
            owned.iter().map(|l| l.id).collect::<Vec<_>>(),
            [first.id, second.id],
        );
    }

    #[tokio::test]
    async fn selects_user_by_email() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let user = svc.seed_user("jane@acme.example").await;

        let found = svc
            .execute(query::user::ByEmail::by(
                user::Email::new("JANE@acme.example").unwrap(),
            ))
            .await
            .unwrap();
        let missing = svc
            .execute(query::user::ByEmail::by(
                user::Email::new("john@acme.example").unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn selects_listing_by_attached_details() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Published).await;
        let details = svc
            .execute(CreateListingDetails::default())
            .await
            .unwrap();

        let before = svc
            .execute(query::listing::ByDetailsId::by(details.id))
            .await
            .unwrap();
        _ = svc
            .execute(AttachListingDetails {
                listing_id: listing.id,
                details_id: details.id,
            })
            .await
            .unwrap();
        let after = svc
            .execute(query::listing::ByDetailsId::by(details.id))
            .await
            .unwrap();

        assert!(before.is_none());
        assert_eq!(after.map(|l| l.id), Some(listing.id));
    }

    #[tokio::test]
    async fn selects_gallery_in_display_order() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let listing = svc.seed_listing(Status::Draft).await;
        let second = svc.seed_media(listing.id, 1).await;
        let first = svc.seed_media(listing.id, 0).await;

        let gallery = svc
            .execute(query::media_attachments::ByListing::by(listing.id))
            .await
            .unwrap();

        assert_eq!(
            gallery.iter().map(|m| m.id).collect::<Vec<_>>(),
            [first.id, second.id],
        );
    }
}
