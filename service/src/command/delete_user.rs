//! [`Command`] for deleting a [`User`].

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::Config;
use crate::{
    domain::{listing, user, Listing, MediaAttachment, User},
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for deleting a [`User`] according to the configured
/// [`user::DeletionPolicy`].
///
/// [`user::DeletionPolicy`]: Config::user_deletion_policy
#[derive(Clone, Copy, Debug)]
pub struct DeleteUser {
    /// ID of the [`User`] to delete.
    pub user_id: user::Id,
}

impl<Db> Command<DeleteUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Listing>, user::Id>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<MediaAttachment>, listing::Id>>,
            Ok = Vec<MediaAttachment>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// [`MediaAttachment`]s of the [`Listing`]s deleted along with the
    /// [`User`], so their stored files may be cleaned up.
    type Ok = Vec<MediaAttachment>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUser) -> Result<Self::Ok, Self::Err> {
        use user::DeletionPolicy as Policy;
        use ExecutionError as E;

        let DeleteUser { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<User, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let mut removed = Vec::new();
        match self.config().user_deletion_policy {
            Policy::Restrict => {
                let owned = tx
                    .execute(Select(By::<Vec<Listing>, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if !owned.is_empty() {
                    return Err(tracerr::new!(E::UserOwnsListings(user_id)));
                }
                tx.execute(Delete(By::<User, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
            Policy::Cascade => {
                let owned = tx
                    .execute(Select(By::<Vec<Listing>, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                for listing in owned {
                    removed.extend(
                        tx.execute(Select(
                            By::<Vec<MediaAttachment>, _>::new(listing.id),
                        ))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?,
                    );
                    tx.execute(Delete(By::<Listing, _>::new(listing.id)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
                tx.execute(Delete(By::<User, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
            Policy::SoftDelete => {
                let now = DateTime::now();
                user.deleted_at = Some(now.coerce());
                user.updated_at = now.coerce();
                tx.execute(Insert(user))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(removed)
    }
}

/// Error of [`DeleteUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] still owns [`Listing`]s.
    #[display("`User(id: {_0})` owns `Listing`s")]
    UserOwnsListings(#[error(not(source))] user::Id),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::UserNotExists(_) => Category::NotFound,
            Self::UserOwnsListings(_) => Category::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{Categorized as _, Category},
        domain::{listing::Status, user, User},
        infra::Database as _,
        Service,
    };

    use super::{Command as _, DeleteUser};

    #[tokio::test]
    async fn restricts_owner_of_listings() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let listing = svc.seed_listing_of(&owner, Status::Draft).await;

        let err = svc
            .execute(DeleteUser { user_id: owner.id })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Conflict);
        assert!(svc.stored_listing(listing.id).await.is_some());
    }

    #[tokio::test]
    async fn deletes_user_without_listings() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let user = svc.seed_user("jane@acme.example").await;

        let removed =
            svc.execute(DeleteUser { user_id: user.id }).await.unwrap();

        assert!(removed.is_empty());
        let stored = svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(user.id)))
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn cascades_to_listings_and_galleries() {
        let svc = Service::in_memory(user::DeletionPolicy::Cascade);
        let owner = svc.seed_user("jane@acme.example").await;
        let first = svc.seed_listing_of(&owner, Status::Published).await;
        let second = svc.seed_listing_of(&owner, Status::Draft).await;
        let a = svc.seed_media(first.id, 0).await;
        let b = svc.seed_media(second.id, 0).await;

        let removed =
            svc.execute(DeleteUser { user_id: owner.id }).await.unwrap();

        let mut ids = removed.iter().map(|m| m.id).collect::<Vec<_>>();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(svc.stored_listing(first.id).await.is_none());
        assert!(svc.stored_listing(second.id).await.is_none());
        assert!(svc.stored_gallery(first.id).await.is_empty());
    }

    #[tokio::test]
    async fn soft_deletion_keeps_listings() {
        let svc = Service::in_memory(user::DeletionPolicy::SoftDelete);
        let owner = svc.seed_user("jane@acme.example").await;
        let listing = svc.seed_listing_of(&owner, Status::Published).await;

        let removed =
            svc.execute(DeleteUser { user_id: owner.id }).await.unwrap();

        assert!(removed.is_empty());
        assert!(svc.stored_listing(listing.id).await.is_some());
        let err = svc
            .execute(DeleteUser { user_id: owner.id })
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::NotFound);
    }
}
