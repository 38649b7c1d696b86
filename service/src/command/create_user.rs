//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Image, Name};
use crate::{
    domain::{user, User},
    infra::{database, database::constraint, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`user::Email`] of a new [`User`].
    pub email: user::Email,

    /// Avatar [`Image`] of a new [`User`].
    pub image: Option<user::Image>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser { name, email, image } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(email.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            name,
            email,
            email_verified: false,
            image,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let inserted = tx.execute(Insert(user.clone())).await;
        if inserted.as_ref().is_err_and(|e| {
            e.as_ref().is_unique_violation(Some(constraint::USERS_EMAIL))
        }) {
            // Lost the race against a concurrent registration.
            return Err(tracerr::new!(E::EmailOccupied(user.email)));
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already used by another [`User`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::EmailOccupied(_) => Category::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Categorized as _, Category},
        domain::user,
        Service,
    };

    use super::{Command as _, CreateUser};

    fn cmd(email: &str) -> CreateUser {
        CreateUser {
            name: user::Name::new("Jane Seller").unwrap(),
            email: user::Email::new(email).unwrap(),
            image: None,
        }
    }

    #[tokio::test]
    async fn creates_unverified_user() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);

        let user = svc.execute(cmd("jane@acme.example")).await.unwrap();

        assert!(!user.email_verified);
        assert!(user.deleted_at.is_none());
    }

    #[tokio::test]
    async fn rejects_occupied_email_case_insensitively() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        _ = svc.execute(cmd("jane@acme.example")).await.unwrap();

        let err = svc.execute(cmd("Jane@ACME.example")).await.unwrap_err();

        assert_eq!(err.category(), Category::Conflict);
    }

    #[tokio::test]
    async fn frees_email_of_soft_deleted_user() {
        let svc = Service::in_memory(user::DeletionPolicy::SoftDelete);
        let old = svc.seed_user("jane@acme.example").await;
        _ = svc
            .execute(crate::command::DeleteUser { user_id: old.id })
            .await
            .unwrap();

        let new = svc.execute(cmd("jane@acme.example")).await.unwrap();

        assert_ne!(new.id, old.id);
    }
}
