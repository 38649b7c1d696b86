//! [`Command`] for creating a new [`Listing`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::Status;
use crate::{
    domain::{
        address::Address, contact_info, listing::Equipment, user, ContactInfo,
        Listing, User,
    },
    infra::{database, Database},
    Service,
};

use super::{Categorized, Category, Command};

/// [`Command`] for creating a new [`Status::Draft`] [`Listing`].
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// ID of the [`User`] owning a new [`Listing`].
    pub owner_id: user::Id,

    /// ID of the [`ContactInfo`] of the seller.
    pub contact_info_id: contact_info::Id,

    /// Asking price of a new [`Listing`].
    pub asking_price: Money,

    /// Listed [`Equipment`].
    pub equipment: Equipment,

    /// Indicator whether the listed equipment was repossessed.
    pub repossessed: bool,

    /// [`Address`] the listed equipment is located at.
    pub location: Address,
}

impl<Db> Command<CreateListing> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ContactInfo>, contact_info::Id>>,
            Ok = Option<ContactInfo>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Listing>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            owner_id,
            contact_info_id,
            asking_price,
            equipment,
            repossessed,
            location,
        } = cmd;

        if asking_price.is_negative() {
            return Err(tracerr::new!(E::NegativePrice(asking_price)));
        }
        if !asking_price.fits_precision() {
            return Err(tracerr::new!(E::PriceTooLarge(asking_price)));
        }

        self.database()
            .execute(Select(By::<Option<User>, _>::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(owner_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Select(By::<Option<ContactInfo>, _>::new(contact_info_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContactInfoNotExists(contact_info_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let listing = Listing::draft(
            owner_id,
            contact_info_id,
            asking_price,
            equipment,
            repossessed,
            location,
        );

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ContactInfo`] with the provided ID does not exist.
    #[display("`ContactInfo(id: {_0})` does not exist")]
    ContactInfoNotExists(#[error(not(source))] contact_info::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Asking price is below zero.
    #[display("Asking price `{_0}` is negative")]
    NegativePrice(#[error(not(source))] Money),

    /// Asking price has more digits than can be stored.
    #[display("Asking price `{_0}` exceeds {} digits", Money::PRECISION)]
    PriceTooLarge(#[error(not(source))] Money),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl Categorized for ExecutionError {
    fn category(&self) -> Category {
        match self {
            Self::Db(e) => e.category(),
            Self::NegativePrice(_) | Self::PriceTooLarge(_) => {
                Category::Validation
            }
            Self::ContactInfoNotExists(_) | Self::UserNotExists(_) => {
                Category::NotFound
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use rust_decimal::Decimal;

    use crate::{
        command::{Categorized as _, Category},
        domain::{
            address::Address,
            contact_info,
            listing::{Availability, Status, Version},
            user,
        },
        for_tests::{equipment, usd},
        Service,
    };

    use super::{Command as _, CreateListing};

    #[tokio::test]
    async fn creates_unavailable_draft() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let info = svc.seed_contact_info().await;

        let listing = svc
            .execute(CreateListing {
                owner_id: owner.id,
                contact_info_id: info.id,
                asking_price: usd(10_000),
                equipment: equipment(),
                repossessed: false,
                location: Address::default(),
            })
            .await
            .unwrap();

        assert_eq!(listing.status(), Status::Draft);
        assert_eq!(listing.availability(), Availability::Unavailable);
        assert_eq!(listing.version, Version::INITIAL);
        assert!(listing.reservation().is_none());
        assert!(listing.sale().is_none());
        let stored = svc.stored_listing(listing.id).await.unwrap();
        assert_eq!(stored.owner_id, owner.id);
    }

    #[tokio::test]
    async fn rejects_negative_price() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let info = svc.seed_contact_info().await;

        let err = svc
            .execute(CreateListing {
                owner_id: owner.id,
                contact_info_id: info.id,
                asking_price: Money::new(Decimal::from(-1), Currency::Usd),
                equipment: equipment(),
                repossessed: false,
                location: Address::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.category(), Category::Validation);
    }

    #[tokio::test]
    async fn bounds_price_by_storable_digits() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let info = svc.seed_contact_info().await;
        let create = |amount: Decimal| CreateListing {
            owner_id: owner.id,
            contact_info_id: info.id,
            asking_price: Money::new(amount, Currency::Usd),
            equipment: equipment(),
            repossessed: false,
            location: Address::default(),
        };

        let max = Decimal::new(99_999_999_999_999, 2);
        let listing = svc.execute(create(max)).await.unwrap();
        assert_eq!(listing.asking_price.amount(), max);

        let err = svc
            .execute(create(Decimal::from(10_i64.pow(12))))
            .await
            .unwrap_err();
        assert_eq!(err.category(), Category::Validation);
    }

    #[tokio::test]
    async fn accepts_zero_price() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let info = svc.seed_contact_info().await;

        let listing = svc
            .execute(CreateListing {
                owner_id: owner.id,
                contact_info_id: info.id,
                asking_price: usd(0),
                equipment: equipment(),
                repossessed: true,
                location: Address::default(),
            })
            .await
            .unwrap();

        assert!(listing.repossessed);
    }

    #[tokio::test]
    async fn requires_existing_references() {
        let svc = Service::in_memory(user::DeletionPolicy::Restrict);
        let owner = svc.seed_user("jane@acme.example").await;
        let info = svc.seed_contact_info().await;

        let no_owner = svc
            .execute(CreateListing {
                owner_id: user::Id::new(),
                contact_info_id: info.id,
                asking_price: usd(1),
                equipment: equipment(),
                repossessed: false,
                location: Address::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(no_owner.category(), Category::NotFound);

        let no_info = svc
            .execute(CreateListing {
                owner_id: owner.id,
                contact_info_id: contact_info::Id::new(),
                asking_price: usd(1),
                equipment: equipment(),
                repossessed: false,
                location: Address::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(no_info.category(), Category::NotFound);
    }
}
