//! [`Database`] implementations.

use common::operations::{
    By, Commit, CompareAndSwap, Delete, Insert, Lock, Select, Transact,
};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    domain::{
        contact_info, listing, listing::details, listing::media, user,
        ContactInfo, Listing, ListingDetails, MediaAttachment, User,
    },
    infra::{database, database::constraint, Database},
};

use super::{Connection, Error, Memory, NonTx, State, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(&self.0).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await.map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Option<User>, user::Id>>>
    for Memory<C>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| {
            s.users.get(&id).filter(|u| u.deleted_at.is_none()).cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Option<User>, user::Email>>>
    for Memory<C>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        self.read(|s| {
            s.users
                .values()
                .find(|u| u.deleted_at.is_none() && u.email == email)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<User>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            let occupied = user.deleted_at.is_none()
                && s.users.values().any(|u| {
                    u.id != user.id
                        && u.deleted_at.is_none()
                        && u.email == user.email
                });
            if occupied {
                return Err(Error::UniqueViolation(constraint::USERS_EMAIL));
            }
            drop(s.users.insert(user.id, user));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<User, user::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| {
            if s.listings.values().any(|l| l.owner_id == id) {
                return Err(Error::ForeignKeyViolation(
                    constraint::LISTINGS_OWNER_ID,
                ));
            }
            drop(s.users.remove(&id));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transaction is exclusive already.
        self.read(|_| ()).await.map_err(tracerr::wrap!())
    }
}

impl<C: Connection>
    Database<Select<By<Option<ContactInfo>, contact_info::Id>>>
    for Memory<C>
{
    type Ok = Option<ContactInfo>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ContactInfo>, contact_info::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.contact_infos.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<ContactInfo>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(info): Insert<ContactInfo>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            drop(s.contact_infos.insert(info.id, info));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection>
    Database<Select<By<Option<ListingDetails>, details::Id>>> for Memory<C>
{
    type Ok = Option<ListingDetails>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingDetails>, details::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.listing_details.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<ListingDetails>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(details): Insert<ListingDetails>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            drop(s.listing_details.insert(details.id, details));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Option<Listing>, listing::Id>>>
    for Memory<C>
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.listings.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Option<Listing>, details::Id>>>
    for Memory<C>
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, details::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| {
            s.listings
                .values()
                .find(|l| l.details_id == Some(id))
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Vec<Listing>, user::Id>>>
    for Memory<C>
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.read(|s| {
            s.listings
                .values()
                .filter(|l| l.owner_id == owner_id)
                .sorted_by_key(|l| (l.created_at, l.id))
                .cloned()
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection>
    Database<Select<By<Vec<listing::Id>, listing::ReservationDeadline>>>
    for Memory<C>
{
    type Ok = Vec<listing::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<listing::Id>, listing::ReservationDeadline>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        self.read(|s| {
            s.listings
                .values()
                .filter(|l| {
                    l.reservation().is_some_and(|r| r.until <= deadline)
                })
                .sorted_by_key(|l| l.reservation().map(|r| r.until))
                .map(|l| l.id)
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<Listing>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if s.listings.contains_key(&listing.id) {
                return Err(Error::UniqueViolation("listings_pkey"));
            }
            s.check_listing(&listing)?;
            drop(s.listings.insert(listing.id, listing));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<CompareAndSwap<Listing>> for Memory<C> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        CompareAndSwap(mut listing): CompareAndSwap<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            let current = s.listings.get(&listing.id).map(|l| l.version);
            if current != Some(listing.version) {
                return Ok(false);
            }
            s.check_listing(&listing)?;
            listing.version = listing.version.next();
            drop(s.listings.insert(listing.id, listing));
            Ok(true)
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Listing, listing::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transaction is exclusive already.
        self.read(|_| ()).await.map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<Listing, listing::Id>>>
    for Memory<C>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| {
            drop(s.listings.remove(&id));
            s.media_attachments.retain(|_, m| m.listing_id != id);
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Vec<MediaAttachment>, listing::Id>>>
    for Memory<C>
{
    type Ok = Vec<MediaAttachment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<MediaAttachment>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();
        self.read(|s| {
            s.media_attachments
                .values()
                .filter(|m| m.listing_id == listing_id)
                .sorted_by_key(|m| (m.display_order, m.id))
                .cloned()
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<MediaAttachment>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(attachment): Insert<MediaAttachment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if !s.listings.contains_key(&attachment.listing_id) {
                return Err(Error::ForeignKeyViolation(
                    constraint::MEDIA_ATTACHMENTS_LISTING_ID,
                ));
            }
            drop(s.media_attachments.insert(attachment.id, attachment));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Delete<By<MediaAttachment, media::Id>>>
    for Memory<C>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<MediaAttachment, media::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| {
            drop(s.media_attachments.remove(&id));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl State {
    /// Checks the provided [`Listing`] against the constraints of the
    /// `listings` table.
    fn check_listing(&self, listing: &Listing) -> Result<(), Error> {
        if !self.users.contains_key(&listing.owner_id) {
            return Err(Error::ForeignKeyViolation(
                constraint::LISTINGS_OWNER_ID,
            ));
        }
        if !self.contact_infos.contains_key(&listing.contact_info_id) {
            return Err(Error::ForeignKeyViolation(
                constraint::LISTINGS_CONTACT_INFO_ID,
            ));
        }
        if let Some(details_id) = listing.details_id {
            if !self.listing_details.contains_key(&details_id) {
                return Err(Error::ForeignKeyViolation(
                    constraint::LISTINGS_DETAILS_ID_FKEY,
                ));
            }
            let occupied = self.listings.values().any(|l| {
                l.id != listing.id && l.details_id == Some(details_id)
            });
            if occupied {
                return Err(Error::UniqueViolation(
                    constraint::LISTINGS_DETAILS_ID,
                ));
            }
        }
        Ok(())
    }
}
