//! Service contains the equipment marketplace business logic.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};

use crate::domain::user;
#[cfg(doc)]
use crate::{domain::User, infra::Database};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// [`task::ReleaseExpiredReservations`] configuration.
    pub release_expired_reservations:
        task::release_expired_reservations::Config,

    /// [`user::DeletionPolicy`] applied when a [`User`] is deleted.
    pub user_deletion_policy: user::DeletionPolicy,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its periodic [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ReleaseExpiredReservations<Self>,
                        task::release_expired_reservations::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service { config, database };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("ReleaseExpiredReservations", async move {
            svc.execute(Start(By::new(
                svc.config().release_expired_reservations,
            )))
            .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}

#[cfg(test)]
mod for_tests {
    //! Helpers shared by unit tests.

    use std::time::Duration;

    use common::{
        operations::{By, Insert, Select},
        Currency, DateTime, Money,
    };
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            address::Address,
            contact_info,
            listing::{self, media, Buyer, Equipment, Status},
            user, ContactInfo, Listing, MediaAttachment, User,
        },
        infra::{Database as _, Memory},
        task::release_expired_reservations,
        Config, Service,
    };

    impl Service<Memory> {
        /// Creates a new [`Service`] over an empty [`Memory`] database without
        /// starting any background tasks.
        pub(crate) fn in_memory(policy: user::DeletionPolicy) -> Self {
            Self {
                config: Config {
                    release_expired_reservations:
                        release_expired_reservations::Config {
                            interval: Duration::from_secs(60),
                        },
                    user_deletion_policy: policy,
                },
                database: Memory::default(),
            }
        }

        /// Stores a new [`User`] with the provided `email`.
        pub(crate) async fn seed_user(&self, email: &str) -> User {
            let now = DateTime::now();
            let user = User {
                id: user::Id::new(),
                name: user::Name::new("Jane Seller").unwrap(),
                email: user::Email::new(email).unwrap(),
                email_verified: true,
                image: None,
                created_at: now.coerce(),
                updated_at: now.coerce(),
                deleted_at: None,
            };
            self.database().execute(Insert(user.clone())).await.unwrap();
            user
        }

        /// Stores a new [`ContactInfo`].
        pub(crate) async fn seed_contact_info(&self) -> ContactInfo {
            let now = DateTime::now();
            let info = ContactInfo {
                id: contact_info::Id::new(),
                name: contact_info::Name::new("Jane Seller").unwrap(),
                company: None,
                address: Address::default(),
                phone: None,
                email: None,
                website: None,
                referral_sources: vec![],
                terms_accepted: true,
                created_at: now.coerce(),
                updated_at: now.coerce(),
            };
            self.database().execute(Insert(info.clone())).await.unwrap();
            info
        }

        /// Stores a new [`Listing`] of a new [`User`] walked into the
        /// provided [`Status`].
        pub(crate) async fn seed_listing(&self, status: Status) -> Listing {
            let owner = self
                .seed_user(&format!("{}@acme.example", user::Id::new()))
                .await;
            self.seed_listing_of(&owner, status).await
        }

        /// Stores a new [`Listing`] of the provided `owner` walked into the
        /// provided [`Status`].
        pub(crate) async fn seed_listing_of(
            &self,
            owner: &User,
            status: Status,
        ) -> Listing {
            let info = self.seed_contact_info().await;
            let mut l = Listing::draft(
                owner.id,
                info.id,
                usd(10_000),
                equipment(),
                false,
                Address::default(),
            );
            match status {
                Status::Draft => {}
                Status::PendingReview => l.submit_for_review().unwrap(),
                Status::Published => {
                    l.submit_for_review().unwrap();
                    l.publish().unwrap();
                }
                Status::Reserved => {
                    l.submit_for_review().unwrap();
                    l.publish().unwrap();
                    l.reserve(in_days(1)).unwrap();
                }
                Status::Sold => {
                    l.submit_for_review().unwrap();
                    l.publish().unwrap();
                    l.mark_sold(
                        usd(9_500),
                        Buyer::new("Acme Co").unwrap(),
                        None,
                    )
                    .unwrap();
                }
                Status::Archived => l.archive().unwrap(),
            }
            self.database().execute(Insert(l.clone())).await.unwrap();
            l
        }

        /// Stores a new [`Status::Reserved`] [`Listing`] held until the
        /// provided deadline.
        pub(crate) async fn seed_reserved_listing(
            &self,
            until: listing::ReservationDeadline,
        ) -> Listing {
            let owner = self
                .seed_user(&format!("{}@acme.example", user::Id::new()))
                .await;
            let info = self.seed_contact_info().await;
            let mut l = Listing::draft(
                owner.id,
                info.id,
                usd(10_000),
                equipment(),
                false,
                Address::default(),
            );
            l.submit_for_review().unwrap();
            l.publish().unwrap();
            l.reserve(until).unwrap();
            self.database().execute(Insert(l.clone())).await.unwrap();
            l
        }

        /// Stores a new [`MediaAttachment`] of the provided [`Listing`] at the
        /// provided position of its gallery.
        pub(crate) async fn seed_media(
            &self,
            listing_id: listing::Id,
            position: usize,
        ) -> MediaAttachment {
            let attachment = MediaAttachment {
                id: media::Id::new(),
                listing_id,
                file: image_file(&format!("photo-{position}.jpg")),
                display_order: media::DisplayOrder::at(position),
                uploaded_at: DateTime::now().coerce(),
            };
            self.database()
                .execute(Insert(attachment.clone()))
                .await
                .unwrap();
            attachment
        }

        /// Loads the stored state of the [`Listing`] with the provided ID.
        pub(crate) async fn stored_listing(
            &self,
            id: listing::Id,
        ) -> Option<Listing> {
            self.database()
                .execute(Select(By::<Option<Listing>, _>::new(id)))
                .await
                .unwrap()
        }

        /// Loads the stored gallery of the [`Listing`] with the provided ID.
        pub(crate) async fn stored_gallery(
            &self,
            id: listing::Id,
        ) -> Vec<MediaAttachment> {
            self.database()
                .execute(Select(By::<Vec<MediaAttachment>, _>::new(id)))
                .await
                .unwrap()
        }
    }

    /// Creates a new [`Money`] amount of whole US dollars.
    pub(crate) fn usd(amount: i64) -> Money {
        Money::new(Decimal::from(amount), Currency::Usd)
    }

    /// Returns a [`listing::ReservationDeadline`] the provided number of days
    /// away from now.
    pub(crate) fn in_days(days: i64) -> listing::ReservationDeadline {
        let secs = Duration::from_secs(days.unsigned_abs() * 24 * 60 * 60);
        let now = listing::ReservationDeadline::now();
        if days < 0 {
            now - secs
        } else {
            now + secs
        }
    }

    /// Returns a minimal [`Equipment`] description.
    pub(crate) fn equipment() -> Equipment {
        Equipment {
            manufacturer: listing::Manufacturer::new("Vermeer").unwrap(),
            model: listing::Model::new("D24x40").unwrap(),
            year: None,
            condition: None,
            serial_number: None,
            hours: None,
            miles: None,
        }
    }

    /// Returns a JPEG [`media::File`] stored in Firebase.
    pub(crate) fn image_file(name: &str) -> media::File {
        media::File {
            name: media::FileName::new(name).unwrap(),
            kind: media::FileType::Image,
            mime_type: media::MimeType::new("image/jpeg").unwrap(),
            size: media::FileSize::new(204_800).unwrap(),
            provider: media::StorageProvider::Firebase,
            path: media::StoragePath::new(format!("listings/{name}")).unwrap(),
            thumbnail_url: None,
        }
    }
}
