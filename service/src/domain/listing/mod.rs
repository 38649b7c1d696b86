//! [`Listing`] definitions.

pub mod details;
pub mod media;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use super::{ContactInfo, ListingDetails, MediaAttachment, User};
use super::{address::Address, contact_info, define_text, user};

/// Single piece of equipment offered for sale.
#[derive(Clone, Debug)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Listing`].
    pub owner_id: user::Id,

    /// ID of the [`ContactInfo`] of the seller.
    pub contact_info_id: contact_info::Id,

    /// ID of the [`ListingDetails`] attached to this [`Listing`], if any.
    ///
    /// Unique across all [`Listing`]s.
    pub details_id: Option<details::Id>,

    /// Publication workflow [`Status`] of this [`Listing`].
    status: Status,

    /// Asking price of this [`Listing`].
    pub asking_price: Money,

    /// Description of the listed [`Equipment`].
    pub equipment: Equipment,

    /// Indicator whether the listed equipment was repossessed.
    pub repossessed: bool,

    /// [`Address`] the listed equipment is located at.
    pub location: Address,

    /// Active [`Reservation`] of this [`Listing`].
    ///
    /// Present if and only if this [`Listing`] is [`Status::Reserved`].
    reservation: Option<Reservation>,

    /// [`Sale`] of this [`Listing`], once sold.
    sale: Option<Sale>,

    /// [`Version`] of this [`Listing`] used for optimistic concurrency.
    pub version: Version,

    /// [`DateTime`] when this [`Listing`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Listing`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Listing {
    /// Creates a new [`Status::Draft`] [`Listing`].
    #[must_use]
    pub fn draft(
        owner_id: user::Id,
        contact_info_id: contact_info::Id,
        asking_price: Money,
        equipment: Equipment,
        repossessed: bool,
        location: Address,
    ) -> Self {
        let now = common::DateTime::now();
        Self {
            id: Id::new(),
            owner_id,
            contact_info_id,
            details_id: None,
            status: Status::Draft,
            asking_price,
            equipment,
            repossessed,
            location,
            reservation: None,
            sale: None,
            version: Version::INITIAL,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    /// Restores a [`Listing`] from its persisted parts.
    ///
    /// Trusts the parts to satisfy the [`Listing`] invariants, so must only be
    /// used by storage implementations.
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    #[must_use]
    pub(crate) fn restore(
        id: Id,
        owner_id: user::Id,
        contact_info_id: contact_info::Id,
        details_id: Option<details::Id>,
        status: Status,
        asking_price: Money,
        equipment: Equipment,
        repossessed: bool,
        location: Address,
        reservation: Option<Reservation>,
        sale: Option<Sale>,
        version: Version,
        created_at: CreationDateTime,
        updated_at: ModificationDateTime,
    ) -> Self {
        Self {
            id,
            owner_id,
            contact_info_id,
            details_id,
            status,
            asking_price,
            equipment,
            repossessed,
            location,
            reservation,
            sale,
            version,
            created_at,
            updated_at,
        }
    }

    /// Returns the [`Status`] of this [`Listing`].
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the [`Availability`] of this [`Listing`].
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.status.availability()
    }

    /// Returns the active [`Reservation`] of this [`Listing`], if any.
    #[must_use]
    pub fn reservation(&self) -> Option<&Reservation> {
        self.reservation.as_ref()
    }

    /// Returns the [`Sale`] of this [`Listing`], if it was sold.
    #[must_use]
    pub fn sale(&self) -> Option<&Sale> {
        self.sale.as_ref()
    }

    /// Indicates whether this [`Listing`] is [`Status::Archived`].
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived
    }

    /// Moves this [`Listing`] from [`Status::Draft`] to
    /// [`Status::PendingReview`].
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is not a [`Status::Draft`].
    pub fn submit_for_review(&mut self) -> Result<(), TransitionError> {
        self.transit(Status::PendingReview)
    }

    /// Moves this [`Listing`] from [`Status::PendingReview`] to
    /// [`Status::Published`].
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is not [`Status::PendingReview`].
    pub fn publish(&mut self) -> Result<(), TransitionError> {
        if self.status != Status::PendingReview {
            return Err(self.invalid(Status::Published));
        }
        self.transit(Status::Published)
    }

    /// Holds this [`Status::Published`] [`Listing`] for a prospective buyer
    /// until the provided deadline.
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is not [`Status::Published`].
    pub fn reserve(
        &mut self,
        until: ReservationDeadline,
    ) -> Result<(), TransitionError> {
        self.transit(Status::Reserved)?;
        self.reservation = Some(Reservation {
            at: self.updated_at.coerce(),
            until,
        });
        Ok(())
    }

    /// Returns this [`Status::Reserved`] [`Listing`] back to
    /// [`Status::Published`].
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is not [`Status::Reserved`].
    pub fn release_reservation(
        &mut self,
    ) -> Result<Reservation, TransitionError> {
        if self.status != Status::Reserved {
            return Err(self.invalid(Status::Published));
        }
        self.transit(Status::Published)?;
        self.reservation.take().ok_or(TransitionError {
            listing_id: self.id,
            from: Status::Reserved,
            to: Status::Published,
        })
    }

    /// Marks this [`Status::Published`] or [`Status::Reserved`] [`Listing`]
    /// as sold.
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is neither [`Status::Published`] nor
    /// [`Status::Reserved`].
    pub fn mark_sold(
        &mut self,
        price: Money,
        buyer: Buyer,
        notes: Option<SaleNotes>,
    ) -> Result<(), TransitionError> {
        self.transit(Status::Sold)?;
        self.reservation = None;
        self.sale = Some(Sale {
            price,
            at: self.updated_at.coerce(),
            buyer,
            notes,
        });
        Ok(())
    }

    /// Appends the provided `notes` to the [`Sale`] of this [`Listing`].
    ///
    /// # Errors
    ///
    /// - If this [`Listing`] was never sold.
    /// - If the combined [`SaleNotes`] would exceed [`SaleNotes::MAX_LEN`].
    ///   Nothing is changed then.
    pub fn append_sale_notes(
        &mut self,
        notes: &SaleNotes,
    ) -> Result<(), SaleNotesError> {
        let id = self.id;
        let Some(sale) = self.sale.as_mut() else {
            return Err(self.invalid(Status::Sold).into());
        };
        let combined = match &sale.notes {
            Some(existing) => existing
                .appended(notes)
                .ok_or(SaleNotesError::TooLong(id))?,
            None => notes.clone(),
        };
        sale.notes = Some(combined);
        self.updated_at = common::DateTime::now().coerce();
        Ok(())
    }

    /// Moves this [`Listing`] to [`Status::Archived`], withdrawing any active
    /// [`Reservation`] while keeping the [`Sale`] audit.
    ///
    /// # Errors
    ///
    /// If this [`Listing`] is [`Status::Archived`] already.
    pub fn archive(&mut self) -> Result<(), TransitionError> {
        self.transit(Status::Archived)?;
        self.reservation = None;
        Ok(())
    }

    /// Switches [`Status`] of this [`Listing`] to the provided one, if the
    /// transition is allowed.
    fn transit(&mut self, to: Status) -> Result<(), TransitionError> {
        if !self.status.can_become(to) {
            return Err(self.invalid(to));
        }
        self.status = to;
        self.updated_at = common::DateTime::now().coerce();
        Ok(())
    }

    /// Builds a [`TransitionError`] from the current [`Status`] to the
    /// provided one.
    fn invalid(&self, to: Status) -> TransitionError {
        TransitionError {
            listing_id: self.id,
            from: self.status,
            to,
        }
    }
}

/// ID of a [`Listing`].
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

define_kind! {
    #[doc = "Publication workflow status of a [`Listing`]."]
    enum Status {
        #[doc = "Being prepared by its owner."]
        Draft,

        #[doc = "Waiting for a moderator review."]
        PendingReview,

        #[doc = "Visible to buyers."]
        Published,

        #[doc = "Held for a prospective buyer."]
        Reserved,

        #[doc = "Sold to a buyer."]
        Sold,

        #[doc = "Withdrawn from the marketplace."]
        Archived,
    }
}

impl Status {
    /// Indicates whether a [`Listing`] in this [`Status`] may move to the
    /// provided one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        matches!(
            (self, next),
            (S::Draft, S::PendingReview)
                | (S::PendingReview, S::Published)
                | (S::Published, S::Reserved)
                | (S::Reserved, S::Published)
                | (S::Published | S::Reserved, S::Sold)
                | (
                    S::Draft
                        | S::PendingReview
                        | S::Published
                        | S::Reserved
                        | S::Sold,
                    S::Archived,
                ),
        )
    }

    /// Returns the buyer-facing [`Availability`] of a [`Listing`] in this
    /// [`Status`].
    #[must_use]
    pub fn availability(self) -> Availability {
        match self {
            Self::Published => Availability::Available,
            Self::Reserved => Availability::Reserved,
            Self::Sold => Availability::Sold,
            Self::Draft | Self::PendingReview | Self::Archived => {
                Availability::Unavailable
            }
        }
    }
}

define_kind! {
    #[doc = "Buyer-facing availability of a [`Listing`]."]
    enum Availability {
        #[doc = "Can be bought."]
        Available,

        #[doc = "Held for another buyer."]
        Reserved,

        #[doc = "Already sold."]
        Sold,

        #[doc = "Not offered to buyers."]
        Unavailable,
    }
}

/// Error of a forbidden [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Listing(id: {listing_id})` cannot move from `{from}` to `{to}`")]
pub struct TransitionError {
    /// ID of the [`Listing`] the transition was attempted on.
    pub listing_id: Id,

    /// [`Status`] the [`Listing`] is in.
    pub from: Status,

    /// [`Status`] the transition was requested to.
    pub to: Status,
}

/// Error of appending [`SaleNotes`] to a [`Sale`].
#[derive(Clone, Copy, Debug, Display, Error, From)]
pub enum SaleNotesError {
    /// [`Listing`] was never sold.
    #[display("{_0}")]
    NotSold(TransitionError),

    /// Combined [`SaleNotes`] would exceed [`SaleNotes::MAX_LEN`].
    #[display(
        "Sale notes of `Listing(id: {_0})` would exceed {} bytes",
        SaleNotes::MAX_LEN
    )]
    #[from(ignore)]
    TooLong(#[error(not(source))] Id),
}

/// Optimistic concurrency version of a [`Listing`].
#[derive(
    Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i64);

impl Version {
    /// [`Version`] of a freshly created [`Listing`].
    pub const INITIAL: Self = Self(1);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Description of a listed piece of equipment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Equipment {
    /// [`Manufacturer`] of the equipment.
    pub manufacturer: Manufacturer,

    /// [`Model`] of the equipment.
    pub model: Model,

    /// Production [`Year`] of the equipment, if known.
    pub year: Option<Year>,

    /// [`Condition`] of the equipment, if stated.
    pub condition: Option<Condition>,

    /// [`SerialNumber`] of the equipment, if known.
    pub serial_number: Option<SerialNumber>,

    /// Engine [`Hours`] of the equipment, if known.
    pub hours: Option<Hours>,

    /// [`Miles`] driven by the equipment, if known.
    pub miles: Option<Miles>,
}

define_text! {
    #[doc = "Manufacturer of listed equipment."]
    Manufacturer(256);

    #[doc = "Model of listed equipment."]
    Model(256);

    #[doc = "Production year of listed equipment, as stated by the seller."]
    Year(32);

    #[doc = "Condition of listed equipment, as stated by the seller."]
    Condition(256);

    #[doc = "Serial number of listed equipment."]
    SerialNumber(128);

    #[doc = "Engine hours of listed equipment, as stated by the seller."]
    Hours(64);

    #[doc = "Mileage of listed equipment, as stated by the seller."]
    Miles(64);

    #[doc = "Buyer a [`Listing`] was sold to."]
    Buyer(512);
}

/// Free-form notes about a [`Sale`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SaleNotes(String);

impl SaleNotes {
    /// Maximum length of [`SaleNotes`] in bytes.
    pub const MAX_LEN: usize = 16 * 1024;

    /// Creates new [`SaleNotes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        (notes.trim() == notes
            && !notes.is_empty()
            && notes.len() <= Self::MAX_LEN)
            .then_some(Self(notes))
    }

    /// Returns these [`SaleNotes`] followed by the `other` ones on a new
    /// line, or [`None`] if the result would exceed [`SaleNotes::MAX_LEN`].
    #[must_use]
    fn appended(&self, other: &Self) -> Option<Self> {
        let len = self.0.len() + 1 + other.0.len();
        (len <= Self::MAX_LEN)
            .then(|| Self(format!("{}\n{}", self.0, other.0)))
    }
}

impl AsRef<str> for SaleNotes {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hold of a [`Listing`] for a prospective buyer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reservation {
    /// [`DateTime`] when the [`Reservation`] was made.
    pub at: ReservationDateTime,

    /// [`DateTime`] when the [`Reservation`] lapses.
    pub until: ReservationDeadline,
}

impl Reservation {
    /// Indicates whether this [`Reservation`] has lapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.until.is_past()
    }
}

/// Audit record of a sold [`Listing`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sale {
    /// Price the [`Listing`] was sold for.
    pub price: Money,

    /// [`DateTime`] when the [`Listing`] was sold.
    pub at: SaleDateTime,

    /// [`Buyer`] the [`Listing`] was sold to.
    pub buyer: Buyer,

    /// [`SaleNotes`], if any.
    pub notes: Option<SaleNotes>,
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;

/// [`DateTime`] when a [`Listing`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Listing, unit::Modification)>;

/// [`DateTime`] when a [`Reservation`] was made.
pub type ReservationDateTime = DateTimeOf<(Listing, unit::ReservationStart)>;

/// [`DateTime`] when a [`Reservation`] lapses.
pub type ReservationDeadline = DateTimeOf<(Listing, unit::ReservationEnd)>;

/// [`DateTime`] when a [`Listing`] was sold.
pub type SaleDateTime = DateTimeOf<(Listing, unit::Sale)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, Money};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Serialize};
    use strum::IntoEnumIterator as _;

    use crate::domain::{address::Address, contact_info, user};

    use super::{
        media, Availability, Buyer, Equipment, Listing, Manufacturer, Model,
        ReservationDeadline, SaleNotes, SaleNotesError, Status, Version,
    };

    fn listing() -> Listing {
        Listing::draft(
            user::Id::new(),
            contact_info::Id::new(),
            Money::new(Decimal::from(10_000), Currency::Usd),
            Equipment {
                manufacturer: Manufacturer::new("Vermeer").unwrap(),
                model: Model::new("D24x40").unwrap(),
                year: None,
                condition: None,
                serial_number: None,
                hours: None,
                miles: None,
            },
            false,
            Address::default(),
        )
    }

    fn in_two_days() -> ReservationDeadline {
        ReservationDeadline::now() + Duration::from_secs(2 * 24 * 60 * 60)
    }

    #[test]
    fn kinds_are_serializable() {
        fn assert_serde<T: Serialize + for<'de> Deserialize<'de>>() {}

        assert_serde::<Status>();
        assert_serde::<Availability>();
        assert_serde::<media::FileType>();
        assert_serde::<media::StorageProvider>();
    }

    #[test]
    fn availability_is_derived_from_status() {
        for status in Status::iter() {
            let expected = match status {
                Status::Published => Availability::Available,
                Status::Reserved => Availability::Reserved,
                Status::Sold => Availability::Sold,
                Status::Draft | Status::PendingReview | Status::Archived => {
                    Availability::Unavailable
                }
            };
            assert_eq!(status.availability(), expected, "{status}");
        }
    }

    #[test]
    fn archived_is_terminal() {
        for next in Status::iter() {
            assert!(!Status::Archived.can_become(next), "{next}");
        }
    }

    #[test]
    fn archive_reachable_from_everything_else() {
        for status in Status::iter().filter(|s| *s != Status::Archived) {
            assert!(status.can_become(Status::Archived), "{status}");
        }
    }

    #[test]
    fn sold_only_reachable_from_published_or_reserved() {
        for status in Status::iter() {
            assert_eq!(
                status.can_become(Status::Sold),
                matches!(status, Status::Published | Status::Reserved),
                "{status}",
            );
        }
    }

    #[test]
    fn new_listing_is_unavailable_draft() {
        let l = listing();
        assert_eq!(l.status(), Status::Draft);
        assert_eq!(l.availability(), Availability::Unavailable);
        assert_eq!(l.version, Version::INITIAL);
    }

    #[test]
    fn walks_happy_path() {
        let mut l = listing();
        l.submit_for_review().unwrap();
        l.publish().unwrap();
        assert_eq!(l.availability(), Availability::Available);

        let until = in_two_days();
        l.reserve(until).unwrap();
        assert_eq!(l.availability(), Availability::Reserved);
        assert_eq!(l.reservation().unwrap().until, until);

        l.mark_sold(
            Money::new(Decimal::from(9_500), Currency::Usd),
            Buyer::new("Acme Co").unwrap(),
            None,
        )
        .unwrap();
        assert_eq!(l.status(), Status::Sold);
        assert_eq!(l.availability(), Availability::Sold);
        assert!(l.reservation().is_none());
        let buyer: &str = l.sale().unwrap().buyer.as_ref();
        assert_eq!(buyer, "Acme Co");
    }

    #[test]
    fn release_restores_published() {
        let mut l = listing();
        l.submit_for_review().unwrap();
        l.publish().unwrap();
        l.reserve(in_two_days()).unwrap();

        _ = l.release_reservation().unwrap();

        assert_eq!(l.status(), Status::Published);
        assert!(l.reservation().is_none());
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let mut l = listing();
        assert!(l.publish().is_err());
        assert!(l.reserve(in_two_days()).is_err());
        assert!(l.release_reservation().is_err());
        let err = l
            .mark_sold(
                Money::new(Decimal::ONE, Currency::Usd),
                Buyer::new("Acme Co").unwrap(),
                None,
            )
            .unwrap_err();
        assert_eq!(err.from, Status::Draft);
        assert_eq!(err.to, Status::Sold);
        assert_eq!(l.status(), Status::Draft);
    }

    #[test]
    fn archive_keeps_sale_and_drops_reservation() {
        let mut reserved = listing();
        reserved.submit_for_review().unwrap();
        reserved.publish().unwrap();
        reserved.reserve(in_two_days()).unwrap();
        reserved.archive().unwrap();
        assert!(reserved.reservation().is_none());
        assert_eq!(reserved.availability(), Availability::Unavailable);

        let mut sold = listing();
        sold.submit_for_review().unwrap();
        sold.publish().unwrap();
        sold.mark_sold(
            Money::new(Decimal::ONE, Currency::Usd),
            Buyer::new("Acme Co").unwrap(),
            None,
        )
        .unwrap();
        sold.archive().unwrap();
        assert!(sold.sale().is_some());
        assert!(sold.archive().is_err());
    }

    #[test]
    fn appends_sale_notes() {
        let mut l = listing();
        let notes = SaleNotes::new("wire received").unwrap();
        assert!(l.append_sale_notes(&notes).is_err());

        l.submit_for_review().unwrap();
        l.publish().unwrap();
        l.mark_sold(
            Money::new(Decimal::ONE, Currency::Usd),
            Buyer::new("Acme Co").unwrap(),
            SaleNotes::new("deposit paid"),
        )
        .unwrap();
        l.append_sale_notes(&notes).unwrap();

        let notes: &str = l.sale().unwrap().notes.as_ref().unwrap().as_ref();
        assert_eq!(notes, "deposit paid\nwire received");
    }

    #[test]
    fn refuses_overflowing_sale_notes() {
        let mut l = listing();
        l.submit_for_review().unwrap();
        l.publish().unwrap();
        let full = "x".repeat(SaleNotes::MAX_LEN);
        l.mark_sold(
            Money::new(Decimal::ONE, Currency::Usd),
            Buyer::new("Acme Co").unwrap(),
            SaleNotes::new(full.clone()),
        )
        .unwrap();

        let err = l
            .append_sale_notes(&SaleNotes::new("final payment").unwrap())
            .unwrap_err();

        assert!(matches!(err, SaleNotesError::TooLong(id) if id == l.id));
        let notes: &str = l.sale().unwrap().notes.as_ref().unwrap().as_ref();
        assert_eq!(notes, full);
    }
}
