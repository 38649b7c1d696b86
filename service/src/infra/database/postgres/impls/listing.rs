//! [`Listing`]-related [`Database`] implementations.

use common::{
    operations::{By, CompareAndSwap, Delete, Insert, Lock, Select},
    Currency, Money,
};
use rust_decimal::Decimal;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::{
    domain::{
        address::{self, Address},
        contact_info,
        listing::{
            self, details, Availability, Buyer, Equipment, Reservation, Sale,
            SaleNotes, Status,
        },
        user, Listing,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, Tx},
            Postgres,
        },
        Database,
    },
};

/// Columns of the `listings` table in the order [`Params::as_slice()`]
/// provides them.
const COLUMNS: &str = "\
    id, owner_id, contact_info_id, details_id, status, availability, \
    asking_price, currency, \
    manufacturer, model, year, condition, serial_number, hours, miles, \
    repossessed, street, city, state, zip_code, country, \
    reserved_at, reserved_until, \
    sold_price, sold_currency, sold_at, buyer, sale_notes, \
    version, created_at, updated_at";

/// Builds a [`Listing`] out of the provided [`Row`] containing [`COLUMNS`].
fn from_row(row: &Row) -> Listing {
    let reservation = row
        .get::<_, Option<listing::ReservationDateTime>>("reserved_at")
        .zip(row.get("reserved_until"))
        .map(|(at, until)| Reservation { at, until });

    let sold_price = row
        .get::<_, Option<Decimal>>("sold_price")
        .zip(row.get::<_, Option<Currency>>("sold_currency"))
        .map(|(amount, currency)| Money::new(amount, currency));
    let sale = sold_price
        .zip(row.get::<_, Option<listing::SaleDateTime>>("sold_at"))
        .zip(row.get::<_, Option<Buyer>>("buyer"))
        .map(|((price, at), buyer)| Sale {
            price,
            at,
            buyer,
            notes: row.get("sale_notes"),
        });

    Listing::restore(
        row.get("id"),
        row.get("owner_id"),
        row.get("contact_info_id"),
        row.get("details_id"),
        row.get("status"),
        Money::new(row.get("asking_price"), row.get("currency")),
        Equipment {
            manufacturer: row.get("manufacturer"),
            model: row.get("model"),
            year: row.get("year"),
            condition: row.get("condition"),
            serial_number: row.get("serial_number"),
            hours: row.get("hours"),
            miles: row.get("miles"),
        },
        row.get("repossessed"),
        Address {
            street: row.get("street"),
            city: row.get("city"),
            state: row.get("state"),
            zip_code: row.get("zip_code"),
            country: row.get("country"),
        },
        reservation,
        sale,
        row.get("version"),
        row.get("created_at"),
        row.get("updated_at"),
    )
}

/// Query parameters of a [`Listing`] row.
struct Params {
    id: listing::Id,
    owner_id: user::Id,
    contact_info_id: contact_info::Id,
    details_id: Option<details::Id>,
    status: Status,
    availability: Availability,
    asking_price: Decimal,
    currency: Currency,
    manufacturer: listing::Manufacturer,
    model: listing::Model,
    year: Option<listing::Year>,
    condition: Option<listing::Condition>,
    serial_number: Option<listing::SerialNumber>,
    hours: Option<listing::Hours>,
    miles: Option<listing::Miles>,
    repossessed: bool,
    street: Option<address::Street>,
    city: Option<address::City>,
    state: Option<address::State>,
    zip_code: Option<address::ZipCode>,
    country: Option<address::Country>,
    reserved_at: Option<listing::ReservationDateTime>,
    reserved_until: Option<listing::ReservationDeadline>,
    sold_price: Option<Decimal>,
    sold_currency: Option<Currency>,
    sold_at: Option<listing::SaleDateTime>,
    buyer: Option<Buyer>,
    sale_notes: Option<SaleNotes>,
    version: listing::Version,
    created_at: listing::CreationDateTime,
    updated_at: listing::ModificationDateTime,
}

impl Params {
    /// Number of the [`Params`].
    const LEN: usize = 31;

    /// Returns these [`Params`] in the order of [`COLUMNS`].
    fn as_slice(&self) -> [&(dyn ToSql + Sync); Self::LEN] {
        [
            &self.id,
            &self.owner_id,
            &self.contact_info_id,
            &self.details_id,
            &self.status,
            &self.availability,
            &self.asking_price,
            &self.currency,
            &self.manufacturer,
            &self.model,
            &self.year,
            &self.condition,
            &self.serial_number,
            &self.hours,
            &self.miles,
            &self.repossessed,
            &self.street,
            &self.city,
            &self.state,
            &self.zip_code,
            &self.country,
            &self.reserved_at,
            &self.reserved_until,
            &self.sold_price,
            &self.sold_currency,
            &self.sold_at,
            &self.buyer,
            &self.sale_notes,
            &self.version,
            &self.created_at,
            &self.updated_at,
        ]
    }
}

impl From<Listing> for Params {
    fn from(listing: Listing) -> Self {
        let status = listing.status();
        let reservation = listing.reservation().copied();
        let sale = listing.sale().cloned();
        let Listing {
            id,
            owner_id,
            contact_info_id,
            details_id,
            asking_price,
            equipment,
            repossessed,
            location,
            version,
            created_at,
            updated_at,
            ..
        } = listing;

        Self {
            id,
            owner_id,
            contact_info_id,
            details_id,
            status,
            availability: status.availability(),
            asking_price: asking_price.amount(),
            currency: asking_price.currency(),
            manufacturer: equipment.manufacturer,
            model: equipment.model,
            year: equipment.year,
            condition: equipment.condition,
            serial_number: equipment.serial_number,
            hours: equipment.hours,
            miles: equipment.miles,
            repossessed,
            street: location.street,
            city: location.city,
            state: location.state,
            zip_code: location.zip_code,
            country: location.country,
            reserved_at: reservation.map(|r| r.at),
            reserved_until: reservation.map(|r| r.until),
            sold_price: sale.as_ref().map(|s| s.price.amount()),
            sold_currency: sale.as_ref().map(|s| s.price.currency()),
            sold_at: sale.as_ref().map(|s| s.at),
            buyer: sale.as_ref().map(|s| s.buyer.clone()),
            sale_notes: sale.and_then(|s| s.notes),
            version,
            created_at,
            updated_at,
        }
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Listing>, details::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, details::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let details_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             WHERE details_id = $1::UUID",
        );
        Ok(self
            .query_opt(&sql, &[&details_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Listing>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             WHERE owner_id = $1::UUID \
             ORDER BY created_at, id",
        );
        Ok(self
            .query(&sql, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<listing::Id>, listing::ReservationDeadline>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<listing::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<listing::Id>, listing::ReservationDeadline>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE status = 'RESERVED' \
              AND reserved_until <= $1::TIMESTAMPTZ \
            ORDER BY reserved_until";
        Ok(self
            .query(SQL, &[&deadline])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| row.get("id"))
            .collect())
    }
}

impl<C> Database<Insert<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let params = Params::from(listing);

        let sql = format!(
            "INSERT INTO listings ({COLUMNS}) \
             VALUES (\
                 $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                 $5::VARCHAR, $6::VARCHAR, \
                 $7::NUMERIC, $8::VARCHAR, \
                 $9::VARCHAR, $10::VARCHAR, $11::VARCHAR, $12::VARCHAR, \
                 $13::VARCHAR, $14::VARCHAR, $15::VARCHAR, \
                 $16::BOOL, \
                 $17::VARCHAR, $18::VARCHAR, $19::VARCHAR, $20::VARCHAR, \
                 $21::VARCHAR, \
                 $22::TIMESTAMPTZ, $23::TIMESTAMPTZ, \
                 $24::NUMERIC, $25::VARCHAR, $26::TIMESTAMPTZ, \
                 $27::VARCHAR, $28::TEXT, \
                 $29::INT8, $30::TIMESTAMPTZ, $31::TIMESTAMPTZ\
             )",
        );
        self.exec(&sql, &params.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<CompareAndSwap<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        CompareAndSwap(listing): CompareAndSwap<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let params = Params::from(listing);

        // `id` and `created_at` are never changed, and `version` is only
        // compared and incremented.
        const SQL: &str = "\
            UPDATE listings \
            SET owner_id = $2::UUID, \
                contact_info_id = $3::UUID, \
                details_id = $4::UUID, \
                status = $5::VARCHAR, \
                availability = $6::VARCHAR, \
                asking_price = $7::NUMERIC, \
                currency = $8::VARCHAR, \
                manufacturer = $9::VARCHAR, \
                model = $10::VARCHAR, \
                year = $11::VARCHAR, \
                condition = $12::VARCHAR, \
                serial_number = $13::VARCHAR, \
                hours = $14::VARCHAR, \
                miles = $15::VARCHAR, \
                repossessed = $16::BOOL, \
                street = $17::VARCHAR, \
                city = $18::VARCHAR, \
                state = $19::VARCHAR, \
                zip_code = $20::VARCHAR, \
                country = $21::VARCHAR, \
                reserved_at = $22::TIMESTAMPTZ, \
                reserved_until = $23::TIMESTAMPTZ, \
                sold_price = $24::NUMERIC, \
                sold_currency = $25::VARCHAR, \
                sold_at = $26::TIMESTAMPTZ, \
                buyer = $27::VARCHAR, \
                sale_notes = $28::TEXT, \
                version = version + 1, \
                updated_at = $31::TIMESTAMPTZ \
            WHERE id = $1::UUID \
              AND version = $29::INT8 \
              AND created_at = $30::TIMESTAMPTZ";
        self.exec(SQL, &params.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|updated| updated == 1)
    }
}

impl Database<Lock<By<Listing, listing::Id>>> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // `media_attachments` rows go away via `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM listings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
