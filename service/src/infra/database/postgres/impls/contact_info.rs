//! [`ContactInfo`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{address::Address, contact_info, ContactInfo},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<ContactInfo>, contact_info::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ContactInfo>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ContactInfo>, contact_info::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, company, \
                   street, city, state, zip_code, country, \
                   phone, email, website, \
                   referral_sources, terms_accepted, \
                   created_at, updated_at \
            FROM contact_infos \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| ContactInfo {
                id: row.get("id"),
                name: row.get("name"),
                company: row.get("company"),
                address: Address {
                    street: row.get("street"),
                    city: row.get("city"),
                    state: row.get("state"),
                    zip_code: row.get("zip_code"),
                    country: row.get("country"),
                },
                phone: row.get("phone"),
                email: row.get("email"),
                website: row.get("website"),
                referral_sources: row.get("referral_sources"),
                terms_accepted: row.get("terms_accepted"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }
}

impl<C> Database<Insert<ContactInfo>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(info): Insert<ContactInfo>,
    ) -> Result<Self::Ok, Self::Err> {
        let ContactInfo {
            id,
            name,
            company,
            address:
                Address {
                    street,
                    city,
                    state,
                    zip_code,
                    country,
                },
            phone,
            email,
            website,
            referral_sources,
            terms_accepted,
            created_at,
            updated_at,
        } = info;

        const SQL: &str = "\
            INSERT INTO contact_infos (\
                id, name, company, \
                street, city, state, zip_code, country, \
                phone, email, website, \
                referral_sources, terms_accepted, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, \
                $8::VARCHAR, \
                $9::VARCHAR, $10::VARCHAR, $11::VARCHAR, \
                $12::VARCHAR[], $13::BOOL, \
                $14::TIMESTAMPTZ, $15::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                company = EXCLUDED.company, \
                street = EXCLUDED.street, \
                city = EXCLUDED.city, \
                state = EXCLUDED.state, \
                zip_code = EXCLUDED.zip_code, \
                country = EXCLUDED.country, \
                phone = EXCLUDED.phone, \
                email = EXCLUDED.email, \
                website = EXCLUDED.website, \
                referral_sources = EXCLUDED.referral_sources, \
                terms_accepted = EXCLUDED.terms_accepted, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &company,
                &street,
                &city,
                &state,
                &zip_code,
                &country,
                &phone,
                &email,
                &website,
                &referral_sources,
                &terms_accepted,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
