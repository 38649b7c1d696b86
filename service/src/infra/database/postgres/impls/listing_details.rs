//! [`ListingDetails`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{listing::details, ListingDetails},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<ListingDetails>, details::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ListingDetails>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ListingDetails>, details::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, general_description, \
                   locating_systems, mixing_systems, \
                   accessories, trailers, recent_work, pipe_info, \
                   created_at, updated_at \
            FROM listing_details \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| ListingDetails {
                id: row.get("id"),
                general_description: row.get("general_description"),
                locating_systems: row.get("locating_systems"),
                mixing_systems: row.get("mixing_systems"),
                accessories: row.get("accessories"),
                trailers: row.get("trailers"),
                recent_work: row.get("recent_work"),
                pipe_info: row.get("pipe_info"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }
}

impl<C> Database<Insert<ListingDetails>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(details): Insert<ListingDetails>,
    ) -> Result<Self::Ok, Self::Err> {
        let ListingDetails {
            id,
            general_description,
            locating_systems,
            mixing_systems,
            accessories,
            trailers,
            recent_work,
            pipe_info,
            created_at,
            updated_at,
        } = details;

        const SQL: &str = "\
            INSERT INTO listing_details (\
                id, general_description, \
                locating_systems, mixing_systems, \
                accessories, trailers, recent_work, pipe_info, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::TEXT, \
                $3::TEXT, $4::TEXT, \
                $5::TEXT, $6::TEXT, $7::TEXT, $8::TEXT, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET general_description = EXCLUDED.general_description, \
                locating_systems = EXCLUDED.locating_systems, \
                mixing_systems = EXCLUDED.mixing_systems, \
                accessories = EXCLUDED.accessories, \
                trailers = EXCLUDED.trailers, \
                recent_work = EXCLUDED.recent_work, \
                pipe_info = EXCLUDED.pipe_info, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &general_description,
                &locating_systems,
                &mixing_systems,
                &accessories,
                &trailers,
                &recent_work,
                &pipe_info,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
