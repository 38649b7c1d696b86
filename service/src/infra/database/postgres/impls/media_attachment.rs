//! [`MediaAttachment`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{
        listing::{self, media},
        MediaAttachment,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<MediaAttachment>, listing::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<MediaAttachment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<MediaAttachment>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, \
                   file_name, file_type, mime_type, file_size, \
                   storage_provider, storage_path, thumbnail_url, \
                   display_order, uploaded_at \
            FROM media_attachments \
            WHERE listing_id = $1::UUID \
            ORDER BY display_order, id";
        Ok(self
            .query(SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| MediaAttachment {
                id: row.get("id"),
                listing_id: row.get("listing_id"),
                file: media::File {
                    name: row.get("file_name"),
                    kind: row.get("file_type"),
                    mime_type: row.get("mime_type"),
                    size: row.get("file_size"),
                    provider: row.get("storage_provider"),
                    path: row.get("storage_path"),
                    thumbnail_url: row.get("thumbnail_url"),
                },
                display_order: row.get("display_order"),
                uploaded_at: row.get("uploaded_at"),
            })
            .collect())
    }
}

impl<C> Database<Insert<MediaAttachment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(attachment): Insert<MediaAttachment>,
    ) -> Result<Self::Ok, Self::Err> {
        let MediaAttachment {
            id,
            listing_id,
            file:
                media::File {
                    name,
                    kind,
                    mime_type,
                    size,
                    provider,
                    path,
                    thumbnail_url,
                },
            display_order,
            uploaded_at,
        } = attachment;

        // Only `display_order` ever changes for a stored file.
        const SQL: &str = "\
            INSERT INTO media_attachments (\
                id, listing_id, \
                file_name, file_type, mime_type, file_size, \
                storage_provider, storage_path, thumbnail_url, \
                display_order, uploaded_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, $6::INT8, \
                $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, \
                $10::INT4, $11::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET display_order = EXCLUDED.display_order";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &name,
                &kind,
                &mime_type,
                &size,
                &provider,
                &path,
                &thumbnail_url,
                &display_order,
                &uploaded_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<MediaAttachment, media::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<MediaAttachment, media::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM media_attachments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
