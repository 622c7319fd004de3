use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::*;

use gigsync_api::{GigError, GigResult, SetSnapshot, Setlist, TrackDetail, TrackSnapshot};

use crate::catalog::Catalog;
use crate::db::storage_error;

const TRACK_COLUMNS: &str = "track.id AS id,
                             track.title AS title,
                             track.tempo AS tempo,
                             track.click AS click,
                             COALESCE(track.key_tone, '') AS key_tone,
                             COALESCE(vox.name, '') AS voice_name,
                             COALESCE(era.name, '') AS era_name,
                             COALESCE(genre.name, '') AS genre_name,
                             COALESCE(kit.name, '') AS kit_name";

const TRACK_JOINS: &str = "LEFT JOIN vox ON vox.id = track.vox_id
                           LEFT JOIN era ON era.id = track.era_id
                           LEFT JOIN genre ON genre.id = track.genre_id
                           LEFT JOIN kit ON kit.id = track.kit_id";

#[derive(FromRow)]
struct TrackRow {
    id:         i64,
    title:      String,
    tempo:      i64,
    click:      i64,
    key_tone:   String,
    voice_name: String,
    era_name:   String,
    genre_name: String,
    kit_name:   String,
}

impl From<TrackRow> for TrackSnapshot {
    fn from(row: TrackRow) -> Self {
        Self { id:            row.id,
               title:         row.title,
               tempo:         u32::try_from(row.tempo).unwrap_or_default(),
               click_enabled: row.click != 0,
               key_tone:      row.key_tone,
               voice_name:    row.voice_name,
               era_name:      row.era_name,
               genre_name:    row.genre_name,
               kit_name:      row.kit_name, }
    }
}

#[derive(FromRow)]
struct SetRow {
    id:     i64,
    name:   String,
    setnum: i64,
}

/// Catalog backed by the application's sqlite tables.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_set_tracks(&self, set_id: i64) -> GigResult<Vec<TrackSnapshot>> {
        let query = format!("SELECT {TRACK_COLUMNS}
                             FROM sets_tracks
                             JOIN track ON track.id = sets_tracks.track_id
                             {TRACK_JOINS}
                             WHERE sets_tracks.set_id = ?
                             ORDER BY sets_tracks.seq ASC");

        let rows = sqlx::query_as::<_, TrackRow>(&query).bind(set_id)
                                                        .fetch_all(&self.pool)
                                                        .await
                                                        .map_err(storage_error)?;

        Ok(rows.into_iter().map(TrackSnapshot::from).collect())
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    #[instrument(skip(self), err)]
    async fn load_setlist(&self, setlist_id: i64) -> GigResult<Setlist> {
        let name = sqlx::query_as::<_, (String,)>("SELECT name FROM setlist WHERE id = ?").bind(setlist_id)
                                                                                          .fetch_optional(&self.pool)
                                                                                          .await
                                                                                          .map_err(storage_error)?
                                                                                          .map(|(name,)| name)
                                                                                          .ok_or(GigError::SetlistNotFound { setlist_id })?;

        let set_rows = sqlx::query_as::<_, SetRow>("SELECT id, name, setnum FROM a_set
                                                    WHERE setlist_id = ?
                                                    ORDER BY setnum ASC, id ASC").bind(setlist_id)
                                                                                 .fetch_all(&self.pool)
                                                                                 .await
                                                                                 .map_err(storage_error)?;

        let mut sets = Vec::with_capacity(set_rows.len());
        for row in set_rows {
            sets.push(SetSnapshot { tracks:  self.load_set_tracks(row.id).await?,
                                    id:      row.id,
                                    name:    row.name,
                                    ordinal: row.setnum, });
        }

        debug!(sets = sets.len(), "Loaded setlist");

        Ok(Setlist { id: setlist_id,
                     name,
                     sets })
    }

    #[instrument(skip(self), err)]
    async fn load_track(&self, track_id: i64) -> GigResult<TrackDetail> {
        let query = format!("SELECT {TRACK_COLUMNS}
                             FROM track
                             {TRACK_JOINS}
                             WHERE track.id = ?");

        let track = sqlx::query_as::<_, TrackRow>(&query).bind(track_id)
                                                         .fetch_optional(&self.pool)
                                                         .await
                                                         .map_err(storage_error)?
                                                         .ok_or(GigError::TrackNotFound { track_id })?;

        let lyrics = sqlx::query_as::<_, (Option<String>,)>("SELECT lyrics.text FROM track
                                                              JOIN lyrics ON lyrics.id = track.lyrics_id
                                                              WHERE track.id = ?").bind(track_id)
                                                                                  .fetch_optional(&self.pool)
                                                                                  .await
                                                                                  .map_err(storage_error)?
                                                                                  .and_then(|(text,)| text)
                                                                                  .unwrap_or_default();

        Ok(TrackDetail { track: track.into(),
                         lyrics })
    }
}
