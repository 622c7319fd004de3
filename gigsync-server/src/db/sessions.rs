use sqlx::SqlitePool;
use tracing::*;

use gigsync_api::{GigError, GigId, GigResult, GigSession};

use crate::db::storage_error;

const MAX_ID_ATTEMPTS: usize = 8;

/// Durable store of running gigs, one opaque record per gig id.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Pick a random id not used by any stored gig.
    #[instrument(skip(self), err)]
    pub async fn generate_id(&self) -> GigResult<GigId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = GigId::random();
            if !self.exists(id).await? {
                return Ok(id);
            }

            debug!(%id, "Gig id already taken, drawing another");
        }

        Err(GigError::Io { error: format!("no free gig id after {MAX_ID_ATTEMPTS} attempts") })
    }

    pub async fn exists(&self, id: GigId) -> GigResult<bool> {
        let found = sqlx::query_as::<_, (i64,)>("SELECT id FROM gig WHERE id = ?").bind(id.as_i64())
                                                                                  .fetch_optional(&self.pool)
                                                                                  .await
                                                                                  .map_err(storage_error)?;

        Ok(found.is_some())
    }

    /// Write the whole gig under its id, replacing any earlier record.
    #[instrument(skip_all, fields(gig_id = %gig.id()), err)]
    pub async fn put(&self, gig: &GigSession) -> GigResult {
        let payload = gig.to_record()?;
        let position = gig.position();

        sqlx::query("INSERT OR REPLACE INTO gig (id, payload) VALUES (?, ?)").bind(gig.id().as_i64())
                                                                             .bind(payload)
                                                                             .execute(&self.pool)
                                                                             .await
                                                                             .map_err(storage_error)?;

        debug!(set = position.set, track = position.track, "Stored gig");

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: GigId) -> GigResult<GigSession> {
        let row = sqlx::query_as::<_, (Vec<u8>,)>("SELECT payload FROM gig WHERE id = ?").bind(id.as_i64())
                                                                                         .fetch_optional(&self.pool)
                                                                                         .await
                                                                                         .map_err(storage_error)?;

        match row {
            None => Err(GigError::NotFound { gig_id: id }),
            Some((payload,)) => GigSession::from_record(id, &payload),
        }
    }

    /// Remove the gig. Returns `false` when nothing was stored under `id`.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: GigId) -> GigResult<bool> {
        let deleted = sqlx::query("DELETE FROM gig WHERE id = ?").bind(id.as_i64())
                                                                 .execute(&self.pool)
                                                                 .await
                                                                 .map_err(storage_error)?
                                                                 .rows_affected();

        Ok(deleted > 0)
    }

    /// Remove every stored gig, returning how many were removed.
    #[instrument(skip(self), err)]
    pub async fn delete_all(&self) -> GigResult<u64> {
        let deleted = sqlx::query("DELETE FROM gig").execute(&self.pool)
                                                    .await
                                                    .map_err(storage_error)?
                                                    .rows_affected();

        Ok(deleted)
    }

    pub async fn count(&self) -> GigResult<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM gig").fetch_one(&self.pool)
                                                                              .await
                                                                              .map_err(storage_error)?;

        Ok(count)
    }
}
