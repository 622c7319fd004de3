//! Operator-facing gig control: start a gig from a setlist, step through it, end it.
//!
//! Every step loads the gig from the [`SessionStore`], moves it, and writes it back before
//! answering, so a gig survives restarts and reconnects. Steps on the same gig are serialized
//! within this process; steps from another process sharing the database follow last-write-wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::*;

use gigsync_api::{Boundary, GigEnded, GigError, GigId, GigResult, GigSession, GigStarted, GigStep, GigView};

use crate::catalog::Catalog;
use crate::db::SessionStore;


#[derive(Clone)]
pub struct GigService {
    store:   SessionStore,
    catalog: Arc<dyn Catalog>,
    locks:   Arc<LockMap>,
}

type LockMap = Mutex<HashMap<GigId, Arc<tokio::sync::Mutex<()>>>>;

impl GigService {
    pub fn new(store: SessionStore, catalog: Arc<dyn Catalog>) -> Self {
        Self { store,
               catalog,
               locks: Default::default() }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[instrument(skip(self), err)]
    pub async fn start_gig(&self, setlist_id: i64) -> GigResult<GigStarted> {
        let setlist = self.catalog.load_setlist(setlist_id).await?;
        let gig_id = self.store.generate_id().await?;
        let gig = GigSession::create(gig_id, &setlist)?;

        // resolve the first track before anything is stored
        let current = self.view(&gig)
                          .await?
                          .ok_or_else(|| GigError::invalid("gig started past its last track"))?;

        self.store.put(&gig).await?;

        info!(%gig_id, name = gig.name(), sets = gig.sets().len(), tracks = gig.total_tracks(), "Gig started");

        Ok(GigStarted { gig_id, current })
    }

    pub async fn step_forward(&self, gig_id: GigId) -> GigResult<GigStep> {
        self.step(gig_id, GigSession::advance).await
    }

    pub async fn step_backward(&self, gig_id: GigId) -> GigResult<GigStep> {
        self.step(gig_id, GigSession::retreat).await
    }

    /// Where the gig currently stands, without moving it.
    pub async fn current(&self, gig_id: GigId) -> GigResult<Option<GigView>> {
        let gig = self.store.get(gig_id).await?;

        self.view(&gig).await
    }

    #[instrument(skip(self), err)]
    pub async fn end_gig(&self, gig_id: GigId) -> GigResult<GigEnded> {
        let entry = self.lock_for(gig_id);
        let _guard = entry.lock.lock().await;

        let deleted = self.store.delete(gig_id).await?;

        info!(%gig_id, deleted, "Gig ended");

        Ok(GigEnded { gig_id, deleted })
    }

    #[instrument(skip(self, movement), err)]
    async fn step(&self, gig_id: GigId, movement: fn(&mut GigSession) -> Boundary) -> GigResult<GigStep> {
        let entry = self.lock_for(gig_id);
        let _guard = entry.lock.lock().await;

        let mut gig = self.store.get(gig_id).await?;
        let boundary = movement(&mut gig);
        self.store.put(&gig).await?;

        let position = gig.position();
        debug!(?boundary, set = position.set, track = position.track, "Gig moved");

        Ok(GigStep { gig_id,
                     boundary,
                     current: self.view(&gig).await? })
    }

    async fn view(&self, gig: &GigSession) -> GigResult<Option<GigView>> {
        let track_id = match gig.current_track() {
            Some(track) => track.id,
            None => return Ok(None),
        };

        let detail = self.catalog.load_track(track_id).await?;

        Ok(GigView::current(gig, detail))
    }

    fn lock_for(&self, gig_id: GigId) -> GigLock<'_> {
        let lock = self.locks
                       .lock()
                       .unwrap_or_else(PoisonError::into_inner)
                       .entry(gig_id)
                       .or_default()
                       .clone();

        GigLock { locks: &self.locks,
                  gig_id,
                  lock }
    }
}

/// A handle on one gig's step lock. The map entry goes away with the last handle.
struct GigLock<'a> {
    locks:  &'a LockMap,
    gig_id: GigId,
    lock:   Arc<tokio::sync::Mutex<()>>,
}

impl Drop for GigLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // handles are only cloned under the map lock, so the map and this handle being the only
        // owners means nobody else is waiting on this gig
        let last = locks.get(&self.gig_id)
                        .map_or(false, |lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);

        if last {
            locks.remove(&self.gig_id);
        }
    }
}
