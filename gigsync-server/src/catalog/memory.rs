use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use gigsync_api::{GigError, GigResult, Setlist, TrackDetail};

use crate::catalog::Catalog;

/// In-process catalog, for tests and demo setups.
#[derive(Default)]
pub struct MemoryCatalog {
    setlists: RwLock<HashMap<i64, Setlist>>,
    tracks:   RwLock<HashMap<i64, TrackDetail>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a setlist and register each of its tracks with empty lyrics, unless already known.
    pub fn insert_setlist(&self, setlist: Setlist) {
        {
            let mut tracks = self.tracks.write().unwrap_or_else(PoisonError::into_inner);
            for track in setlist.sets.iter().flat_map(|set| set.tracks.iter()) {
                tracks.entry(track.id).or_insert_with(|| TrackDetail { track:  track.clone(),
                                                                       lyrics: String::new(), });
            }
        }

        self.setlists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(setlist.id, setlist);
    }

    pub fn insert_track(&self, detail: TrackDetail) {
        self.tracks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(detail.track.id, detail);
    }

    pub fn remove_setlist(&self, setlist_id: i64) -> Option<Setlist> {
        self.setlists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&setlist_id)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn load_setlist(&self, setlist_id: i64) -> GigResult<Setlist> {
        self.setlists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&setlist_id)
            .cloned()
            .ok_or(GigError::SetlistNotFound { setlist_id })
    }

    async fn load_track(&self, track_id: i64) -> GigResult<TrackDetail> {
        self.tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&track_id)
            .cloned()
            .ok_or(GigError::TrackNotFound { track_id })
    }
}
