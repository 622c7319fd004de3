//! Read access to the song catalog, needed when a gig starts and whenever its current track changes.

use async_trait::async_trait;

use gigsync_api::{GigResult, Setlist, TrackDetail};

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

mod memory;
mod sqlite;


#[async_trait]
pub trait Catalog: Send + Sync {
    /// Load a setlist with its sets and tracks, display names resolved.
    async fn load_setlist(&self, setlist_id: i64) -> GigResult<Setlist>;

    /// Load one track with everything the performer needs on screen.
    async fn load_track(&self, track_id: i64) -> GigResult<TrackDetail>;
}
