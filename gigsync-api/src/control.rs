//! Payloads returned by the gig control surface.

use serde::{Deserialize, Serialize};

use crate::gig::{Boundary, GigPosition, GigSession};
use crate::newtypes::GigId;
use crate::setlist::{TrackDetail, TrackSnapshot};

/// What the performer sees for the current track.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GigView {
    pub gig_id:   GigId,
    pub name:     String,
    pub set_name: String,
    pub position: GigPosition,
    pub track:    TrackSnapshot,
    pub lyrics:   String,
}

impl GigView {
    /// Build the view for the gig's current track, `None` once the show has ended.
    pub fn current(gig: &GigSession, detail: TrackDetail) -> Option<Self> {
        let set = gig.current_set()?;
        let track = gig.current_track()?.clone();

        Some(Self { gig_id: gig.id(),
                    name: gig.name().to_owned(),
                    set_name: set.name.clone(),
                    position: gig.position(),
                    track,
                    lyrics: detail.lyrics })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GigStarted {
    pub gig_id:  GigId,
    pub current: GigView,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GigStep {
    pub gig_id:   GigId,
    pub boundary: Boundary,
    pub current:  Option<GigView>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GigEnded {
    pub gig_id:  GigId,
    pub deleted: bool,
}
