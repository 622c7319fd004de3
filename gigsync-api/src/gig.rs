//! Where a gig stands inside its setlist, and how it moves.
//!
//! A gig is addressed by a two-level `(set, track)` position. Moving past the last track of a set
//! spills into the next set and moving before the first track spills into the previous one; each
//! spill is reported as a [`Boundary`] so callers never infer edges from raw indices.
//!
//! The position `(sets.len(), 0)` is the terminal "end of show" state. It is a real, persisted
//! state: advancing again re-reports [`Boundary::EndOfShow`].

use derive_more::IsVariant;
use serde::{Deserialize, Serialize};

use crate::error::{GigError, GigResult};
use crate::newtypes::GigId;
use crate::setlist::{SetSnapshot, Setlist, TrackSnapshot};

pub use record::GIG_RECORD_VERSION;

mod record;


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IsVariant)]
#[serde(rename_all = "snake_case", tag = "kind", content = "set_name")]
pub enum Boundary {
    /// Moved within the current set.
    Normal,
    /// Left the named set and landed on the first track of the next one.
    EndOfSet(String),
    /// Moved past the last track of the last set.
    EndOfShow,
    /// Left the named set backwards and landed on the last track of the previous one.
    BeginningOfSet(String),
    /// Tried to move before the first track of the first set.
    BeginningOfShow,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GigPosition {
    pub set:   usize,
    pub track: usize,
}

impl GigPosition {
    pub const fn new(set: usize, track: usize) -> Self {
        Self { set, track }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GigSession {
    id:            GigId,
    name:          String,
    current_set:   usize,
    current_track: usize,
    sets:          Vec<SetSnapshot>,
}

impl GigSession {
    /// Start a gig at the first track of the first set. The setlist is copied by value, so later
    /// catalog edits do not reach a running gig.
    pub fn create(id: GigId, setlist: &Setlist) -> GigResult<Self> {
        Ok(Self { id,
                  name: setlist.name.clone(),
                  current_set: 0,
                  current_track: 0,
                  sets: setlist.snapshot()? })
    }

    pub fn id(&self) -> GigId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sets(&self) -> &[SetSnapshot] {
        &self.sets
    }

    pub fn position(&self) -> GigPosition {
        GigPosition::new(self.current_set, self.current_track)
    }

    pub fn total_tracks(&self) -> usize {
        self.sets.iter().map(SetSnapshot::track_count).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.current_set >= self.sets.len()
    }

    pub fn current_set(&self) -> Option<&SetSnapshot> {
        self.sets.get(self.current_set)
    }

    /// The track at the current position, `None` once the show has ended.
    pub fn current_track(&self) -> Option<&TrackSnapshot> {
        self.current_set().and_then(|set| set.tracks.get(self.current_track))
    }

    pub fn advance(&mut self) -> Boundary {
        if self.is_finished() {
            return Boundary::EndOfShow;
        }

        let set = &self.sets[self.current_set];
        if self.current_track + 1 < set.track_count() {
            self.current_track += 1;
            return Boundary::Normal;
        }

        let leaving = set.name.clone();

        self.current_set += 1;
        self.current_track = 0;

        if self.is_finished() {
            Boundary::EndOfShow
        } else {
            Boundary::EndOfSet(leaving)
        }
    }

    pub fn retreat(&mut self) -> Boundary {
        if self.is_finished() {
            // step back onto the last track of the show
            self.current_set = self.sets.len() - 1;
            self.current_track = self.sets[self.current_set].track_count() - 1;
            return Boundary::Normal;
        }

        if self.current_track > 0 {
            self.current_track -= 1;
            return Boundary::Normal;
        }

        if self.current_set == 0 {
            return Boundary::BeginningOfShow;
        }

        let leaving = self.sets[self.current_set].name.clone();

        self.current_set -= 1;
        self.current_track = self.sets[self.current_set].track_count() - 1;

        Boundary::BeginningOfSet(leaving)
    }

    /// Check the index invariants. Records read back from storage go through this before use.
    pub fn validate(&self) -> GigResult {
        let fail = |reason: String| Err(GigError::invalid(reason));

        if self.sets.is_empty() {
            return fail(format!("gig {} has no sets", self.id));
        }

        if let Some(set) = self.sets.iter().find(|set| set.tracks.is_empty()) {
            return fail(format!("gig {} has empty set '{}'", self.id, set.name));
        }

        match self.current_set() {
            None if self.current_set == self.sets.len() && self.current_track == 0 => Ok(()),
            None => fail(format!("gig {} position ({}, {}) is past the end",
                                 self.id, self.current_set, self.current_track)),
            Some(set) if self.current_track < set.track_count() => Ok(()),
            Some(set) => fail(format!("gig {} track {} is outside set '{}' of {} tracks",
                                      self.id,
                                      self.current_track,
                                      set.name,
                                      set.track_count())),
        }
    }
}
