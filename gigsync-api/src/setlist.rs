use serde::{Deserialize, Serialize};

use crate::error::{GigError, GigResult};

/// Denormalized copy of a catalog track, taken when a gig starts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub id:            i64,
    pub title:         String,
    pub tempo:         u32,
    pub click_enabled: bool,
    #[serde(default)]
    pub key_tone:      String,
    #[serde(default)]
    pub voice_name:    String,
    #[serde(default)]
    pub era_name:      String,
    #[serde(default)]
    pub genre_name:    String,
    #[serde(default)]
    pub kit_name:      String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SetSnapshot {
    pub id:      i64,
    pub name:    String,
    pub ordinal: i64,
    pub tracks:  Vec<TrackSnapshot>,
}

impl SetSnapshot {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// A setlist as loaded from the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Setlist {
    pub id:   i64,
    pub name: String,
    pub sets: Vec<SetSnapshot>,
}

impl Setlist {
    /// Copy the sets in performance order, leaving out sets that have no tracks.
    pub fn snapshot(&self) -> GigResult<Vec<SetSnapshot>> {
        if self.sets.is_empty() {
            return Err(GigError::invalid(format!("setlist {} has no sets", self.id)));
        }

        let mut sets = self.sets
                           .iter()
                           .filter(|set| !set.tracks.is_empty())
                           .cloned()
                           .collect::<Vec<_>>();

        if sets.is_empty() {
            return Err(GigError::invalid(format!("setlist {} has no tracks", self.id)));
        }

        sets.sort_by_key(|set| set.ordinal);

        Ok(sets)
    }

    pub fn track_count(&self) -> usize {
        self.sets.iter().map(SetSnapshot::track_count).sum()
    }
}

/// Full track detail re-fetched from the catalog whenever the current track changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrackDetail {
    pub track:  TrackSnapshot,
    pub lyrics: String,
}
