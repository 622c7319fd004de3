use derive_more::IsVariant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::newtypes::GigId;

#[derive(Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IsVariant)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GigError {
    #[error("Gig {gig_id} not found")]
    NotFound { gig_id: GigId },

    #[error("Setlist {setlist_id} not found")]
    SetlistNotFound { setlist_id: i64 },

    #[error("Track {track_id} not found")]
    TrackNotFound { track_id: i64 },

    #[error("Stored gig {gig_id} could not be decoded: {error}")]
    Corrupt { gig_id: GigId, error: String },

    #[error("Invalid request: {reason}")]
    Invalid { reason: String },

    #[error("Storage failure: {error}")]
    Io { error: String },

    #[error("Serialization failure: {error}")]
    Serialization { error: String },
}

impl GigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid { reason: reason.into() }
    }

    pub fn get_status(&self) -> u16 {
        match self {
            GigError::NotFound { .. } => 404,
            GigError::SetlistNotFound { .. } => 404,
            GigError::TrackNotFound { .. } => 404,
            GigError::Corrupt { .. } => 500,
            GigError::Invalid { .. } => 400,
            GigError::Io { .. } => 503,
            GigError::Serialization { .. } => 500,
        }
    }
}

pub type GigResult<T = ()> = Result<T, GigError>;
