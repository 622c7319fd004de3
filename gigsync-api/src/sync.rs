//! Live-sync wire contract shared by the server and viewer clients.

use std::str::FromStr;

use derive_more::IsVariant;
use serde::{Deserialize, Serialize};

use crate::error::GigError;
use crate::newtypes::{ViewerId, WaiterToken};


/// Text frames pushed to viewers over their live-sync stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IsVariant)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SyncFrame {
    /// Sent once, right after a viewer connects.
    Sub { id: ViewerId },
    /// At least one participant asked everyone to hold.
    Wait,
    /// Nobody is holding.
    Proceed,
}

impl SyncFrame {
    pub fn status(waiting: bool) -> Self {
        if waiting {
            Self::Wait
        } else {
            Self::Proceed
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum PauseState {
    Wait,
    Ready,
    /// Any other value. Accepted and ignored.
    Unrecognized(String),
}

/// A participant's `token=wait` / `token=ready` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseSignal {
    pub token: WaiterToken,
    pub state: PauseState,
}

impl FromStr for PauseSignal {
    type Err = GigError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let mut parts = body.split('=');

        let (token, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(token), Some(value), None) => (token, value),
            _ => return Err(GigError::invalid("expected exactly one 'token=value' pair")),
        };

        if token.is_empty() {
            return Err(GigError::invalid("missing client token"));
        }

        let state = match value {
            "wait" => PauseState::Wait,
            "ready" => PauseState::Ready,
            other => PauseState::Unrecognized(other.to_owned()),
        };

        Ok(Self { token: WaiterToken::new(token),
                  state })
    }
}
