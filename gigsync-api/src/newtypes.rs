use std::fmt;
use std::str::FromStr;

use derive_more::{Display, From};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exclusive upper bound of generated gig ids (31 bits).
pub const GIG_ID_LIMIT: i64 = 1 << 31;

const VIEWER_ID_LIMIT: u64 = 0x7_FFFF_FFFF;

#[derive(Serialize, Deserialize, Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
#[serde(transparent)]
pub struct GigId(i64);

impl GigId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Draw a uniformly distributed id in `[0, 2^31)` from the operating system RNG.
    pub fn random() -> Self {
        Self(OsRng.gen_range(0..GIG_ID_LIMIT))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl FromStr for GigId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Per-connection display id, sent to a viewer in its `sub` frame. Carries no security meaning.
#[derive(Serialize, Deserialize, Debug, Display, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(format!("{:08X}", OsRng.gen_range(0..VIEWER_ID_LIMIT)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque client token used to track who asked the band to wait.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WaiterToken(String);

impl WaiterToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaiterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for WaiterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaiterToken({})", self.0)
    }
}
