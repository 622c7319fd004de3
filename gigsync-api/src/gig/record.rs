use serde::{Deserialize, Serialize};

use crate::codec::{Codec, MsgPack};
use crate::error::{GigError, GigResult};
use crate::gig::GigSession;
use crate::newtypes::GigId;

/// Version written into every stored gig. Bump it when a field changes meaning, and teach
/// [`GigSession::from_record`] to read the previous version.
///
/// Adding a field does not need a bump: unknown fields are skipped on decode, and a field added
/// later must carry `#[serde(default)]` so records written before it still load.
pub const GIG_RECORD_VERSION: u32 = 1;

#[derive(Serialize)]
struct GigRecordRef<'a> {
    version: u32,
    gig:     &'a GigSession,
}

#[derive(Deserialize)]
struct GigRecord {
    version: u32,
    gig:     GigSession,
}

impl GigSession {
    /// Encode into the opaque payload kept by the session store.
    pub fn to_record(&self) -> GigResult<Vec<u8>> {
        MsgPack.serialize(&GigRecordRef { version: GIG_RECORD_VERSION,
                                          gig:     self, })
               .map_err(|err| GigError::Serialization { error: err.to_string() })
    }

    /// Decode a payload stored under `gig_id`. Any failure means the record is unusable.
    pub fn from_record(gig_id: GigId, payload: &[u8]) -> GigResult<Self> {
        let corrupt = |error: String| GigError::Corrupt { gig_id, error };

        let record = MsgPack.deserialize::<GigRecord>(payload)
                            .map_err(|err| corrupt(err.to_string()))?;

        if record.version != GIG_RECORD_VERSION {
            return Err(corrupt(format!("unsupported record version {}", record.version)));
        }

        let gig = record.gig;
        if gig.id != gig_id {
            return Err(corrupt(format!("record holds gig {}", gig.id)));
        }

        gig.validate().map_err(|err| corrupt(err.to_string()))?;

        Ok(gig)
    }
}
