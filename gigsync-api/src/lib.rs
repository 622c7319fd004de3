pub use codec::{Codec, CodecError, Json, MsgPack};
pub use control::*;
pub use error::*;
pub use gig::*;
pub use newtypes::*;
pub use setlist::*;
pub use sync::*;

pub mod codec;
pub mod control;
pub mod error;
pub mod gig;
pub mod newtypes;
pub mod setlist;
pub mod sync;
