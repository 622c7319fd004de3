use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

pub trait Codec {
    fn mime_type(&self) -> &'static str;

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn deserialize<T: DeserializeOwned>(&self, value: &[u8]) -> Result<T, CodecError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

impl Codec for Json {
    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize<T: DeserializeOwned>(&self, value: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(value)?)
    }
}

/// MessagePack with field names kept in the output, so decoders can match fields by name instead of
/// position.
#[derive(Clone, Copy, Debug, Default)]
pub struct MsgPack;

impl Codec for MsgPack {
    fn mime_type(&self) -> &'static str {
        "application/msgpack"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn deserialize<T: DeserializeOwned>(&self, value: &[u8]) -> Result<T, CodecError> {
        Ok(rmp_serde::from_slice(value)?)
    }
}
