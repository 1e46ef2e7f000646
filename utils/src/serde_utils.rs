//! Serde serialization for arkworks objects as they don't implement serde themselves. Objects
//! are serialized with their compressed canonical encoding, as a byte sequence.

use alloc::vec::Vec;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

/// Use with `#[serde_as(as = "ArkObjectBytes")]` on any field whose type implements
/// `CanonicalSerialize + CanonicalDeserialize`
pub struct ArkObjectBytes;

impl ArkObjectBytes {
    pub fn to_bytes<T: CanonicalSerialize>(obj: &T) -> Result<Vec<u8>, ark_serialize::SerializationError> {
        let mut bytes = Vec::with_capacity(obj.compressed_size());
        obj.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }
}

impl<T> SerializeAs<T> for ArkObjectBytes
where
    T: CanonicalSerialize,
{
    fn serialize_as<S>(obj: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = Self::to_bytes(obj).map_err(serde::ser::Error::custom)?;
        Serialize::serialize(&bytes, serializer)
    }
}

impl<'de, T> DeserializeAs<'de, T> for ArkObjectBytes
where
    T: CanonicalDeserialize,
{
    fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        T::deserialize_compressed(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}
