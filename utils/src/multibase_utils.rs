//! Text encoding of arkworks objects as multibase strings, base64url without padding (prefix `u`).

use crate::serde_utils::ArkObjectBytes;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use multibase::Base;

#[derive(Debug)]
pub enum MultibaseError {
    /// The string is not valid multibase
    Decoding(multibase::Error),
    /// The decoded bytes are not a valid encoding of the expected object
    Serialization(SerializationError),
}

impl From<multibase::Error> for MultibaseError {
    fn from(e: multibase::Error) -> Self {
        Self::Decoding(e)
    }
}

impl From<SerializationError> for MultibaseError {
    fn from(e: SerializationError) -> Self {
        Self::Serialization(e)
    }
}

impl core::fmt::Display for MultibaseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decoding(e) => write!(f, "invalid multibase: {}", e),
            Self::Serialization(e) => write!(f, "invalid encoding: {}", e),
        }
    }
}

impl std::error::Error for MultibaseError {}

pub fn bytes_to_multibase(bytes: &[u8]) -> String {
    multibase::encode(Base::Base64Url, bytes)
}

pub fn multibase_to_bytes(s: &str) -> Result<Vec<u8>, MultibaseError> {
    let (_, bytes) = multibase::decode(s)?;
    Ok(bytes)
}

/// Compressed canonical encoding of `obj` as a multibase string
pub fn ark_to_multibase<T: CanonicalSerialize>(obj: &T) -> Result<String, SerializationError> {
    Ok(bytes_to_multibase(&ArkObjectBytes::to_bytes(obj)?))
}

/// Inverse of [`ark_to_multibase`]. Any base supported by multibase is accepted.
pub fn multibase_to_ark<T: CanonicalDeserialize>(s: &str) -> Result<T, MultibaseError> {
    let bytes = multibase_to_bytes(s)?;
    Ok(T::deserialize_compressed(bytes.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G2Affine};
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };

    #[test]
    fn encode_decode() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let f = Fr::rand(&mut rng);
        let encoded = ark_to_multibase(&f).unwrap();
        assert!(encoded.starts_with('u'));
        assert_eq!(multibase_to_ark::<Fr>(&encoded).unwrap(), f);

        let g = (G2Affine::generator() * f).into_affine();
        let encoded = ark_to_multibase(&g).unwrap();
        assert_eq!(multibase_to_ark::<G2Affine>(&encoded).unwrap(), g);

        // A scalar does not decode as a point and garbage is not multibase
        assert!(matches!(
            multibase_to_ark::<G2Affine>(&ark_to_multibase(&f).unwrap()),
            Err(MultibaseError::Serialization(_))
        ));
        assert!(matches!(
            multibase_to_ark::<Fr>("*not multibase"),
            Err(MultibaseError::Decoding(_))
        ));
    }
}
