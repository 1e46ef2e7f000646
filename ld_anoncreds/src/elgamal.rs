//! ElGamal encryption of identifiers in G1.
//!
//! An identifier is hashed to a point of G1 and encrypted with fresh randomness, so ciphertexts of the
//! same identifier cannot be linked without the secret key. Keys live on their own generator and
//! are never shared with the signature scheme.

use ark_bls12_381::{Fr, G1Affine};
use blake2::Blake2b512;
use ld_crypto_utils::{
    elgamal::{keygen, Ciphertext, PublicKey, SecretKey},
    hashing_utils::hash_to_group,
    multibase_utils::{ark_to_multibase, multibase_to_ark},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    backend::Backend,
    constants::MAP_UID_TO_GROUP_DST,
    error::{Error, Result},
    signature::KeyPair,
};

/// Multibase encoded ElGamal ciphertext of an identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedUid(pub String);

fn uid_to_group(uid: &[u8]) -> G1Affine {
    hash_to_group::<G1Affine, Blake2b512>(MAP_UID_TO_GROUP_DST, uid)
}

pub fn elliptic_elgamal_key_gen(backend: &Backend) -> Result<KeyPair> {
    let params = backend.require_ready()?;
    let (sk, pk) = keygen::<_, G1Affine>(&mut backend.rng(), &params.elgamal_generator());
    Ok(KeyPair {
        secret_key: ark_to_multibase(&sk)?,
        public_key: ark_to_multibase(&pk)?,
    })
}

pub fn encrypt_uid(backend: &Backend, uid: &[u8], public_key: &str) -> Result<EncryptedUid> {
    let params = backend.require_ready()?;
    let public_key = multibase_to_ark::<PublicKey<G1Affine>>(public_key)?;
    if !public_key.is_valid() {
        return Err(Error::malformed("ElGamal public key is the identity"));
    }
    let (ciphertext, _) = Ciphertext::new(
        &mut backend.rng(),
        &uid_to_group(uid),
        &public_key.0,
        &params.elgamal_generator(),
    );
    debug!(uid_len = uid.len(), "encrypted uid");
    Ok(EncryptedUid(ark_to_multibase(&ciphertext)?))
}

fn decrypt(secret_key: &str, encrypted: &EncryptedUid) -> Result<G1Affine> {
    let secret_key = multibase_to_ark::<SecretKey<Fr>>(secret_key)?;
    let ciphertext = multibase_to_ark::<Ciphertext<G1Affine>>(&encrypted.0)?;
    Ok(ciphertext.decrypt(&secret_key.0))
}

/// The multibase encoded point the identifier was mapped to
pub fn elliptic_elgamal_decrypt(
    backend: &Backend,
    secret_key: &str,
    encrypted: &EncryptedUid,
) -> Result<String> {
    backend.require_ready()?;
    Ok(ark_to_multibase(&decrypt(secret_key, encrypted)?)?)
}

/// Whether `encrypted` is an encryption of `uid`
pub fn uid_matches(
    backend: &Backend,
    secret_key: &str,
    encrypted: &EncryptedUid,
    uid: &[u8],
) -> Result<bool> {
    backend.require_ready()?;
    Ok(decrypt(secret_key, encrypted)? == uid_to_group(uid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    #[test]
    fn encrypt_and_decrypt() {
        let backend = Backend::default();
        backend.initialize();
        let keypair = elliptic_elgamal_key_gen(&backend).unwrap();
        let other = elliptic_elgamal_key_gen(&backend).unwrap();
        assert_ne!(keypair, other);

        let c1 = encrypt_uid(&backend, b"uid-1", &keypair.public_key).unwrap();
        let c2 = encrypt_uid(&backend, b"uid-1", &keypair.public_key).unwrap();
        assert_ne!(c1, c2);

        let point = elliptic_elgamal_decrypt(&backend, &keypair.secret_key, &c1).unwrap();
        assert_eq!(point, ark_to_multibase(&uid_to_group(b"uid-1")).unwrap());
        assert_eq!(
            elliptic_elgamal_decrypt(&backend, &keypair.secret_key, &c2).unwrap(),
            point
        );

        assert!(uid_matches(&backend, &keypair.secret_key, &c1, b"uid-1").unwrap());
        assert!(!uid_matches(&backend, &keypair.secret_key, &c1, b"uid-2").unwrap());
        assert!(!uid_matches(&backend, &other.secret_key, &c1, b"uid-1").unwrap());

        let json = serde_json::to_value(&c1).unwrap();
        assert!(json.is_string());
        assert_eq!(serde_json::from_value::<EncryptedUid>(json).unwrap(), c1);
    }

    #[test]
    fn invalid_inputs() {
        let backend = Backend::default();
        assert!(matches!(
            elliptic_elgamal_key_gen(&backend),
            Err(Error::NotReady)
        ));
        backend.initialize();

        let identity = ark_to_multibase(&PublicKey(G1Affine::zero())).unwrap();
        assert!(matches!(
            encrypt_uid(&backend, b"uid-1", &identity),
            Err(Error::MalformedInput(_))
        ));
        assert!(encrypt_uid(&backend, b"uid-1", "garbage").is_err());

        let keypair = elliptic_elgamal_key_gen(&backend).unwrap();
        let garbage = EncryptedUid("uAAAA".to_string());
        assert!(elliptic_elgamal_decrypt(&backend, &keypair.secret_key, &garbage).is_err());
    }
}
