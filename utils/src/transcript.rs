//! Fiat-Shamir transcript over Merlin. Protocols append their public values and squeeze
//! challenges from it so the prover and the verifier derive the same challenge.

use alloc::vec::Vec;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalSerialize, SerializationError};
pub use merlin::Transcript as MerlinTranscript;

/// Labels must be specific to the application.
pub fn new_merlin_transcript(label: &'static [u8]) -> MerlinTranscript {
    MerlinTranscript::new(label)
}

pub trait Transcript {
    /// Append the compressed encoding of an arkworks object
    fn append<S: CanonicalSerialize>(
        &mut self,
        label: &'static [u8],
        element: &S,
    ) -> Result<(), SerializationError>;

    /// Append raw bytes
    fn append_bytes(&mut self, label: &'static [u8], bytes: &[u8]);

    fn challenge_scalar<F: PrimeField>(&mut self, label: &'static [u8]) -> F;
}

impl Transcript for MerlinTranscript {
    fn append<S: CanonicalSerialize>(
        &mut self,
        label: &'static [u8],
        element: &S,
    ) -> Result<(), SerializationError> {
        let mut buff = Vec::with_capacity(element.compressed_size());
        element.serialize_compressed(&mut buff)?;
        self.append_message(label, &buff);
        Ok(())
    }

    fn append_bytes(&mut self, label: &'static [u8], bytes: &[u8]) {
        self.append_message(label, bytes);
    }

    fn challenge_scalar<F: PrimeField>(&mut self, label: &'static [u8]) -> F {
        // Reduce a double-width value to keep the distribution close to uniform
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        F::from_le_bytes_mod_order(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ec::Group;

    #[test]
    fn transcript() {
        let mut transcript = new_merlin_transcript(b"test");
        transcript.append(b"point", &G1Projective::generator()).unwrap();
        transcript.append_bytes(b"nonce", b"n1");
        let f1 = transcript.challenge_scalar::<Fr>(b"scalar");

        let mut transcript2 = new_merlin_transcript(b"test");
        transcript2.append(b"point", &G1Projective::generator()).unwrap();
        transcript2.append_bytes(b"nonce", b"n1");
        let f2 = transcript2.challenge_scalar::<Fr>(b"scalar");
        assert_eq!(f1, f2);

        let mut transcript3 = new_merlin_transcript(b"test");
        transcript3.append(b"point", &G1Projective::generator()).unwrap();
        transcript3.append_bytes(b"nonce", b"n2");
        let f3 = transcript3.challenge_scalar::<Fr>(b"scalar");
        assert_ne!(f1, f3);
    }
}
