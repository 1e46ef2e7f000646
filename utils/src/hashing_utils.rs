//! Deterministic hashing of bytes to group and field elements using try-and-increment.
//! These are vulnerable to timing attacks and are only used with public input like labels
//! of setup parameters, challenges or terms of a document that are hashed to messages.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use digest::Digest;

const ATTEMPT_SEPARATOR: &[u8] = b"-attempt-";

/// Hash bytes to a point on the curve. Returns as Projective coordinates. The point is
/// multiplied by the cofactor so it lies in the prime order subgroup.
pub fn projective_group_elem_from_try_and_incr<G: AffineRepr, D: Digest>(bytes: &[u8]) -> G::Group {
    let mut hash = D::digest(bytes);
    let mut j = 1u64;
    loop {
        if let Some(g) = G::from_random_bytes(&hash) {
            return g.mul_by_cofactor_to_group();
        }
        hash = D::digest(concat_slices!(bytes, ATTEMPT_SEPARATOR, j.to_le_bytes()));
        j += 1;
    }
}

/// Hash bytes to a point on the curve. Returns as Affine coordinates.
pub fn affine_group_elem_from_try_and_incr<G: AffineRepr, D: Digest>(bytes: &[u8]) -> G {
    projective_group_elem_from_try_and_incr::<G, D>(bytes).into_affine()
}

/// Hash bytes to a field element.
pub fn field_elem_from_try_and_incr<F: PrimeField, D: Digest>(bytes: &[u8]) -> F {
    let mut hash = D::digest(bytes);
    let mut j = 1u64;
    loop {
        if let Some(f) = F::from_random_bytes(&hash) {
            return f;
        }
        hash = D::digest(concat_slices!(bytes, ATTEMPT_SEPARATOR, j.to_le_bytes()));
        j += 1;
    }
}

/// Hash `msg` to a field element under the domain separation tag `dst`
pub fn hash_to_field<F: PrimeField, D: Digest>(dst: &[u8], msg: &[u8]) -> F {
    field_elem_from_try_and_incr::<F, D>(&concat_slices!(dst, msg))
}

/// Hash `msg` to a group element under the domain separation tag `dst`
pub fn hash_to_group<G: AffineRepr, D: Digest>(dst: &[u8], msg: &[u8]) -> G {
    affine_group_elem_from_try_and_incr::<G, D>(&concat_slices!(dst, msg))
}
