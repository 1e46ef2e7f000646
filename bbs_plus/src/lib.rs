#![cfg_attr(not(feature = "std"), no_std)]
#![allow(non_snake_case)]

//! BBS+ signature according to the paper: [Anonymous Attestation Using the Strong Diffie Hellman Assumption Revisited](https://eprint.iacr.org/2016/663).
//! Provides
//! - signature creation and verification with signature in group G1 and public key in group G2.
//! - (partially) blind signatures where the signer only sees a Pedersen commitment to some messages.
//! - proof of knowledge of signature and corresponding messages with selective disclosure.
//!
//! ## Modules
//!
//! 1. Signature parameters and key generation module - [`setup`].
//! 2. Signature module - [`signature`]
//! 3. Proof of knowledge of signature module - [`proof`]
//!
//! The implementation tries to use the same variable names as the paper and thus violate Rust's naming conventions at places.
//!
//! [`setup`]: crate::setup
//! [`signature`]: crate::signature
//! [`proof`]: crate::proof

pub mod error;
pub mod proof;
pub mod setup;
pub mod signature;

pub mod prelude {
    pub use crate::{
        error::BBSPlusError,
        proof::{PoKOfSignatureG1Proof, PoKOfSignatureG1Protocol},
        setup::*,
        signature::SignatureG1,
    };
}
