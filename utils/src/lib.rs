#![cfg_attr(not(feature = "std"), no_std)]

//! Common code for the credential crates of this workspace:
//!
//! - hashing bytes to group elements and field elements - [`hashing_utils`]
//! - serde adapters for arkworks objects - [`serde_utils`]
//! - Fiat-Shamir transcripts - [`transcript`]
//! - Elgamal encryption of group elements - [`elgamal`]
//! - multibase text encoding of arkworks objects - [`multibase_utils`]
//!
//! [`hashing_utils`]: crate::hashing_utils
//! [`serde_utils`]: crate::serde_utils
//! [`transcript`]: crate::transcript
//! [`elgamal`]: crate::elgamal
//! [`multibase_utils`]: crate::multibase_utils

extern crate alloc;

#[macro_use]
pub mod macros;
pub mod elgamal;
pub mod hashing_utils;
#[cfg(feature = "std")]
pub mod multibase_utils;
pub mod serde_utils;
pub mod transcript;
