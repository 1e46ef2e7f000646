//! Lifecycle of the cryptographic backend.
//!
//! A [`Backend`] is created uninitialized and moves to ready exactly once through [`Backend::initialize`].
//! Initialization hashes the generators used by every signature and the ElGamal generator. Every
//! other operation of the crate takes a `&Backend` and fails with [`Error::NotReady`] before that.

use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        OnceLock,
    },
    time::Instant,
};

use ark_bls12_381::{Bls12_381, G1Affine};
use bbs_plus::setup::SignatureParamsG1;
use blake2::Blake2b512;
use ld_crypto_utils::hashing_utils::hash_to_group;
use rand::{rngs::StdRng, thread_rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    constants::{DEFAULT_GENERATOR_LABEL, DEFAULT_PRECOMPUTED_GENERATORS, ELGAMAL_GENERATOR_DST},
    error::{Error, Result},
};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// Label hashed to derive all signature generators. Issuers and verifiers must agree on it.
    pub generator_label: String,
    /// Number of message generators derived during initialization. More are derived on demand.
    pub precomputed_generators: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            generator_label: DEFAULT_GENERATOR_LABEL.to_string(),
            precomputed_generators: DEFAULT_PRECOMPUTED_GENERATORS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Parameters fixed at initialization and shared read-only afterwards
#[derive(Clone, Debug)]
pub struct BackendParams {
    label: Vec<u8>,
    signature_params: SignatureParamsG1<Bls12_381>,
    elgamal_generator: G1Affine,
}

impl BackendParams {
    fn generate(config: &BackendConfig) -> Self {
        let label = config.generator_label.as_bytes().to_vec();
        // At least 1 generator so that the holder secret generator is always precomputed
        let signature_params = SignatureParamsG1::<Bls12_381>::new::<Blake2b512>(
            &label,
            config.precomputed_generators.max(1),
        );
        let elgamal_generator =
            hash_to_group::<G1Affine, Blake2b512>(ELGAMAL_GENERATOR_DST, &label);
        Self {
            label,
            signature_params,
            elgamal_generator,
        }
    }

    /// Signature parameters for a multi-message of `message_count` messages. Generators beyond the
    /// precomputed ones are derived again on each call, nothing is cached.
    pub fn signature_params(&self, message_count: usize) -> SignatureParamsG1<Bls12_381> {
        if message_count > self.signature_params.supported_message_count() {
            debug!(
                message_count,
                precomputed = self.signature_params.supported_message_count(),
                "deriving extra message generators"
            );
        }
        self.signature_params
            .resized::<Blake2b512>(&self.label, message_count)
    }

    /// Generator of message `idx` (0-based)
    pub fn message_generator(&self, idx: usize) -> G1Affine {
        match self.signature_params.h.get(idx) {
            Some(h) => *h,
            None => self.signature_params(idx + 1).h[idx],
        }
    }

    /// Generator of the blinding `s`
    pub fn blinding_generator(&self) -> G1Affine {
        self.signature_params.h_0
    }

    /// Parameters with no message generators, used for key generation
    pub fn key_params(&self) -> SignatureParamsG1<Bls12_381> {
        self.signature_params(0)
    }

    pub fn elgamal_generator(&self) -> G1Affine {
        self.elgamal_generator
    }
}

/// Owner of the backend parameters. Share it by reference (or inside an `Arc`) with every caller.
#[derive(Debug)]
pub struct Backend {
    config: BackendConfig,
    state: AtomicU8,
    params: OnceLock<BackendParams>,
}

impl Default for Backend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            state: AtomicU8::new(UNINITIALIZED),
            params: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// One-time setup. Repeated or concurrent calls block until the first one completes and then
    /// return the same parameters.
    pub fn initialize(&self) -> &BackendParams {
        let _ = self.state.compare_exchange(
            UNINITIALIZED,
            INITIALIZING,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.params.get_or_init(|| {
            let start = Instant::now();
            let params = BackendParams::generate(&self.config);
            info!(
                precomputed_generators = params.signature_params.supported_message_count(),
                elapsed = ?start.elapsed(),
                "cryptographic backend initialized"
            );
            params
        })
    }

    pub fn state(&self) -> BackendState {
        if self.params.get().is_some() {
            return BackendState::Ready;
        }
        match self.state.load(Ordering::Acquire) {
            UNINITIALIZED => BackendState::Uninitialized,
            _ => BackendState::Initializing,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.params.get().is_some()
    }

    /// Precondition of every operation
    pub fn require_ready(&self) -> Result<&BackendParams> {
        self.params.get().ok_or(Error::NotReady)
    }

    /// Fresh RNG seeded from the thread RNG
    pub fn rng(&self) -> StdRng {
        let mut seed = [0u8; 32];
        thread_rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}
