use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher as _};

use arbor_types::FieldElement;

use crate::error::{CryptoError, CryptoResult};

/// Two-input field hash applied at every tree level.
///
/// Takes `&mut self` because Poseidon keeps its permutation state between
/// calls. Only the ingestion cycle hashes; query handlers read precomputed
/// nodes and never need a hasher.
pub trait PairHasher: Send {
    fn hash_pair(&mut self, left: &FieldElement, right: &FieldElement)
        -> CryptoResult<FieldElement>;
}

/// Circom-compatible Poseidon with two inputs (t = 3) over BN254.
///
/// Bit-exact with `poseidon2` from circomlibjs / poseidon-lite, which is the
/// hash the proving circuit hard-codes.
pub struct PoseidonHasher {
    inner: Poseidon<Fr>,
}

impl PoseidonHasher {
    pub fn new() -> CryptoResult<Self> {
        let inner =
            Poseidon::<Fr>::new_circom(2).map_err(|e| CryptoError::Poseidon(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl PairHasher for PoseidonHasher {
    fn hash_pair(
        &mut self,
        left: &FieldElement,
        right: &FieldElement,
    ) -> CryptoResult<FieldElement> {
        self.inner
            .hash(&[*left.as_fr(), *right.as_fr()])
            .map(FieldElement::from_fr)
            .map_err(|e| CryptoError::Poseidon(e.to_string()))
    }
}

impl std::fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseidonHasher").field("arity", &2).finish()
    }
}
