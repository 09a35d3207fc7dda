use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// An element of the BN254 scalar field.
///
/// This is the value type of every commitment, tree node, and root. The wire
/// form is a decimal string; parsing also accepts `0x`-prefixed hex because
/// Starknet felts arrive that way. Values at or above the modulus are
/// rejected, never reduced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity; also the empty-leaf value.
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn from_fr(value: Fr) -> Self {
        Self(value)
    }

    pub fn as_fr(&self) -> &Fr {
        &self.0
    }

    /// The field modulus as an unbounded integer.
    pub fn modulus() -> &'static BigUint {
        static MODULUS: OnceLock<BigUint> = OnceLock::new();
        MODULUS.get_or_init(|| BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le()))
    }

    /// Convert an integer into a field element, rejecting values `>= p`.
    pub fn from_biguint(value: &BigUint) -> Result<Self, TypeError> {
        if value >= Self::modulus() {
            return Err(TypeError::OutOfField(value.to_string()));
        }
        Ok(Self(Fr::from_le_bytes_mod_order(&value.to_bytes_le())))
    }

    /// The canonical integer representative in `[0, p)`.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0.into_bigint().to_bytes_le())
    }

    /// Split into the `(low, high)` 128-bit halves used as u256 calldata.
    pub fn to_u256_halves(&self) -> U256Halves {
        let mut digits = self.to_biguint().to_u64_digits();
        digits.resize(4, 0);
        U256Halves {
            low: u128::from(digits[0]) | (u128::from(digits[1]) << 64),
            high: u128::from(digits[2]) | (u128::from(digits[3]) << 64),
        }
    }

    /// Reassemble a value from u256 halves (`high << 128 | low`).
    pub fn from_u256_halves(halves: U256Halves) -> Result<Self, TypeError> {
        let value = (BigUint::from(halves.high) << 128u32) | BigUint::from(halves.low);
        Self::from_biguint(&value)
    }
}

impl Default for FieldElement {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl FromStr for FieldElement {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, radix) = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => (hex, 16),
            None => (trimmed, 10),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(TypeError::InvalidFieldElement(s.to_string()));
        }

        let value = BigUint::parse_bytes(digits.as_bytes(), radix)
            .ok_or_else(|| TypeError::InvalidFieldElement(s.to_string()))?;
        Self::from_biguint(&value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_biguint())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}

/// A 256-bit value split into two 128-bit limbs, low limb first.
///
/// Serialized as `{"low": "<decimal>", "high": "<decimal>"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct U256Halves {
    pub low: u128,
    pub high: u128,
}

impl U256Halves {
    /// Calldata order expected by `submit_merkle_root(low, high)`.
    pub fn calldata(&self) -> [String; 2] {
        [self.low.to_string(), self.high.to_string()]
    }

    /// Build from arbitrary-width limbs, failing if either exceeds 128 bits.
    pub fn from_limbs(low: &BigUint, high: &BigUint) -> Result<Self, TypeError> {
        Ok(Self {
            low: limb_to_u128(low)?,
            high: limb_to_u128(high)?,
        })
    }
}

impl Serialize for U256Halves {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("U256Halves", 2)?;
        state.serialize_field("low", &self.low.to_string())?;
        state.serialize_field("high", &self.high.to_string())?;
        state.end()
    }
}

fn limb_to_u128(limb: &BigUint) -> Result<u128, TypeError> {
    if limb.bits() > 128 {
        return Err(TypeError::HalfOverflow(limb.to_string()));
    }
    let mut digits = limb.to_u64_digits();
    digits.resize(2, 0);
    Ok(u128::from(digits[0]) | (u128::from(digits[1]) << 64))
}
