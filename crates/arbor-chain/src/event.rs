use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use arbor_types::{BlockNumber, CommitmentLeaf, FieldElement, LeafIndex, U256Halves};

use crate::error::{ChainError, ChainResult};

/// A commitment event decoded from the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentEvent {
    pub leaf_index: LeafIndex,
    pub commitment: FieldElement,
    pub block: BlockNumber,
}

impl CommitmentEvent {
    pub fn new(leaf_index: LeafIndex, commitment: FieldElement, block: BlockNumber) -> Self {
        Self {
            leaf_index,
            commitment,
            block,
        }
    }

    pub fn to_leaf(&self) -> CommitmentLeaf {
        CommitmentLeaf::new(self.leaf_index, self.commitment, self.block)
    }
}

/// An emitted event as returned by `starknet_getEvents`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    #[serde(default)]
    pub from_address: Option<String>,
    pub keys: Vec<String>,
    pub data: Vec<String>,
    /// Absent for events of the pending block.
    #[serde(default)]
    pub block_number: Option<BlockNumber>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl EmittedEvent {
    /// Decode the commitment layout shared by every watched event:
    ///
    /// ```text
    /// keys: [selector, commitment_low, commitment_high]
    /// data: [leaf_index_low, leaf_index_high, ..]
    /// ```
    ///
    /// Returns `Ok(None)` for pending events, which carry no block number.
    pub fn decode(&self) -> ChainResult<Option<CommitmentEvent>> {
        let Some(block) = self.block_number else {
            return Ok(None);
        };

        if self.keys.len() < 3 {
            return Err(ChainError::Decode(format!(
                "expected 3 keys, got {}",
                self.keys.len()
            )));
        }
        if self.data.len() < 2 {
            return Err(ChainError::Decode(format!(
                "expected at least 2 data words, got {}",
                self.data.len()
            )));
        }

        let commitment = decode_u256(&self.keys[1], &self.keys[2])
            .and_then(|halves| {
                FieldElement::from_u256_halves(halves)
                    .map_err(|e| ChainError::Decode(format!("commitment: {e}")))
            })?;

        let index = decode_u256(&self.data[0], &self.data[1])?;
        if index.high != 0 || index.low > u128::from(u64::MAX) {
            return Err(ChainError::Decode(format!(
                "leaf index {}:{} does not fit in 64 bits",
                index.high, index.low
            )));
        }

        Ok(Some(CommitmentEvent::new(index.low as u64, commitment, block)))
    }
}

/// Parse a felt in `0x` hex (the RPC's form) or decimal.
pub fn parse_felt(literal: &str) -> ChainResult<BigUint> {
    let (digits, radix) = match literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (literal, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ChainError::Decode(format!("invalid felt {literal:?}")));
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| ChainError::Decode(format!("invalid felt {literal:?}")))
}

fn decode_u256(low: &str, high: &str) -> ChainResult<U256Halves> {
    U256Halves::from_limbs(&parse_felt(low)?, &parse_felt(high)?)
        .map_err(|e| ChainError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(keys: &[&str], data: &[&str], block: Option<u64>) -> EmittedEvent {
        EmittedEvent {
            keys: keys.iter().map(|s| s.to_string()).collect(),
            data: data.iter().map(|s| s.to_string()).collect(),
            block_number: block,
            ..Default::default()
        }
    }

    #[test]
    fn decodes_split_commitment_and_index() {
        let evt = event(&["0x1", "0x2a", "0x1"], &["0x7", "0x0", "0x99"], Some(812));
        let decoded = evt.decode().unwrap().unwrap();

        let expected: FieldElement = (BigUint::from(1u8) << 128u32 | BigUint::from(42u8))
            .to_string()
            .parse()
            .unwrap();
        assert_eq!(decoded.commitment, expected);
        assert_eq!(decoded.leaf_index, 7);
        assert_eq!(decoded.block, 812);
        assert_eq!(decoded.to_leaf().leaf_index, 7);
    }

    #[test]
    fn pending_event_is_deferred() {
        let evt = event(&["0x1", "0x2a", "0x0"], &["0x0", "0x0"], None);
        assert_eq!(evt.decode().unwrap(), None);
    }

    #[test]
    fn short_payloads_are_rejected() {
        assert!(matches!(
            event(&["0x1", "0x2"], &["0x0", "0x0"], Some(1)).decode(),
            Err(ChainError::Decode(_))
        ));
        assert!(matches!(
            event(&["0x1", "0x2", "0x0"], &["0x0"], Some(1)).decode(),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn commitment_outside_field_is_rejected() {
        // high limb of all ones puts the value far above the BN254 modulus.
        let evt = event(
            &["0x1", "0x0", "0xffffffffffffffffffffffffffffffff"],
            &["0x0", "0x0"],
            Some(1),
        );
        assert!(matches!(evt.decode(), Err(ChainError::Decode(_))));
    }

    #[test]
    fn oversized_leaf_index_is_rejected() {
        let evt = event(&["0x1", "0x5", "0x0"], &["0x0", "0x1"], Some(1));
        assert!(matches!(evt.decode(), Err(ChainError::Decode(_))));
    }

    #[test]
    fn parse_felt_accepts_hex_and_decimal() {
        assert_eq!(parse_felt("0xff").unwrap(), BigUint::from(255u32));
        assert_eq!(parse_felt("255").unwrap(), BigUint::from(255u32));
        assert!(parse_felt("0x").is_err());
        assert!(parse_felt("12a").is_err());
    }

    #[test]
    fn emitted_event_deserializes_from_rpc_json() {
        let json = r#"{
            "from_address": "0x123",
            "keys": ["0xa", "0xb", "0x0"],
            "data": ["0x3", "0x0"],
            "block_hash": "0xfeed",
            "block_number": 55,
            "transaction_hash": "0xbeef"
        }"#;
        let evt: EmittedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(evt.block_number, Some(55));
        assert_eq!(evt.decode().unwrap().unwrap().leaf_index, 3);
    }
}
