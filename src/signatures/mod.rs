//! Event signature resolution.
//!
//! Derives the canonical signature `Name(type1,type2,...)` and its keccak256
//! topic for every event of a contract ABI. Topic0 of an emitted log is this
//! hash, so the resulting map is how raw logs are matched back to events.

use std::collections::BTreeMap;

use alloy::primitives::{keccak256, B256};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::AbiError;

/// A resolved event: canonical signature, its topic hash and its input names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub name: String,
    pub canonical_signature: String,
    pub topic_hash: B256,
    pub input_names: Vec<String>,
}

/// One entry of a JSON ABI. Only the parts needed for events are read.
#[derive(Debug, Deserialize)]
struct AbiDescriptor {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    name: Option<String>,
    inputs: Option<Vec<AbiParam>>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<AbiParam>,
}

impl AbiParam {
    /// Canonical type, expanding tuples into `(t1,t2)` plus any array suffix.
    fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(Self::canonical_type).collect();
                format!("({}){}", inner.join(","), suffix)
            },
            None => self.kind.clone(),
        }
    }
}

/// Every event of one ABI, keyed by name and by topic hash.
#[derive(Debug, Clone, Default)]
pub struct EventSignatures {
    by_name: BTreeMap<String, EventSignature>,
    by_topic: FxHashMap<B256, String>,
}

impl EventSignatures {
    /// Resolve signatures from ABI JSON text (an array of descriptors).
    pub fn from_abi_json(abi: &str) -> Result<Self, AbiError> {
        let descriptors: Vec<AbiDescriptor> = serde_json::from_str(abi)?;
        Self::from_descriptors(descriptors)
    }

    /// Resolve signatures from an already parsed ABI value.
    pub fn from_abi_value(abi: serde_json::Value) -> Result<Self, AbiError> {
        let descriptors: Vec<AbiDescriptor> = serde_json::from_value(abi)?;
        Self::from_descriptors(descriptors)
    }

    fn from_descriptors(descriptors: Vec<AbiDescriptor>) -> Result<Self, AbiError> {
        let mut signatures = Self::default();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            if descriptor.kind.as_deref() != Some("event") {
                continue;
            }

            let name = descriptor
                .name
                .ok_or(AbiError::MalformedAbi { index, field: "name" })?;
            let inputs = descriptor
                .inputs
                .ok_or(AbiError::MalformedAbi { index, field: "inputs" })?;

            let types: Vec<String> = inputs.iter().map(AbiParam::canonical_type).collect();
            let canonical_signature = format!("{}({})", name, types.join(","));
            let topic_hash = keccak256(canonical_signature.as_bytes());

            signatures.by_topic.insert(topic_hash, name.clone());
            signatures.by_name.insert(
                name.clone(),
                EventSignature {
                    name,
                    canonical_signature,
                    topic_hash,
                    input_names: inputs.into_iter().map(|input| input.name).collect(),
                },
            );
        }

        Ok(signatures)
    }

    pub fn get(&self, name: &str) -> Option<&EventSignature> {
        self.by_name.get(name)
    }

    /// Name of the event whose topic0 is `topic`.
    pub fn name_of(&self, topic: &B256) -> Option<&str> {
        self.by_topic.get(topic).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventSignature> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abis::{self, PAIR_ABI_JSON};
    use alloy::{primitives::b256, sol_types::SolEvent};

    #[test]
    fn test_transfer_topic_matches_erc20_reference() {
        let signatures = EventSignatures::from_abi_json(PAIR_ABI_JSON).unwrap();
        let transfer = signatures.get("Transfer").unwrap();

        assert_eq!(transfer.canonical_signature, "Transfer(address,address,uint256)");
        assert_eq!(
            transfer.topic_hash,
            b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
        assert_eq!(transfer.topic_hash, abis::Transfer::SIGNATURE_HASH);
        assert_eq!(transfer.input_names, vec!["from", "to", "value"]);
    }

    #[test]
    fn test_pair_events_match_sol_declarations() {
        let signatures = EventSignatures::from_abi_json(PAIR_ABI_JSON).unwrap();

        assert_eq!(signatures.get("Swap").unwrap().topic_hash, abis::Swap::SIGNATURE_HASH);
        assert_eq!(signatures.get("Mint").unwrap().topic_hash, abis::Mint::SIGNATURE_HASH);
        assert_eq!(signatures.get("Sync").unwrap().topic_hash, abis::Sync::SIGNATURE_HASH);
        assert_eq!(signatures.get("Burn").unwrap().topic_hash, abis::Burn::SIGNATURE_HASH);
        assert_eq!(signatures.name_of(&abis::Swap::SIGNATURE_HASH), Some("Swap"));
        // Functions are not events
        assert!(signatures.get("kLast").is_none());
        assert_eq!(signatures.len(), 6);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = EventSignatures::from_abi_json(PAIR_ABI_JSON).unwrap();
        let second = EventSignatures::from_abi_json(PAIR_ABI_JSON).unwrap();
        let first: Vec<_> = first.iter().cloned().collect();
        let second: Vec<_> = second.iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tuple_inputs_are_expanded() {
        let abi = r#"[{
            "type": "event",
            "name": "Settled",
            "inputs": [
                {"name": "order", "type": "tuple[]", "components": [
                    {"name": "maker", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ]},
                {"name": "id", "type": "bytes32"}
            ]
        }]"#;
        let signatures = EventSignatures::from_abi_json(abi).unwrap();
        assert_eq!(
            signatures.get("Settled").unwrap().canonical_signature,
            "Settled((address,uint256)[],bytes32)"
        );
    }

    #[test]
    fn test_event_without_inputs_is_malformed() {
        let abi = r#"[
            {"type": "function", "name": "kLast"},
            {"type": "event", "name": "Sync"}
        ]"#;
        match EventSignatures::from_abi_json(abi) {
            Err(AbiError::MalformedAbi { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "inputs");
            },
            other => panic!("expected MalformedAbi, got {other:?}"),
        }
    }

    #[test]
    fn test_event_without_name_is_malformed() {
        let abi = r#"[{"type": "event", "inputs": []}]"#;
        assert!(matches!(
            EventSignatures::from_abi_json(abi),
            Err(AbiError::MalformedAbi { field: "name", .. })
        ));
    }
}
