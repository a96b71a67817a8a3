//! Event selectors — keccak-250 hashes of event names.

use tiny_keccak::{Hasher, Keccak};

use crate::felt::Felt;

/// Compute the selector for an event name: keccak-256 of the UTF-8 name,
/// truncated to the low 250 bits so it fits a field element.
pub fn event_selector(name: &str) -> Felt {
    let mut keccak = Keccak::v256();
    keccak.update(name.as_bytes());
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    out[0] &= 0x03; // keep 250 bits
    // masked output always fits the field
    Felt::from_bytes(out).unwrap_or(Felt::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_deterministic() {
        assert_eq!(event_selector("RewardsDeposited"), event_selector("RewardsDeposited"));
        assert_ne!(event_selector("RewardsDeposited"), event_selector("RewardsDistributed"));
    }

    #[test]
    fn selector_fits_250_bits() {
        for name in ["Transfer", "EpochAdvanced", "x"] {
            let s = event_selector(name);
            assert!(s.as_bytes()[0] <= 0x03);
        }
    }

    #[test]
    fn known_vector() {
        // sn_keccak("Transfer")
        assert_eq!(
            event_selector("Transfer").to_hex(),
            "0x99cd8bde557814842a3121e8ddfd433a539b8c9f14bf31ebf108d12e6196e9"
        );
    }
}
