//! Field-element words — the wire-format scalar every event payload is
//! built from.
//!
//! A `Felt` is a 252-bit value carried in a 32-byte big-endian word. All
//! richer types (addresses, 256-bit integers, strings) are views over one
//! or more words.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FeltError;

/// A single field-element word (32 bytes, big-endian, value < 2^252).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Felt([u8; 32]);

impl Felt {
    /// The zero word.
    pub const ZERO: Felt = Felt([0u8; 32]);

    /// Construct from raw big-endian bytes. Fails if the value does not fit
    /// the 252-bit field.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, FeltError> {
        if bytes[0] >= 0x10 {
            return Err(FeltError::FieldOverflow);
        }
        Ok(Self(bytes))
    }

    /// Big-endian byte view.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_u64(v: u64) -> Self {
        let mut b = [0u8; 32];
        b[24..].copy_from_slice(&v.to_be_bytes());
        Self(b)
    }

    pub fn from_u128(v: u128) -> Self {
        let mut b = [0u8; 32];
        b[16..].copy_from_slice(&v.to_be_bytes());
        Self(b)
    }

    /// Parse from a hex string (`0x`-prefixed or bare, any length ≤ 64).
    pub fn from_hex(s: &str) -> Result<Self, FeltError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.is_empty() || stripped.len() > 64 {
            return Err(FeltError::InvalidHex {
                reason: format!("expected 1..=64 hex digits, got {}", stripped.len()),
            });
        }
        let padded = format!("{stripped:0>64}");
        let raw = hex::decode(&padded).map_err(|e| FeltError::InvalidHex {
            reason: e.to_string(),
        })?;
        let mut b = [0u8; 32];
        b.copy_from_slice(&raw);
        Self::from_bytes(b)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Minimal lowercase hex form, `0x`-prefixed (leading zeros trimmed).
    pub fn to_hex(&self) -> String {
        let full = hex::encode(self.0);
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }

    /// Full-width (64 hex digit) lowercase form — the normalized shape used
    /// for addresses and natural keys.
    pub fn to_fixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Narrow to `u64`; fails if any higher bit is set.
    pub fn to_u64(&self) -> Result<u64, FeltError> {
        if self.0[..24].iter().any(|&b| b != 0) {
            return Err(FeltError::Narrowing { target: "u64" });
        }
        let mut be = [0u8; 8];
        be.copy_from_slice(&self.0[24..]);
        Ok(u64::from_be_bytes(be))
    }

    /// Narrow to `u128`; fails if any higher bit is set.
    pub fn to_u128(&self) -> Result<u128, FeltError> {
        if self.0[..16].iter().any(|&b| b != 0) {
            return Err(FeltError::Narrowing { target: "u128" });
        }
        let mut be = [0u8; 16];
        be.copy_from_slice(&self.0[16..]);
        Ok(u128::from_be_bytes(be))
    }

    /// Read the word as a 128-bit limb, clamping to `u128::MAX` when the
    /// word is wider. Upstream malformed data degrades instead of crashing
    /// the consumer; callers detect clamping by comparing against
    /// `u128::MAX`.
    pub fn to_limb_clamped(&self) -> u128 {
        self.to_u128().unwrap_or(u128::MAX)
    }

    /// View as a contract/account address in normalized form.
    pub fn to_address(&self) -> Address {
        Address(*self)
    }

    /// Decode a short inline string: up to 31 ASCII bytes packed big-endian
    /// into a single word.
    pub fn to_short_string(&self) -> Result<String, FeltError> {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        let bytes = &self.0[start..];
        if bytes.len() > 31 {
            return Err(FeltError::InvalidShortString {
                reason: "short string wider than 31 bytes".into(),
            });
        }
        String::from_utf8(bytes.to_vec()).map_err(|e| FeltError::InvalidShortString {
            reason: e.to_string(),
        })
    }

    /// Encode an ASCII string (≤ 31 bytes) into a single word.
    pub fn from_short_string(s: &str) -> Result<Self, FeltError> {
        let bytes = s.as_bytes();
        if bytes.len() > 31 {
            return Err(FeltError::InvalidShortString {
                reason: format!("{} bytes does not fit one word", bytes.len()),
            });
        }
        let mut b = [0u8; 32];
        b[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(b))
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Felt::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Address ─────────────────────────────────────────────────────────────────

/// A contract or account address — a field element rendered in its
/// fixed-width normalized form (`0x` + 64 lowercase hex digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Felt);

impl Address {
    pub fn from_hex(s: &str) -> Result<Self, FeltError> {
        Ok(Self(Felt::from_hex(s)?))
    }

    pub fn as_felt(&self) -> &Felt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_fixed_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let f = Felt::from_hex("0xabc123").unwrap();
        assert_eq!(f.to_hex(), "0xabc123");
        assert_eq!(Felt::from_hex(&f.to_fixed_hex()).unwrap(), f);
    }

    #[test]
    fn zero_renders_as_0x0() {
        assert_eq!(Felt::ZERO.to_hex(), "0x0");
        assert!(Felt::from_hex("0x0").unwrap().is_zero());
    }

    #[test]
    fn rejects_field_overflow() {
        // 2^252 needs a leading 0x10 byte
        let s = format!("0x1{}", "0".repeat(63));
        assert!(matches!(Felt::from_hex(&s), Err(FeltError::FieldOverflow)));
        // 2^252 - 1 is fine
        let s = format!("0xf{}", "f".repeat(62));
        assert!(Felt::from_hex(&s).is_ok());
    }

    #[test]
    fn rejects_overlong_hex() {
        let s = format!("0x{}", "1".repeat(65));
        assert!(Felt::from_hex(&s).is_err());
        assert!(Felt::from_hex("0x").is_err());
    }

    #[test]
    fn narrowing_conversions() {
        assert_eq!(Felt::from_u64(42).to_u64().unwrap(), 42);
        assert_eq!(Felt::from_u128(1 << 80).to_u128().unwrap(), 1 << 80);
        assert!(Felt::from_u128(1 << 80).to_u64().is_err());
    }

    #[test]
    fn limb_clamps_wide_words() {
        let wide = Felt::from_hex("0x10000000000000000000000000000000ff").unwrap();
        assert_eq!(wide.to_limb_clamped(), u128::MAX);
        assert_eq!(Felt::from_u128(7).to_limb_clamped(), 7);
    }

    #[test]
    fn short_string_roundtrip() {
        let f = Felt::from_short_string("agora").unwrap();
        assert_eq!(f.to_short_string().unwrap(), "agora");
        assert_eq!(Felt::ZERO.to_short_string().unwrap(), "");
        assert!(Felt::from_short_string("this string is far too long for a word").is_err());
    }

    #[test]
    fn address_is_fixed_width() {
        let a = Felt::from_hex("0x1").unwrap().to_address();
        let s = a.to_string();
        assert_eq!(s.len(), 66);
        assert!(s.ends_with('1'));
        assert_eq!(Address::from_hex(&s).unwrap(), a);
    }

    #[test]
    fn serde_as_hex_string() {
        let f = Felt::from_hex("0xdead").unwrap();
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, "\"0xdead\"");
        let back: Felt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
