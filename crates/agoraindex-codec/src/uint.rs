//! 256-bit unsigned integers carried as two 128-bit limb words.
//!
//! On the wire a `u256` is `(low, high)` with the value `low + high·2^128`.
//! Aggregate totals use `U256` end to end; it serializes as a decimal
//! string so 256-bit amounts survive JSON and SQLite untouched.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::felt::Felt;

/// A 256-bit unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256 {
    /// Low 128 bits.
    pub low: u128,
    /// High 128 bits.
    pub high: u128,
}

#[derive(Debug, Error)]
pub enum UintError {
    #[error("invalid decimal string: {reason}")]
    InvalidDecimal { reason: String },

    #[error("decimal string overflows 256 bits")]
    Overflow,
}

impl U256 {
    pub const ZERO: U256 = U256 { low: 0, high: 0 };
    pub const MAX: U256 = U256 { low: u128::MAX, high: u128::MAX };
    /// The largest value a single limb may carry; wider words clamp here.
    pub const LIMB_MAX: u128 = u128::MAX;

    pub fn from_u64(v: u64) -> Self {
        Self { low: v as u128, high: 0 }
    }

    pub fn from_u128(v: u128) -> Self {
        Self { low: v, high: 0 }
    }

    /// Assemble from two limb words: `low + high·2^128`.
    ///
    /// Each limb is constrained to `[0, 2^128)`; an out-of-range word clamps
    /// to `LIMB_MAX` rather than failing, so malformed upstream data
    /// degrades instead of killing the consumer. Callers that care can
    /// compare the limbs against `LIMB_MAX` to detect clamping.
    pub fn from_words(low: &Felt, high: &Felt) -> Self {
        Self {
            low: low.to_limb_clamped(),
            high: high.to_limb_clamped(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    /// Addition that pins at `U256::MAX` on overflow. Aggregate totals are
    /// monotonic accumulators, so saturation beats wrapping.
    pub fn saturating_add(&self, rhs: &U256) -> U256 {
        let (low, carry) = self.low.overflowing_add(rhs.low);
        let (high, of1) = self.high.overflowing_add(rhs.high);
        let (high, of2) = high.overflowing_add(carry as u128);
        if of1 || of2 {
            U256::MAX
        } else {
            U256 { low, high }
        }
    }

    pub fn checked_add(&self, rhs: &U256) -> Option<U256> {
        let (low, carry) = self.low.overflowing_add(rhs.low);
        let high = self.high.checked_add(rhs.high)?.checked_add(carry as u128)?;
        Some(U256 { low, high })
    }

    fn to_limbs64(self) -> [u64; 4] {
        [
            self.low as u64,
            (self.low >> 64) as u64,
            self.high as u64,
            (self.high >> 64) as u64,
        ]
    }

    fn from_limbs64(limbs: [u64; 4]) -> Self {
        Self {
            low: limbs[0] as u128 | (limbs[1] as u128) << 64,
            high: limbs[2] as u128 | (limbs[3] as u128) << 64,
        }
    }

    /// Render as a decimal string.
    pub fn to_decimal_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut limbs = self.to_limbs64();
        let mut digits = Vec::new();
        while limbs != [0u64; 4] {
            let mut rem: u128 = 0;
            for limb in limbs.iter_mut().rev() {
                let cur = (rem << 64) | *limb as u128;
                *limb = (cur / 10) as u64;
                rem = cur % 10;
            }
            digits.push(b'0' + rem as u8);
        }
        digits.reverse();
        String::from_utf8(digits).unwrap_or_default()
    }

    /// Parse a decimal string.
    pub fn from_dec_str(s: &str) -> Result<Self, UintError> {
        if s.is_empty() {
            return Err(UintError::InvalidDecimal {
                reason: "empty string".into(),
            });
        }
        let mut limbs = [0u64; 4];
        for ch in s.bytes() {
            if !ch.is_ascii_digit() {
                return Err(UintError::InvalidDecimal {
                    reason: format!("unexpected character '{}'", ch as char),
                });
            }
            // limbs = limbs * 10 + digit
            let mut carry: u128 = (ch - b'0') as u128;
            for limb in limbs.iter_mut() {
                let cur = *limb as u128 * 10 + carry;
                *limb = cur as u64;
                carry = cur >> 64;
            }
            if carry != 0 {
                return Err(UintError::Overflow);
            }
        }
        Ok(Self::from_limbs64(limbs))
    }

    /// Fixed-point rendering for human-facing totals: shifts the decimal
    /// point `decimals` places left and trims trailing fractional zeros.
    pub fn to_fixed_decimal(&self, decimals: u32) -> String {
        let raw = self.to_decimal_string();
        if decimals == 0 {
            return raw;
        }
        let decimals = decimals as usize;
        let padded = format!("{raw:0>width$}", width = decimals + 1);
        let split = padded.len() - decimals;
        let (int_part, frac_part) = padded.split_at(split);
        let frac = frac_part.trim_end_matches('0');
        if frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac}")
        }
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.high.cmp(&other.high).then(self.low.cmp(&other.low))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s).map_err(serde::de::Error::custom)
    }
}
