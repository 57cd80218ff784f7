//! Positional encoding of (start, end) category pairs
//!
//! A combined code packs a pair of category values into one integer:
//!
//! ```text
//! code = start * BASE + end
//! ```
//!
//! `BASE` is a power of ten larger than every category value, so the start
//! value occupies the high-order digits and the end value the low-order ones
//! (NLCD 41 → 21 is code 4121 with the default base of 100).

use crate::error::{Error, Result};

/// A (start, end) pair packed into a single raster value
pub type CombinedCode = i64;

/// Base used for the published change products (category values 0–99)
pub const DEFAULT_BASE: i64 = 100;

/// Encodes and decodes combined codes for a fixed base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEncoder {
    base: i64,
}

impl Default for CodeEncoder {
    fn default() -> Self {
        Self { base: DEFAULT_BASE }
    }
}

impl CodeEncoder {
    /// Create an encoder for an explicit base, which must be a power of ten ≥ 10.
    ///
    /// `base * base` must fit in an `i64`, so every code below it is
    /// representable: the largest accepted base is 10^9.
    pub fn new(base: i64) -> Result<Self> {
        if !is_power_of_ten(base) {
            return Err(Error::InvalidParameter {
                name: "base",
                value: base.to_string(),
                reason: "must be a power of ten >= 10".into(),
            });
        }
        if base.checked_mul(base).is_none() {
            return Err(Error::InvalidParameter {
                name: "base",
                value: base.to_string(),
                reason: "combined codes would overflow a 64-bit integer".into(),
            });
        }
        Ok(Self { base })
    }

    /// Smallest power-of-ten base that exceeds `max_value`
    pub fn for_max_value(max_value: i64) -> Result<Self> {
        if max_value < 0 {
            return Err(Error::ValueOutOfRange {
                value: max_value,
                base: DEFAULT_BASE,
            });
        }
        let mut base: i64 = 10;
        while base <= max_value {
            base = base.checked_mul(10).ok_or_else(|| Error::InvalidParameter {
                name: "max_value",
                value: max_value.to_string(),
                reason: "too large to encode".into(),
            })?;
        }
        Self::new(base)
    }

    /// Like [`for_max_value`](Self::for_max_value) but never smaller than
    /// [`DEFAULT_BASE`], so legends within 0–99 keep the familiar codes.
    pub fn for_categories(max_value: i64) -> Result<Self> {
        let fitted = Self::for_max_value(max_value)?;
        Ok(Self {
            base: fitted.base.max(DEFAULT_BASE),
        })
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    /// Pack `(start, end)` into a combined code.
    ///
    /// Both values must lie in `0..base`.
    pub fn encode(&self, start: i64, end: i64) -> Result<CombinedCode> {
        self.check(start)?;
        self.check(end)?;
        Ok(start * self.base + end)
    }

    /// Recover the `(start, end)` pair from a combined code
    pub fn decode(&self, code: CombinedCode) -> Result<(i64, i64)> {
        let limit = self.base * self.base;
        if !(0..limit).contains(&code) {
            return Err(Error::CodeOutOfRange { code, limit });
        }
        Ok((code / self.base, code % self.base))
    }

    fn check(&self, value: i64) -> Result<()> {
        if (0..self.base).contains(&value) {
            Ok(())
        } else {
            Err(Error::ValueOutOfRange {
                value,
                base: self.base,
            })
        }
    }
}

fn is_power_of_ten(mut n: i64) -> bool {
    if n < 10 {
        return false;
    }
    while n % 10 == 0 {
        n /= 10;
    }
    n == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_encode_nlcd_pair() {
        let enc = CodeEncoder::default();
        assert_eq!(enc.encode(41, 21).unwrap(), 4121);
        assert_eq!(enc.encode(4, 2).unwrap(), 402);
        assert_eq!(enc.encode(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_round_trip_full_domain() {
        let enc = CodeEncoder::default();
        for s in 0..enc.base() {
            for e in 0..enc.base() {
                let code = enc.encode(s, e).unwrap();
                assert_eq!(enc.decode(code).unwrap(), (s, e));
            }
        }
    }

    #[test]
    fn test_out_of_range_values() {
        let enc = CodeEncoder::default();
        let err = enc.encode(100, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(enc.encode(1, -1).is_err());
        assert!(enc.decode(-5).is_err());
        assert!(enc.decode(10_000).is_err());
    }

    #[test]
    fn test_base_selection() {
        assert_eq!(CodeEncoder::for_max_value(95).unwrap().base(), 100);
        assert_eq!(CodeEncoder::for_max_value(99).unwrap().base(), 100);
        assert_eq!(CodeEncoder::for_max_value(100).unwrap().base(), 1000);
        assert_eq!(CodeEncoder::for_max_value(6).unwrap().base(), 10);
        assert_eq!(CodeEncoder::for_categories(6).unwrap().base(), 100);
        assert_eq!(CodeEncoder::for_categories(250).unwrap().base(), 1000);
    }

    #[test]
    fn test_invalid_base() {
        assert!(CodeEncoder::new(50).is_err());
        assert!(CodeEncoder::new(1).is_err());
        assert!(CodeEncoder::new(1000).is_ok());
        assert!(CodeEncoder::new(1_000_000_000).is_ok());
        assert!(CodeEncoder::new(10_000_000_000).is_err());
    }

    #[test]
    fn test_legend_value_too_large_to_encode() {
        let err = CodeEncoder::for_categories(5_000_000_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);

        let enc = CodeEncoder::for_categories(999_999_999).unwrap();
        assert_eq!(enc.base(), 1_000_000_000);
        let code = enc.encode(999_999_999, 999_999_999).unwrap();
        assert_eq!(enc.decode(code).unwrap(), (999_999_999, 999_999_999));
        assert!(enc.decode(42).is_ok());
    }
}
