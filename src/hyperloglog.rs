// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! HyperLogLog cardinality estimator over a 32-bit hash digest.
//!
//! Classic HyperLogLog with the small-range linear-counting correction and
//! the large-range correction for the 32-bit hash space. For a 64-bit-hash,
//! bias-corrected variant with a wider precision range, see
//! [`crate::hyperloglog_plus::HyperLogLogPlus`].

use std::io::Cursor;

use crate::error::SketchError;
use crate::hash;
use crate::io::{read_exact_vec, read_magic, read_u8, read_version, write_magic, WriteExt};

const MAGIC: &[u8; 4] = b"HL01";
const VERSION: u8 = 1;

const MIN_PRECISION: u8 = 4;
const MAX_PRECISION: u8 = 16;

/// Approximate distinct-count sketch using HyperLogLog registers over a
/// 32-bit hash digest.
///
/// # Example
/// ```rust
/// use sketches::hyperloglog::HyperLogLog;
///
/// let mut hll = HyperLogLog::new(12).unwrap();
/// for i in 0_u32..10_000 {
///     hll.digest(&i.to_le_bytes()).unwrap();
/// }
///
/// let estimate = hll.count();
/// assert!(estimate > 8_500.0 && estimate < 11_500.0);
/// ```
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    precision: u8,
    registers: Vec<u8>,
}

impl HyperLogLog {
    /// Creates a HyperLogLog with precision `p`. Register count is `2^p`.
    ///
    /// # Errors
    /// Returns [`SketchError::ParameterError`] when `p` is outside `[4, 16]`.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::ParameterError {
                param: "p",
                reason: "must be in the inclusive range [4, 16]",
            });
        }

        Ok(Self {
            precision,
            registers: vec![0; 1usize << precision],
        })
    }

    /// Returns the configured precision.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the number of registers (`2^precision`).
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Returns `true` if no item has been digested yet.
    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&register| register == 0)
    }

    /// Inserts one item's already-computed 32-bit hash digest.
    ///
    /// # Errors
    /// Returns [`SketchError::HashWidthError`] if fewer than 4 bytes are given.
    pub fn digest(&mut self, hash_bytes: &[u8]) -> Result<(), SketchError> {
        let x = hash::read_u32(hash_bytes)?;
        let j = (x & (self.registers.len() as u32 - 1)) as usize;
        let w = x >> self.precision;
        let rank = rho(w as u64, 32, self.precision);
        if rank > self.registers[j] {
            self.registers[j] = rank;
        }
        Ok(())
    }

    /// Merges another HyperLogLog into this sketch via elementwise maxima.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `precision` differs.
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            return Err(SketchError::IncompatibleSketchError {
                reason: "precision must match for merge",
            });
        }
        for (left, right) in self.registers.iter_mut().zip(other.registers.iter()) {
            *left = (*left).max(*right);
        }
        Ok(())
    }

    /// Returns the estimated cardinality.
    pub fn count(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let m = self.register_count() as f64;
        let alpha = alpha_m(self.register_count());
        let harmonic_sum = self
            .registers
            .iter()
            .map(|&register| 2f64.powi(-(register as i32)))
            .sum::<f64>();
        let raw_estimate = alpha * m * m / harmonic_sum;

        let zero_registers = self.registers.iter().filter(|&&r| r == 0).count() as f64;
        let small_range_corrected = if raw_estimate <= 2.5 * m && zero_registers > 0.0 {
            m * (m / zero_registers).ln()
        } else {
            raw_estimate
        };

        let two_to_32 = (u32::MAX as f64) + 1.0;
        if small_range_corrected > two_to_32 / 30.0 {
            let ratio = (small_range_corrected / two_to_32).min(1.0 - f64::EPSILON);
            -two_to_32 * (1.0 - ratio).ln()
        } else {
            small_range_corrected
        }
    }

    /// Returns the exact length, in bytes, of this sketch's serialized form.
    pub fn bytesize(&self) -> usize {
        4 + 1 + 1 + self.registers.len()
    }

    /// Serializes this sketch to its versioned byte layout.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytesize());
        write_magic(&mut out, MAGIC);
        out.put_u8(VERSION);
        out.put_u8(self.precision);
        out.extend_from_slice(&self.registers);
        out
    }

    /// Deserializes a sketch previously produced by [`HyperLogLog::dump`].
    ///
    /// # Errors
    /// Returns [`SketchError::SerializationError`] on bad magic, an
    /// unsupported version, or a truncated buffer.
    pub fn load(bytes: &[u8]) -> Result<Self, SketchError> {
        let mut cursor = Cursor::new(bytes);
        read_magic(&mut cursor, MAGIC)?;
        read_version(&mut cursor, VERSION)?;
        let precision = read_u8(&mut cursor, "p")?;
        let registers = read_exact_vec(&mut cursor, 1usize << precision, "R")?;
        Ok(Self {
            precision,
            registers,
        })
    }
}

impl PartialEq for HyperLogLog {
    fn eq(&self, other: &Self) -> bool {
        self.precision == other.precision && self.registers == other.registers
    }
}

/// Returns `rho(w)`: one plus the count of leading zeros of `w` within its
/// `width - p` low bits, with `rho(0) = width - p + 1`.
pub(crate) fn rho(w: u64, width: u32, p: u8) -> u8 {
    let remaining_bits = width - p as u32;
    if w == 0 {
        return (remaining_bits + 1) as u8;
    }
    let highest_bit = remaining_bits - (w << (64 - remaining_bits)).leading_zeros();
    (remaining_bits - highest_bit + 1) as u8
}

/// Returns the bias-correction constant `alpha_m` for register count `m`.
pub(crate) fn alpha_m(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::HyperLogLog;

    fn digest_range(hll: &mut HyperLogLog, start: u32, end: u32) {
        for value in start..end {
            hll.digest(&value.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn precision_range_is_enforced() {
        assert!(HyperLogLog::new(3).is_err());
        assert!(HyperLogLog::new(4).is_ok());
        assert!(HyperLogLog::new(16).is_ok());
        assert!(HyperLogLog::new(17).is_err());
    }

    #[test]
    fn empty_sketch_counts_zero() {
        let hll = HyperLogLog::new(12).unwrap();
        assert!(hll.is_empty());
        assert_eq!(hll.count(), 0.0);
    }

    #[test]
    fn digest_rejects_short_hash_bytes() {
        let mut hll = HyperLogLog::new(8).unwrap();
        assert!(hll.digest(&[1, 2, 3]).is_err());
    }

    #[test]
    fn scenario_b_distinct_token_count_is_in_expected_range() {
        use sha1::{Digest, Sha1};

        let mut hll = HyperLogLog::new(8).unwrap();
        for token in ["a", "b", "c", "a", "b", "c", "a"] {
            let digest = Sha1::digest(token.as_bytes());
            hll.digest(&digest).unwrap();
        }

        let estimate = hll.count();
        assert!((2.0..=4.0).contains(&estimate), "estimate={estimate}");
    }

    #[test]
    fn duplicate_insertions_do_not_inflate_cardinality() {
        let mut hll = HyperLogLog::new(12).unwrap();
        for _ in 0..1_000 {
            hll.digest(&42u32.to_le_bytes()).unwrap();
        }
        assert!(hll.count() <= 3.0);
    }

    #[test]
    fn estimate_is_reasonable_for_medium_cardinality() {
        let mut hll = HyperLogLog::new(12).unwrap();
        digest_range(&mut hll, 0, 10_000);
        let estimate = hll.count();
        let relative_error = (estimate - 10_000.0).abs() / 10_000.0;
        assert!(relative_error <= 0.10, "estimate={estimate}");
    }

    #[test]
    fn merge_equals_elementwise_max_and_bounds_the_union() {
        let mut left = HyperLogLog::new(12).unwrap();
        let mut right = HyperLogLog::new(12).unwrap();
        digest_range(&mut left, 0, 7_500);
        digest_range(&mut right, 7_500, 15_000);

        let left_count = left.count();
        let right_count = right.count();

        left.merge(&right).unwrap();
        let union_estimate = left.count();
        assert!(union_estimate >= left_count.max(right_count) * 0.9);
    }

    #[test]
    fn merge_rejects_mismatched_precision() {
        let mut left = HyperLogLog::new(10).unwrap();
        let right = HyperLogLog::new(11).unwrap();
        assert!(left.merge(&right).is_err());
    }

    #[test]
    fn dump_load_round_trips() {
        let mut hll = HyperLogLog::new(10).unwrap();
        digest_range(&mut hll, 0, 5_000);
        let bytes = hll.dump();
        assert_eq!(bytes.len(), hll.bytesize());
        let loaded = HyperLogLog::load(&bytes).unwrap();
        assert_eq!(loaded, hll);
    }

    #[test]
    fn load_rejects_bad_magic_and_truncated_input() {
        let hll = HyperLogLog::new(8).unwrap();
        let mut bytes = hll.dump();
        bytes[0] = b'X';
        assert!(HyperLogLog::load(&bytes).is_err());

        let bytes = hll.dump();
        assert!(HyperLogLog::load(&bytes[..bytes.len() - 1]).is_err());
    }
}
