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
//! HyperLogLog++ cardinality estimator over a 64-bit hash digest.
//!
//! Differs from [`crate::hyperloglog::HyperLogLog`] in three ways: the hash
//! digest is 64 bits wide (removing any realistic risk of hash-space
//! exhaustion, so there is no large-range correction), the precision range
//! extends to 18, and the small-range regime is corrected with an empirical
//! bias table (see [`crate::hll_bias`]) instead of plain linear counting.

use std::io::Cursor;

use crate::error::SketchError;
use crate::hash;
use crate::hll_bias;
use crate::hyperloglog::{alpha_m, rho};
use crate::io::{read_exact_vec, read_magic, read_u8, read_version, write_magic, WriteExt};

const MAGIC: &[u8; 4] = b"HP01";
const VERSION: u8 = 1;

const MIN_PRECISION: u8 = 4;
const MAX_PRECISION: u8 = 18;

/// Approximate distinct-count sketch using HyperLogLog++ registers over a
/// 64-bit hash digest, with bias-corrected small-range estimation.
///
/// # Example
/// ```rust
/// use sketches::hyperloglog_plus::HyperLogLogPlus;
///
/// let mut hll = HyperLogLogPlus::new(14).unwrap();
/// for i in 0_u64..50_000 {
///     hll.digest(&i.to_le_bytes()).unwrap();
/// }
///
/// let estimate = hll.count();
/// assert!(estimate > 45_000.0 && estimate < 55_000.0);
/// ```
#[derive(Debug, Clone)]
pub struct HyperLogLogPlus {
    precision: u8,
    registers: Vec<u8>,
}

impl HyperLogLogPlus {
    /// Creates a HyperLogLog++ with precision `p`. Register count is `2^p`.
    ///
    /// # Errors
    /// Returns [`SketchError::ParameterError`] when `p` is outside `[4, 18]`.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::ParameterError {
                param: "p",
                reason: "must be in the inclusive range [4, 18]",
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

    /// Inserts one item's already-computed 64-bit hash digest.
    ///
    /// # Errors
    /// Returns [`SketchError::HashWidthError`] if fewer than 8 bytes are given.
    pub fn digest(&mut self, hash_bytes: &[u8]) -> Result<(), SketchError> {
        let x = hash::read_u64(hash_bytes)?;
        let j = (x & (self.registers.len() as u64 - 1)) as usize;
        let w = x >> self.precision;
        let rank = rho(w, 64, self.precision);
        if rank > self.registers[j] {
            self.registers[j] = rank;
        }
        Ok(())
    }

    /// Merges another HyperLogLog++ into this sketch via elementwise maxima.
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
    ///
    /// Uses the raw HyperLogLog estimator above the precision's bias
    /// threshold, and below it corrects with the empirical bias table,
    /// falling back to linear counting when that would be more accurate
    /// (there are unused registers and linear counting stays under the
    /// threshold too).
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

        let threshold = hll_bias::threshold_for(self.precision).unwrap_or(f64::INFINITY);
        if raw_estimate > threshold {
            return raw_estimate;
        }

        let zero_registers = self.registers.iter().filter(|&&r| r == 0).count() as f64;
        let bias_corrected = raw_estimate - hll_bias::bias_correction(self.precision, raw_estimate);

        if zero_registers > 0.0 {
            let linear_counting = m * (m / zero_registers).ln();
            if linear_counting <= threshold {
                return linear_counting;
            }
        }
        bias_corrected.max(0.0)
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

    /// Deserializes a sketch previously produced by [`HyperLogLogPlus::dump`].
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

impl PartialEq for HyperLogLogPlus {
    fn eq(&self, other: &Self) -> bool {
        self.precision == other.precision && self.registers == other.registers
    }
}

#[cfg(test)]
mod tests {
    use super::HyperLogLogPlus;

    fn digest_range(hll: &mut HyperLogLogPlus, start: u64, end: u64) {
        for value in start..end {
            hll.digest(&value.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn precision_range_is_enforced() {
        assert!(HyperLogLogPlus::new(3).is_err());
        assert!(HyperLogLogPlus::new(4).is_ok());
        assert!(HyperLogLogPlus::new(18).is_ok());
        assert!(HyperLogLogPlus::new(19).is_err());
    }

    #[test]
    fn empty_sketch_counts_zero() {
        let hll = HyperLogLogPlus::new(12).unwrap();
        assert!(hll.is_empty());
        assert_eq!(hll.count(), 0.0);
    }

    #[test]
    fn digest_rejects_short_hash_bytes() {
        let mut hll = HyperLogLogPlus::new(8).unwrap();
        assert!(hll.digest(&[1, 2, 3, 4, 5, 6, 7]).is_err());
    }

    #[test]
    fn small_cardinality_estimate_is_close() {
        let mut hll = HyperLogLogPlus::new(14).unwrap();
        digest_range(&mut hll, 0, 200);
        let estimate = hll.count();
        let relative_error = (estimate - 200.0).abs() / 200.0;
        assert!(relative_error <= 0.20, "estimate={estimate}");
    }

    #[test]
    fn medium_cardinality_estimate_is_close() {
        let mut hll = HyperLogLogPlus::new(14).unwrap();
        digest_range(&mut hll, 0, 50_000);
        let estimate = hll.count();
        let relative_error = (estimate - 50_000.0).abs() / 50_000.0;
        assert!(relative_error <= 0.05, "estimate={estimate}");
    }

    #[test]
    fn large_cardinality_estimate_needs_no_large_range_correction() {
        let mut hll = HyperLogLogPlus::new(16).unwrap();
        digest_range(&mut hll, 0, 2_000_000);
        let estimate = hll.count();
        let relative_error = (estimate - 2_000_000.0).abs() / 2_000_000.0;
        assert!(relative_error <= 0.05, "estimate={estimate}");
    }

    #[test]
    fn merge_equals_elementwise_max_and_bounds_the_union() {
        let mut left = HyperLogLogPlus::new(14).unwrap();
        let mut right = HyperLogLogPlus::new(14).unwrap();
        digest_range(&mut left, 0, 20_000);
        digest_range(&mut right, 20_000, 40_000);

        left.merge(&right).unwrap();
        let estimate = left.count();
        let relative_error = (estimate - 40_000.0).abs() / 40_000.0;
        assert!(relative_error <= 0.05, "estimate={estimate}");
    }

    #[test]
    fn merge_rejects_mismatched_precision() {
        let mut left = HyperLogLogPlus::new(10).unwrap();
        let right = HyperLogLogPlus::new(11).unwrap();
        assert!(left.merge(&right).is_err());
    }

    #[test]
    fn dump_load_round_trips() {
        let mut hll = HyperLogLogPlus::new(12).unwrap();
        digest_range(&mut hll, 0, 5_000);
        let bytes = hll.dump();
        assert_eq!(bytes.len(), hll.bytesize());
        let loaded = HyperLogLogPlus::load(&bytes).unwrap();
        assert_eq!(loaded, hll);
    }

    #[test]
    fn load_rejects_bad_magic_and_truncated_input() {
        let hll = HyperLogLogPlus::new(8).unwrap();
        let mut bytes = hll.dump();
        bytes[0] = b'X';
        assert!(HyperLogLogPlus::load(&bytes).is_err());

        let bytes = hll.dump();
        assert!(HyperLogLogPlus::load(&bytes[..bytes.len() - 1]).is_err());
    }
}
