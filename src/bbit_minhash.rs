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
//! b-bit MinHash: a compressed, comparison-only projection of a [`MinHash`].
//!
//! Storing the full MinHash register width is wasteful when all a consumer
//! needs is a Jaccard estimate: keeping only the low `b` bits of each
//! register shrinks the footprint by `64/b` while still supporting an
//! unbiased similarity estimator (Li & König, 2010). The projection carries
//! no `a`/`b` permutation coefficients, so it cannot be merged or further
//! unioned — only compared against another b-bit MinHash built with matching
//! `(b, num_perm, seed)`.

use std::io::Cursor;

use crate::error::SketchError;
use crate::io::{read_magic, read_u32, read_u8, read_version, write_magic, read_exact_vec, WriteExt};
use crate::minhash::MinHash;

const MAGIC: &[u8; 4] = b"BB01";
const VERSION: u8 = 1;

/// Minimum and maximum allowed projection widths, in bits per register.
pub const MIN_B: u8 = 1;
pub const MAX_B: u8 = 64;

/// Compressed, comparison-only projection of a [`MinHash`] onto the low `b`
/// bits of each register.
///
/// # Example
/// ```rust
/// use sketches::minhash::MinHash;
/// use sketches::bbit_minhash::BBitMinHash;
///
/// let mut mh = MinHash::new(128, 1).unwrap();
/// for value in 0_u64..1_000 {
///     mh.digest(&value.to_le_bytes()).unwrap();
/// }
///
/// let compressed = BBitMinHash::from_minhash(&mh, 1).unwrap();
/// assert_eq!(compressed.jaccard(&compressed).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBitMinHash {
    b: u8,
    num_perm: usize,
    seed: u64,
    l: Vec<u64>,
}

impl BBitMinHash {
    /// Projects a [`MinHash`]'s registers onto their low `b` bits.
    ///
    /// # Errors
    /// Returns [`SketchError::ParameterError`] if `b` is outside `[1, 64]`.
    pub fn from_minhash(source: &MinHash, b: u8) -> Result<Self, SketchError> {
        if !(MIN_B..=MAX_B).contains(&b) {
            return Err(SketchError::ParameterError {
                param: "b",
                reason: "must be in the inclusive range [1, 64]",
            });
        }

        let mask = mask_for(b);
        let l = source.registers().iter().map(|&value| value & mask).collect();
        Ok(Self {
            b,
            num_perm: source.num_perm(),
            seed: source.seed(),
            l,
        })
    }

    /// Returns the configured projection width in bits.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Returns the number of registers.
    pub fn num_perm(&self) -> usize {
        self.num_perm
    }

    /// Returns the configured permutation-family seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Estimates Jaccard similarity against another b-bit MinHash.
    ///
    /// Returns the unbiased estimator `(c - 2^-b) / (1 - 2^-b)`, clamped to
    /// `0.0` if it would otherwise be negative, where `c` is the raw
    /// per-register collision rate.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `b`, `num_perm`,
    /// or `seed` differ between the two sketches.
    pub fn jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        if self.b != other.b || self.num_perm != other.num_perm || self.seed != other.seed {
            return Err(SketchError::IncompatibleSketchError {
                reason: "b, num_perm, and seed must match",
            });
        }

        let collisions = self
            .l
            .iter()
            .zip(other.l.iter())
            .filter(|(left, right)| left == right)
            .count();
        let c = collisions as f64 / self.num_perm as f64;

        let single_bit_collision = 2f64.powi(-(self.b as i32));
        let denom = 1.0 - single_bit_collision;
        if denom <= 0.0 {
            // b so large that 2^-b underflows to 0: the raw rate is already
            // the unbiased estimate.
            return Ok(c.max(0.0));
        }
        Ok(((c - single_bit_collision) / denom).max(0.0))
    }

    /// Returns the exact length, in bytes, of this sketch's serialized form.
    pub fn bytesize(&self) -> usize {
        4 + 1 + 1 + 4 + 4 + packed_len(self.num_perm, self.b)
    }

    /// Serializes this sketch to its versioned, bit-packed byte layout.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytesize());
        write_magic(&mut out, MAGIC);
        out.put_u8(VERSION);
        out.put_u8(self.b);
        out.put_u32(self.seed as u32);
        out.put_u32(self.num_perm as u32);
        out.extend(pack_bits(&self.l, self.b));
        out
    }

    /// Deserializes a sketch previously produced by [`BBitMinHash::dump`].
    ///
    /// # Errors
    /// Returns [`SketchError::SerializationError`] on bad magic, an
    /// unsupported version, or a truncated buffer.
    pub fn load(bytes: &[u8]) -> Result<Self, SketchError> {
        let mut cursor = Cursor::new(bytes);
        read_magic(&mut cursor, MAGIC)?;
        read_version(&mut cursor, VERSION)?;
        let b = read_u8(&mut cursor, "b")?;
        let seed = read_u32(&mut cursor, "seed")? as u64;
        let num_perm = read_u32(&mut cursor, "num_perm")? as usize;
        let packed = read_exact_vec(&mut cursor, packed_len(num_perm, b), "L")?;
        let l = unpack_bits(&packed, num_perm, b);
        Ok(Self {
            b,
            num_perm,
            seed,
            l,
        })
    }
}

fn mask_for(b: u8) -> u64 {
    if b >= 64 {
        u64::MAX
    } else {
        (1u64 << b) - 1
    }
}

fn packed_len(num_perm: usize, b: u8) -> usize {
    (num_perm * b as usize).div_ceil(8)
}

/// Packs `num_perm` values of `b` bits each, LSB-first, into consecutive bit
/// positions across the output bytes.
fn pack_bits(values: &[u64], b: u8) -> Vec<u8> {
    let mut out = vec![0u8; packed_len(values.len(), b)];
    let mut bit_pos = 0usize;
    for &value in values {
        for bit in 0..b {
            if (value >> bit) & 1 == 1 {
                out[bit_pos / 8] |= 1 << (bit_pos % 8);
            }
            bit_pos += 1;
        }
    }
    out
}

fn unpack_bits(packed: &[u8], num_perm: usize, b: u8) -> Vec<u64> {
    let mut out = Vec::with_capacity(num_perm);
    let mut bit_pos = 0usize;
    for _ in 0..num_perm {
        let mut value = 0u64;
        for bit in 0..b {
            let byte = packed[bit_pos / 8];
            if (byte >> (bit_pos % 8)) & 1 == 1 {
                value |= 1 << bit;
            }
            bit_pos += 1;
        }
        out.push(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::BBitMinHash;
    use crate::minhash::MinHash;

    fn minhash_for_range(start: u64, end: u64, num_perm: usize, seed: u64) -> MinHash {
        let mut mh = MinHash::new(num_perm, seed).unwrap();
        for value in start..end {
            mh.digest(&value.to_le_bytes()).unwrap();
        }
        mh
    }

    #[test]
    fn constructor_validates_b_range() {
        let mh = minhash_for_range(0, 100, 64, 1);
        assert!(BBitMinHash::from_minhash(&mh, 0).is_err());
        assert!(BBitMinHash::from_minhash(&mh, 65).is_err());
        assert!(BBitMinHash::from_minhash(&mh, 1).is_ok());
        assert!(BBitMinHash::from_minhash(&mh, 64).is_ok());
    }

    #[test]
    fn identical_registers_have_jaccard_one_at_b_one() {
        let mh = minhash_for_range(0, 5_000, 64, 1);
        let compressed = BBitMinHash::from_minhash(&mh, 1).unwrap();
        assert_eq!(compressed.jaccard(&compressed).unwrap(), 1.0);
    }

    #[test]
    fn independent_sketches_estimate_near_zero_not_near_half() {
        let left = minhash_for_range(0, 10_000, 256, 1);
        let right = minhash_for_range(50_000, 60_000, 256, 1);
        let bleft = BBitMinHash::from_minhash(&left, 1).unwrap();
        let bright = BBitMinHash::from_minhash(&right, 1).unwrap();

        let estimate = bleft.jaccard(&bright).unwrap();
        assert!(estimate < 0.3, "estimate={estimate}");
    }

    #[test]
    fn estimate_converges_to_minhash_jaccard_as_b_grows() {
        let left = minhash_for_range(0, 10_000, 256, 1);
        let right = minhash_for_range(5_000, 15_000, 256, 1);
        let exact_minhash_jaccard = left.jaccard(&right).unwrap();

        let b_small = BBitMinHash::from_minhash(&left, 1).unwrap();
        let b_small_r = BBitMinHash::from_minhash(&right, 1).unwrap();
        let small_estimate = b_small.jaccard(&b_small_r).unwrap();

        let b_large = BBitMinHash::from_minhash(&left, 32).unwrap();
        let b_large_r = BBitMinHash::from_minhash(&right, 32).unwrap();
        let large_estimate = b_large.jaccard(&b_large_r).unwrap();

        assert!(
            (large_estimate - exact_minhash_jaccard).abs() < (small_estimate - exact_minhash_jaccard).abs() + 0.2
        );
    }

    #[test]
    fn jaccard_rejects_mismatched_parameters() {
        let mh = minhash_for_range(0, 1_000, 64, 1);
        let other_b = BBitMinHash::from_minhash(&mh, 2).unwrap();
        let same_b = BBitMinHash::from_minhash(&mh, 1).unwrap();
        assert!(same_b.jaccard(&other_b).is_err());

        let other_seed_mh = minhash_for_range(0, 1_000, 64, 2);
        let other_seed = BBitMinHash::from_minhash(&other_seed_mh, 1).unwrap();
        assert!(same_b.jaccard(&other_seed).is_err());
    }

    #[test]
    fn dump_load_round_trips_for_several_widths() {
        let mh = minhash_for_range(0, 3_000, 96, 5);
        for &b in &[1u8, 3, 7, 8, 16, 64] {
            let compressed = BBitMinHash::from_minhash(&mh, b).unwrap();
            let bytes = compressed.dump();
            assert_eq!(bytes.len(), compressed.bytesize());
            let loaded = BBitMinHash::load(&bytes).unwrap();
            assert_eq!(loaded, compressed);
        }
    }

    #[test]
    fn scenario_e_b_bit_jaccard_extremes() {
        let identical = minhash_for_range(0, 2_000, 128, 1);
        let identical_proj = BBitMinHash::from_minhash(&identical, 1).unwrap();
        assert_eq!(identical_proj.jaccard(&identical_proj).unwrap(), 1.0);

        let left = minhash_for_range(0, 5_000, 128, 1);
        let right = minhash_for_range(100_000, 105_000, 128, 1);
        let bleft = BBitMinHash::from_minhash(&left, 1).unwrap();
        let bright = BBitMinHash::from_minhash(&right, 1).unwrap();
        let estimate = bleft.jaccard(&bright).unwrap();
        assert!(estimate < 0.4, "estimate={estimate}");
    }
}
