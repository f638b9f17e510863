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
//! MinHash sketch for approximate Jaccard similarity and cardinality.

use std::io::Cursor;
use std::sync::Arc;

use crate::error::SketchError;
use crate::hash;
use crate::io::{read_magic, read_u32, read_u64 as io_read_u64, read_version, write_magic, WriteExt};
use crate::jacard::JacardIndex;
use crate::permutation::{self, MERSENNE_PRIME};

const MAGIC: &[u8; 4] = b"MH01";
const VERSION: u8 = 1;

/// Default number of permutations (registers) for a new [`MinHash`].
pub const DEFAULT_NUM_PERM: usize = 128;
/// Default permutation-family seed.
pub const DEFAULT_SEED: u64 = 1;

/// MinHash signature sketch for estimating Jaccard similarity and set
/// cardinality, built on a shared family of `num_perm` universal hash
/// permutations `h_i(x) = (a_i * x + b_i) mod M`.
///
/// # Example
/// ```rust
/// use sketches::minhash::MinHash;
///
/// let mut left = MinHash::new(128, 1).unwrap();
/// let mut right = MinHash::new(128, 1).unwrap();
///
/// for value in 0_u64..10_000 {
///     left.digest(&value.to_le_bytes()).unwrap();
/// }
/// for value in 5_000_u64..15_000 {
///     right.digest(&value.to_le_bytes()).unwrap();
/// }
///
/// // Exact Jaccard is 5_000 / 15_000 = 0.333...
/// let estimate = left.jaccard(&right).unwrap();
/// assert!(estimate > 0.15 && estimate < 0.55);
/// ```
#[derive(Debug, Clone)]
pub struct MinHash {
    seed: u64,
    num_perm: usize,
    a: Arc<[u64]>,
    b: Arc<[u64]>,
    h: Vec<u64>,
}

impl MinHash {
    /// Empty-register sentinel: `M - 1`.
    fn sentinel() -> u64 {
        MERSENNE_PRIME - 1
    }

    /// Creates an empty MinHash with `num_perm` registers under the
    /// permutation family identified by `seed`.
    ///
    /// # Errors
    /// Returns [`SketchError::ParameterError`] when `num_perm == 0`.
    pub fn new(num_perm: usize, seed: u64) -> Result<Self, SketchError> {
        if num_perm == 0 {
            return Err(SketchError::ParameterError {
                param: "num_perm",
                reason: "must be greater than zero",
            });
        }

        let (a, b) = permutation::derive(seed, num_perm);
        Ok(Self {
            seed,
            num_perm,
            a,
            b,
            h: vec![Self::sentinel(); num_perm],
        })
    }

    /// Creates an empty MinHash with the default `(num_perm, seed)` of
    /// `(128, 1)`.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_NUM_PERM, DEFAULT_SEED).expect("default num_perm is nonzero")
    }

    /// Returns the configured permutation-family seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of registers (permutations).
    pub fn num_perm(&self) -> usize {
        self.num_perm
    }

    /// Returns a read-only view of the register minima.
    pub fn registers(&self) -> &[u64] {
        &self.h
    }

    /// Returns `true` if no item has been digested yet (every register is
    /// still at its sentinel value).
    pub fn is_empty(&self) -> bool {
        self.h.iter().all(|&value| value == Self::sentinel())
    }

    /// Inserts one item's already-computed hash digest into the sketch.
    ///
    /// `hash_bytes` must supply at least 4 bytes; only the low 4, read
    /// little-endian, are used.
    ///
    /// # Errors
    /// Returns [`SketchError::HashWidthError`] if fewer than 4 bytes are given.
    pub fn digest(&mut self, hash_bytes: &[u8]) -> Result<(), SketchError> {
        let x = hash::read_u32(hash_bytes)? as u128;
        let m = MERSENNE_PRIME as u128;
        for i in 0..self.num_perm {
            // a[i] is up to ~2^61 and x up to ~2^32, so the product can reach
            // ~2^93: widen to u128 before reducing, or the mod-M result is wrong.
            let p = ((self.a[i] as u128 * x) + self.b[i] as u128) % m;
            let p = p as u64;
            if p < self.h[i] {
                self.h[i] = p;
            }
        }
        Ok(())
    }

    /// Merges `other` into `self` by taking elementwise minima.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `seed` or
    /// `num_perm` differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.ensure_compatible(other)?;
        for (left, right) in self.h.iter_mut().zip(other.h.iter()) {
            *left = (*left).min(*right);
        }
        Ok(())
    }

    /// Estimates Jaccard similarity against another MinHash sketch.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `seed` or
    /// `num_perm` differ.
    pub fn jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        self.ensure_compatible(other)?;
        let matches = self
            .h
            .iter()
            .zip(other.h.iter())
            .filter(|(left, right)| left == right)
            .count();
        Ok(matches as f64 / self.num_perm as f64)
    }

    /// Estimates set cardinality from the register minima.
    ///
    /// Returns `0.0` on a sketch where no register has moved off its
    /// sentinel value.
    pub fn count(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let m = MERSENNE_PRIME as f64;
        let mean = self
            .h
            .iter()
            .map(|&value| (value as f64 + 1.0) / m)
            .sum::<f64>()
            / self.num_perm as f64;
        (1.0 / mean) - 1.0
    }

    /// Returns the exact length, in bytes, of this sketch's serialized form.
    pub fn bytesize(&self) -> usize {
        4 + 1 + 4 + 4 + self.num_perm * 8
    }

    /// Serializes this sketch to its versioned byte layout. `a`/`b` are not
    /// persisted; [`MinHash::load`] recomputes them from `(seed, num_perm)`.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytesize());
        write_magic(&mut out, MAGIC);
        out.put_u8(VERSION);
        out.put_u32(self.seed as u32);
        out.put_u32(self.num_perm as u32);
        for &value in &self.h {
            out.put_u64(value);
        }
        out
    }

    /// Deserializes a sketch previously produced by [`MinHash::dump`].
    ///
    /// # Errors
    /// Returns [`SketchError::SerializationError`] on bad magic, an
    /// unsupported version, or a truncated buffer.
    pub fn load(bytes: &[u8]) -> Result<Self, SketchError> {
        let mut cursor = Cursor::new(bytes);
        read_magic(&mut cursor, MAGIC)?;
        read_version(&mut cursor, VERSION)?;
        let seed = read_u32(&mut cursor, "seed")? as u64;
        let num_perm = read_u32(&mut cursor, "num_perm")? as usize;

        let mut h = Vec::with_capacity(num_perm);
        for _ in 0..num_perm {
            h.push(io_read_u64(&mut cursor, "H[i]")?);
        }

        let (a, b) = permutation::derive(seed, num_perm);
        Ok(Self {
            seed,
            num_perm,
            a,
            b,
            h,
        })
    }

    fn ensure_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.seed != other.seed || self.num_perm != other.num_perm {
            return Err(SketchError::IncompatibleSketchError {
                reason: "seed and num_perm must match",
            });
        }
        Ok(())
    }
}

impl PartialEq for MinHash {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.num_perm == other.num_perm && self.h == other.h
    }
}

impl JacardIndex for MinHash {
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError> {
        self.jaccard(other)
    }
}
