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
//! MinHash banding LSH index for approximate nearest-neighbor candidate search.
//!
//! The index splits a MinHash signature of width `num_perm` into `b` bands of
//! `r` rows (`b * r <= num_perm`), hashing each band into a table bucket with
//! a collision-resistant digest. A query retrieves every key sharing a bucket
//! with the query in at least one band. `(b, r)` are not caller-chosen:
//! they're derived from `(threshold, weights)` by minimizing a weighted sum
//! of false-positive and false-negative probability mass.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::Cursor;

use crate::error::SketchError;
use crate::io::{
    read_exact_vec, read_f64, read_magic, read_u32, read_version, write_magic, WriteExt,
};
use crate::minhash::MinHash;

const MAGIC: &[u8; 4] = b"LS01";
const VERSION: u8 = 1;

/// Default resemblance threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.5;
/// Default MinHash signature width expected by a new index.
pub const DEFAULT_NUM_PERM: usize = 128;
/// Default false-positive/false-negative weighting.
pub const DEFAULT_WEIGHTS: (f64, f64) = (0.5, 0.5);

const INTEGRATION_SAMPLES: usize = 2000;

/// Locality-sensitive hashing index over MinHash signatures.
///
/// # Example
/// ```rust
/// use sketches::lsh::MinHashLsh;
/// use sketches::minhash::MinHash;
///
/// let mut index = MinHashLsh::new(0.5, 128, (0.5, 0.5)).unwrap();
///
/// let mut doc_a = MinHash::new(128, 1).unwrap();
/// let mut doc_b = MinHash::new(128, 1).unwrap();
/// let mut query = MinHash::new(128, 1).unwrap();
///
/// for token in 0_u64..10_000 {
///     doc_a.digest(&token.to_le_bytes()).unwrap();
/// }
/// for token in 20_000_u64..30_000 {
///     doc_b.digest(&token.to_le_bytes()).unwrap();
/// }
/// for token in 1_000_u64..11_000 {
///     query.digest(&token.to_le_bytes()).unwrap();
/// }
///
/// index.insert(1_u64, &doc_a).unwrap();
/// index.insert(2_u64, &doc_b).unwrap();
///
/// let candidates = index.query(&query).unwrap();
/// assert!(candidates.contains(&1));
/// ```
#[derive(Debug, Clone)]
pub struct MinHashLsh<K>
where
    K: Eq + Hash + Clone,
{
    threshold: f64,
    num_perm: usize,
    weights: (f64, f64),
    b: usize,
    r: usize,
    tables: Vec<HashMap<Vec<u8>, HashSet<K>>>,
    entries: HashMap<K, MinHash>,
}

impl<K> MinHashLsh<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LSH index for signatures of width `num_perm`, deriving
    /// `(b, r)` from `(threshold, weights)` by minimizing weighted
    /// false-positive/false-negative probability mass.
    ///
    /// # Errors
    /// Returns [`SketchError::ParameterError`] when `threshold` is outside
    /// `(0, 1)`, `num_perm == 0`, or `weights` do not sum to `1.0` with each
    /// component in `(0, 1)`.
    pub fn new(threshold: f64, num_perm: usize, weights: (f64, f64)) -> Result<Self, SketchError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(SketchError::ParameterError {
                param: "threshold",
                reason: "must be in the open interval (0, 1)",
            });
        }
        if num_perm == 0 {
            return Err(SketchError::ParameterError {
                param: "num_perm",
                reason: "must be greater than zero",
            });
        }
        let (w_fp, w_fn) = weights;
        if !(w_fp > 0.0 && w_fp < 1.0 && w_fn > 0.0 && w_fn < 1.0) {
            return Err(SketchError::ParameterError {
                param: "weights",
                reason: "each component must be in the open interval (0, 1)",
            });
        }
        if (w_fp + w_fn - 1.0).abs() > 1e-9 {
            return Err(SketchError::ParameterError {
                param: "weights",
                reason: "components must sum to 1.0",
            });
        }

        let (b, r) = solve_bands_and_rows(num_perm, threshold, weights);

        Ok(Self {
            threshold,
            num_perm,
            weights,
            b,
            r,
            tables: vec![HashMap::new(); b],
            entries: HashMap::new(),
        })
    }

    /// Returns the configured resemblance threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the MinHash signature width this index expects.
    pub fn num_perm(&self) -> usize {
        self.num_perm
    }

    /// Returns the configured `(w_fp, w_fn)` weighting.
    pub fn weights(&self) -> (f64, f64) {
        self.weights
    }

    /// Returns the derived number of bands.
    pub fn b(&self) -> usize {
        self.b
    }

    /// Returns the derived number of rows per band.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Returns the number of indexed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no keys are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when `key` is currently indexed.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts `signature` under `key`.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `signature.num_perm()`
    /// does not match this index, and [`SketchError::DuplicateKeyError`] when
    /// `key` is already indexed. The index never replaces an existing entry.
    pub fn insert(&mut self, key: K, signature: &MinHash) -> Result<(), SketchError> {
        self.ensure_compatible(signature)?;
        if self.entries.contains_key(&key) {
            return Err(SketchError::DuplicateKeyError);
        }

        for band in 0..self.b {
            let band_hash = self.band_hash(signature.registers(), band);
            self.tables[band]
                .entry(band_hash)
                .or_default()
                .insert(key.clone());
        }

        self.entries.insert(key, signature.clone());
        Ok(())
    }

    /// Returns the deduplicated union of keys sharing at least one band
    /// bucket with `query`. Order is unspecified.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `query.num_perm()`
    /// does not match this index.
    pub fn query(&self, query: &MinHash) -> Result<Vec<K>, SketchError> {
        self.ensure_compatible(query)?;

        let mut candidates = HashSet::new();
        for band in 0..self.b {
            let band_hash = self.band_hash(query.registers(), band);
            if let Some(bucket) = self.tables[band].get(&band_hash) {
                candidates.extend(bucket.iter().cloned());
            }
        }

        Ok(candidates.into_iter().collect())
    }

    /// Like [`MinHashLsh::query`], but re-checks each candidate's stored
    /// signature against `query` and keeps only those whose estimated
    /// Jaccard similarity is at least [`MinHashLsh::threshold`].
    ///
    /// This is an explicit opt-in: banding is allowed to return false
    /// positives by design, and this crate does not re-check automatically.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketchError`] when `query.num_perm()`
    /// does not match this index.
    pub fn query_and_verify(&self, query: &MinHash) -> Result<Vec<K>, SketchError> {
        let candidates = self.query(query)?;
        let mut verified = Vec::with_capacity(candidates.len());
        for key in candidates {
            if let Some(signature) = self.entries.get(&key) {
                if signature.jaccard(query)? >= self.threshold {
                    verified.push(key);
                }
            }
        }
        Ok(verified)
    }

    fn ensure_compatible(&self, signature: &MinHash) -> Result<(), SketchError> {
        if signature.num_perm() != self.num_perm {
            return Err(SketchError::IncompatibleSketchError {
                reason: "signature num_perm must match index num_perm",
            });
        }
        Ok(())
    }

    fn band_hash(&self, registers: &[u64], band: usize) -> Vec<u8> {
        let start = band * self.r;
        let end = start + self.r;
        let mut hasher = blake3::Hasher::new();
        for &register in &registers[start..end] {
            hasher.update(&register.to_le_bytes());
        }
        hasher.finalize().as_bytes().to_vec()
    }

    /// Returns the exact length, in bytes, of this index's serialized form,
    /// given the caller's key-encoding function.
    pub fn bytesize(&self, encode_key: impl Fn(&K) -> Vec<u8>) -> usize {
        let mut size = 4 + 1 + 8 + 4 + 16 + 4 + 4;
        for table in &self.tables {
            size += 4;
            for (signature, keys) in table {
                size += 4 + signature.len() + 4;
                for key in keys {
                    size += encode_key(key).len();
                }
            }
        }
        size
    }

    /// Serializes this index using `encode_key` to turn each key into bytes.
    pub fn dump(&self, encode_key: impl Fn(&K) -> Vec<u8>) -> Vec<u8> {
        let mut out = Vec::new();
        write_magic(&mut out, MAGIC);
        out.put_u8(VERSION);
        out.put_f64(self.threshold);
        out.put_u32(self.num_perm as u32);
        out.put_f64(self.weights.0);
        out.put_f64(self.weights.1);
        out.put_u32(self.b as u32);
        out.put_u32(self.r as u32);

        for table in &self.tables {
            out.put_u32(table.len() as u32);
            for (signature, keys) in table {
                out.put_u32(signature.len() as u32);
                out.extend_from_slice(signature);
                out.put_u32(keys.len() as u32);
                for key in keys {
                    let encoded = encode_key(key);
                    out.put_u32(encoded.len() as u32);
                    out.extend_from_slice(&encoded);
                }
            }
        }
        out
    }

    /// Deserializes an index previously produced by [`MinHashLsh::dump`].
    ///
    /// `decode_key` turns each key's encoded bytes back into a `K`; the
    /// reconstructed index has no stored `MinHash` signatures (only the band
    /// buckets), so [`MinHashLsh::query_and_verify`] is unavailable on it —
    /// only [`MinHashLsh::query`] and the shape accessors work.
    ///
    /// # Errors
    /// Returns [`SketchError::SerializationError`] on bad magic, an
    /// unsupported version, a truncated buffer, or a `decode_key` failure.
    pub fn load(
        bytes: &[u8],
        decode_key: impl Fn(&[u8]) -> Result<K, SketchError>,
    ) -> Result<Self, SketchError> {
        let mut cursor = Cursor::new(bytes);
        read_magic(&mut cursor, MAGIC)?;
        read_version(&mut cursor, VERSION)?;
        let threshold = read_f64(&mut cursor, "threshold")?;
        let num_perm = read_u32(&mut cursor, "num_perm")? as usize;
        let w_fp = read_f64(&mut cursor, "w_fp")?;
        let w_fn = read_f64(&mut cursor, "w_fn")?;
        let b = read_u32(&mut cursor, "b")? as usize;
        let r = read_u32(&mut cursor, "r")? as usize;

        let mut tables = Vec::with_capacity(b);
        for _ in 0..b {
            let count = read_u32(&mut cursor, "count")? as usize;
            let mut table: HashMap<Vec<u8>, HashSet<K>> = HashMap::with_capacity(count);
            for _ in 0..count {
                let signature_len = read_u32(&mut cursor, "signature_len")? as usize;
                let signature = read_exact_vec(&mut cursor, signature_len, "signature_bytes")?;
                let key_count = read_u32(&mut cursor, "key_count")? as usize;
                let mut keys = HashSet::with_capacity(key_count);
                for _ in 0..key_count {
                    let key_len = read_u32(&mut cursor, "key_len")? as usize;
                    let key_bytes = read_exact_vec(&mut cursor, key_len, "key_bytes")?;
                    keys.insert(decode_key(&key_bytes)?);
                }
                table.insert(signature, keys);
            }
            tables.push(table);
        }

        Ok(Self {
            threshold,
            num_perm,
            weights: (w_fp, w_fn),
            b,
            r,
            tables,
            entries: HashMap::new(),
        })
    }
}

/// Selects `(b, r)` with `b * r <= num_perm` minimizing
/// `w_fp * FP(b, r) + w_fn * FN(b, r)`, ties broken toward larger `b`.
fn solve_bands_and_rows(num_perm: usize, threshold: f64, weights: (f64, f64)) -> (usize, usize) {
    let (w_fp, w_fn) = weights;
    let mut best: Option<(usize, usize, f64)> = None;

    for b in 1..=num_perm {
        let max_r = num_perm / b;
        for r in 1..=max_r {
            let cost = w_fp * false_positive_mass(b, r, threshold)
                + w_fn * false_negative_mass(b, r, threshold);
            let better = match best {
                None => true,
                Some((best_b, _, best_cost)) => {
                    cost < best_cost - 1e-9 || ((cost - best_cost).abs() <= 1e-9 && b > best_b)
                }
            };
            if better {
                best = Some((b, r, cost));
            }
        }
    }

    let (b, r, _) = best.expect("num_perm >= 1 guarantees at least (b=1, r=1)");
    (b, r)
}

/// `FP(b, r) = integral from 0 to threshold of (1 - (1 - s^r)^b) ds`.
fn false_positive_mass(b: usize, r: usize, threshold: f64) -> f64 {
    trapezoid(0.0, threshold, INTEGRATION_SAMPLES, |s| {
        1.0 - (1.0 - s.powi(r as i32)).powi(b as i32)
    })
}

/// `FN(b, r) = integral from threshold to 1 of (1 - s^r)^b ds`.
fn false_negative_mass(b: usize, r: usize, threshold: f64) -> f64 {
    trapezoid(threshold, 1.0, INTEGRATION_SAMPLES, |s| {
        (1.0 - s.powi(r as i32)).powi(b as i32)
    })
}

fn trapezoid(lo: f64, hi: f64, samples: usize, f: impl Fn(f64) -> f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    let step = (hi - lo) / samples as f64;
    let mut sum = 0.5 * (f(lo) + f(hi));
    for i in 1..samples {
        sum += f(lo + step * i as f64);
    }
    sum * step
}
