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
//! Jaccard similarity trait for sketches that support pairwise resemblance
//! estimation.
//!
//! Only [`crate::minhash::MinHash`] implements this: spec.md's Jaccard
//! estimation is a MinHash operation, and HyperLogLog/HyperLogLog++ are
//! specified as cardinality-only estimators (register update, merge,
//! `count`), with no Jaccard operation of their own.

use crate::SketchError;

/// Common API for sketches that can estimate Jaccard similarity.
///
/// The returned value is expected to be in `[0, 1]`:
/// - `0.0` means disjoint sets,
/// - `1.0` means identical sets.
///
/// # Example
/// ```rust
/// use sketches::jacard::JacardIndex;
/// use sketches::minhash::MinHash;
///
/// fn compare<S: JacardIndex>(left: &S, right: &S) -> f64 {
///     left.jaccard_index(right).unwrap()
/// }
///
/// let mut left = MinHash::new(128, 1).unwrap();
/// let mut right = MinHash::new(128, 1).unwrap();
/// for value in 0_u64..5_000 {
///     left.digest(&value.to_le_bytes()).unwrap();
/// }
/// for value in 2_500_u64..7_500 {
///     right.digest(&value.to_le_bytes()).unwrap();
/// }
///
/// let similarity = compare(&left, &right);
/// assert!(similarity > 0.20 && similarity < 0.60);
/// ```
pub trait JacardIndex {
    /// Returns the estimated Jaccard index `|A ∩ B| / |A ∪ B|`.
    ///
    /// # Errors
    /// Implementations return [`SketchError::IncompatibleSketchError`] when
    /// two sketches are not compatible for comparison.
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError>;
}
