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
//! Deterministic MinHash permutation family.
//!
//! MinHash realizes its `num_perm` independent hash functions as
//! `h_i(x) = (a_i * x + b_i) mod M` over the Mersenne prime
//! `M = 2^61 - 1`. Two sketches built with the same `(seed, num_perm)` must
//! carry byte-identical `a`/`b`, or they would not be mergeable. This module
//! draws `a`/`b` from a seeded, reproducible PRNG stream and memoizes the
//! result per `(seed, num_perm)` so repeated construction is cheap and two
//! independently constructed sketches never disagree.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The Mersenne prime modulus used by every MinHash permutation.
pub const MERSENNE_PRIME: u64 = (1u64 << 61) - 1;

type PermutationPair = (Arc<[u64]>, Arc<[u64]>);
type PermutationCache = Mutex<HashMap<(u64, usize), PermutationPair>>;

fn cache() -> &'static PermutationCache {
    static CACHE: OnceLock<PermutationCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared `(a, b)` permutation coefficients for `(seed, num_perm)`,
/// computing and caching them on first use.
///
/// `a[i]` is drawn uniform in `[1, M)`, `b[i]` uniform in `[0, M)`. The draw
/// is deterministic: any two calls with the same `(seed, num_perm)`, in the
/// same process or a different one, observe the same sequence because the
/// generator (`ChaCha8Rng`) is itself deterministic given a seed.
pub(crate) fn derive(seed: u64, num_perm: usize) -> PermutationPair {
    let key = (seed, num_perm);
    {
        let guard = cache().lock().expect("permutation cache poisoned");
        if let Some(pair) = guard.get(&key) {
            return pair.clone();
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut a = Vec::with_capacity(num_perm);
    let mut b = Vec::with_capacity(num_perm);
    for _ in 0..num_perm {
        // `a_i` must be nonzero mod M; rejection sampling keeps the
        // distribution uniform over [1, M) without biasing toward small values.
        let mut ai = uniform_below(&mut rng, MERSENNE_PRIME);
        while ai == 0 {
            ai = uniform_below(&mut rng, MERSENNE_PRIME);
        }
        a.push(ai);
        b.push(uniform_below(&mut rng, MERSENNE_PRIME));
    }

    let pair: PermutationPair = (Arc::from(a.into_boxed_slice()), Arc::from(b.into_boxed_slice()));
    let mut guard = cache().lock().expect("permutation cache poisoned");
    guard.entry(key).or_insert_with(|| pair.clone());
    guard.get(&key).expect("just inserted").clone()
}

/// Draws a uniform value in `[0, bound)` via rejection sampling on a 64-bit
/// stream, avoiding modulo bias.
fn uniform_below(rng: &mut ChaCha8Rng, bound: u64) -> u64 {
    let zone = u64::MAX - (u64::MAX % bound);
    loop {
        let candidate = rng.next_u64();
        if candidate < zone {
            return candidate % bound;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{derive, MERSENNE_PRIME};

    #[test]
    fn same_seed_and_width_produce_identical_tables() {
        let (a1, b1) = derive(7, 32);
        let (a2, b2) = derive(7, 32);
        assert_eq!(a1.as_ref(), a2.as_ref());
        assert_eq!(b1.as_ref(), b2.as_ref());
    }

    #[test]
    fn different_seeds_produce_different_tables() {
        let (a1, _) = derive(1, 16);
        let (a2, _) = derive(2, 16);
        assert_ne!(a1.as_ref(), a2.as_ref());
    }

    #[test]
    fn coefficients_are_in_range() {
        let (a, b) = derive(42, 64);
        assert_eq!(a.len(), 64);
        assert_eq!(b.len(), 64);
        for &value in a.iter() {
            assert!(value >= 1 && value < MERSENNE_PRIME);
        }
        for &value in b.iter() {
            assert!(value < MERSENNE_PRIME);
        }
    }

    #[test]
    fn different_widths_are_cached_independently() {
        let (a16, _) = derive(9, 16);
        let (a32, _) = derive(9, 32);
        assert_eq!(a16.as_ref(), &a32[..16]);
    }
}
