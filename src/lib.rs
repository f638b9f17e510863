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
//! Probabilistic sketches for set cardinality and similarity estimation in
//! bounded memory.
//!
//! The crate exposes:
//! - [`minhash::MinHash`] for approximate Jaccard similarity and cardinality.
//! - [`bbit_minhash::BBitMinHash`] for a compressed, lossy MinHash variant.
//! - [`hyperloglog::HyperLogLog`] for approximate cardinality estimation.
//! - [`hyperloglog_plus::HyperLogLogPlus`] for a wider-precision,
//!   bias-corrected cardinality estimator.
//! - [`lsh::MinHashLsh`] for sub-linear approximate-similarity search over a
//!   collection of MinHash signatures.
//! - [`jacard::JacardIndex`] as the Jaccard-similarity trait MinHash
//!   implements.
//!
//! Every sketch consumes caller-supplied hash digests (see [`hash`]) rather
//! than hashing items itself, and every sketch with a fixed shape supports
//! byte-exact `dump`/`load` round-tripping (see [`io`]).

pub mod bbit_minhash;
pub mod error;
pub mod hash;
pub mod hll_bias;
pub mod hyperloglog;
pub mod hyperloglog_plus;
pub mod io;
pub mod jacard;
pub mod lsh;
pub mod minhash;
pub mod permutation;

pub use error::SketchError;
