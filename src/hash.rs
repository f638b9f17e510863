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
//! Hash ingestion adapter.
//!
//! Every sketch in this crate consumes an externally produced digest (SHA-1,
//! MurmurHash, BLAKE3, ...) rather than hashing items itself. This module
//! normalizes such a digest into the fixed-width unsigned integer a sketch
//! needs, reading only the low-order bytes in little-endian order. A short
//! digest is a caller error, not something to paper over by zero-extending.

use crate::error::SketchError;

/// Reads the low 4 bytes of `digest` as a little-endian `u32`.
///
/// # Errors
/// Returns [`SketchError::HashWidthError`] if `digest` has fewer than 4 bytes.
pub fn read_u32(digest: &[u8]) -> Result<u32, SketchError> {
    if digest.len() < 4 {
        return Err(SketchError::HashWidthError {
            expected: 4,
            actual: digest.len(),
        });
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&digest[..4]);
    Ok(u32::from_le_bytes(buf))
}

/// Reads the low 8 bytes of `digest` as a little-endian `u64`.
///
/// # Errors
/// Returns [`SketchError::HashWidthError`] if `digest` has fewer than 8 bytes.
pub fn read_u64(digest: &[u8]) -> Result<u64, SketchError> {
    if digest.len() < 8 {
        return Err(SketchError::HashWidthError {
            expected: 8,
            actual: digest.len(),
        });
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    Ok(u64::from_le_bytes(buf))
}
