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
//! Error types returned by sketch constructors and operations.

use thiserror::Error;

/// Errors returned by sketch constructors, digests, merges, and serialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Returned when a constructor receives an out-of-range argument.
    #[error("invalid parameter `{param}`: {reason}")]
    ParameterError {
        /// Name of the offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// Returned when combining or comparing two sketches whose parameters
    /// (`num_perm`, `seed`, `p`, or `b`) do not match.
    #[error("incompatible sketches: {reason}")]
    IncompatibleSketchError {
        /// Reason the sketches cannot be combined or compared.
        reason: &'static str,
    },

    /// Returned when a `digest` call receives fewer bytes than the sketch's
    /// hash width requires. The sketch never zero-extends a short buffer.
    #[error("hash digest too short: need {expected} bytes, got {actual}")]
    HashWidthError {
        /// Number of low-order bytes the sketch needs.
        expected: usize,
        /// Number of bytes actually supplied.
        actual: usize,
    },

    /// Returned by `MinHashLsh::insert` when the key already exists. The
    /// index is insert-only: it never silently replaces an entry.
    #[error("key already present in LSH index")]
    DuplicateKeyError,

    /// Returned when a serialized buffer has a bad magic tag, an
    /// unsupported version, or is truncated.
    #[error("serialization error: {reason}")]
    SerializationError {
        /// Description of the malformed input.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::SketchError;

    #[test]
    fn errors_are_cloneable_and_comparable() {
        let a = SketchError::DuplicateKeyError;
        let b = SketchError::DuplicateKeyError;
        assert_eq!(a, b);
        assert_eq!(a.clone(), b);
    }

    #[test]
    fn display_messages_mention_the_field_values() {
        let err = SketchError::HashWidthError {
            expected: 8,
            actual: 3,
        };
        let message = err.to_string();
        assert!(message.contains('8'));
        assert!(message.contains('3'));
    }
}
