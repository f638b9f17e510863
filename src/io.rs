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
//! Shared little-endian byte-layout helpers used by every sketch's
//! `dump`/`load` pair.
//!
//! Each sketch owns its own magic tag and field order (see the module-level
//! docs on `MinHash::dump`, `HyperLogLog::dump`, etc.); this module only
//! centralizes the mechanical read/write calls so the byte order and error
//! conversion are consistent across all of them.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::SketchError;

/// Writes a 4-byte magic tag verbatim.
pub(crate) fn write_magic(out: &mut Vec<u8>, magic: &[u8; 4]) {
    out.extend_from_slice(magic);
}

/// Reads and validates a 4-byte magic tag, advancing the cursor.
pub(crate) fn read_magic(
    cursor: &mut Cursor<&[u8]>,
    expected: &[u8; 4],
) -> Result<(), SketchError> {
    let mut got = [0u8; 4];
    cursor
        .read_exact(&mut got)
        .map_err(|_| truncated("magic tag"))?;
    if &got != expected {
        return Err(SketchError::SerializationError {
            reason: format!(
                "bad magic tag: expected {:?}, got {:?}",
                expected, got
            ),
        });
    }
    Ok(())
}

/// Reads a version byte and checks it against the one this build supports.
pub(crate) fn read_version(
    cursor: &mut Cursor<&[u8]>,
    supported: u8,
) -> Result<(), SketchError> {
    let version = cursor.read_u8().map_err(|_| truncated("version"))?;
    if version != supported {
        return Err(SketchError::SerializationError {
            reason: format!(
                "unsupported version: expected {supported}, got {version}"
            ),
        });
    }
    Ok(())
}

pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, SketchError> {
    cursor.read_u8().map_err(|_| truncated(field))
}

pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<u32, SketchError> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated(field))
}

pub(crate) fn read_u64(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<u64, SketchError> {
    cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated(field))
}

pub(crate) fn read_f64(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<f64, SketchError> {
    cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated(field))
}

pub(crate) fn read_exact_vec(
    cursor: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Vec<u8>, SketchError> {
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| truncated(field))?;
    Ok(buf)
}

pub(crate) trait WriteExt {
    fn put_u8(&mut self, value: u8);
    fn put_u32(&mut self, value: u32);
    fn put_u64(&mut self, value: u64);
    fn put_f64(&mut self, value: f64);
}

impl WriteExt for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        WriteBytesExt::write_u8(self, value).expect("writing to a Vec<u8> never fails");
    }
    fn put_u32(&mut self, value: u32) {
        WriteBytesExt::write_u32::<LittleEndian>(self, value)
            .expect("writing to a Vec<u8> never fails");
    }
    fn put_u64(&mut self, value: u64) {
        WriteBytesExt::write_u64::<LittleEndian>(self, value)
            .expect("writing to a Vec<u8> never fails");
    }
    fn put_f64(&mut self, value: f64) {
        WriteBytesExt::write_f64::<LittleEndian>(self, value)
            .expect("writing to a Vec<u8> never fails");
    }
}

fn truncated(field: &'static str) -> SketchError {
    SketchError::SerializationError {
        reason: format!("truncated buffer while reading `{field}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_round_trips() {
        let mut buf = Vec::new();
        write_magic(&mut buf, b"MH01");
        let mut cursor = Cursor::new(buf.as_slice());
        assert!(read_magic(&mut cursor, b"MH01").is_ok());
    }

    #[test]
    fn magic_mismatch_is_rejected() {
        let mut buf = Vec::new();
        write_magic(&mut buf, b"MH01");
        let mut cursor = Cursor::new(buf.as_slice());
        assert!(read_magic(&mut cursor, b"HL01").is_err());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let mut cursor = Cursor::new(&b"MH"[..]);
        assert!(read_magic(&mut cursor, b"MH01").is_err());
    }
}
