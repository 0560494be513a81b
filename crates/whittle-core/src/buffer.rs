//! Flat byte buffer holding the program text under reduction.
//!
//! The buffer keeps the program as a plain byte sequence with a sentinel
//! ASCII space guaranteed at each end. Patterns that demand a border
//! character on both sides of a match can then fire at the logical start
//! and end of the file without special-casing the boundary.

use std::fs;
use std::path::Path;

use crate::error::CoreError;

/// Mutable byte buffer with a sentinel space at each end.
///
/// The content between the sentinels is the working program text. Bytes
/// are never interpreted beyond ASCII matching; the buffer is agnostic to
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBuffer {
    bytes: Vec<u8>,
}

impl ProgramBuffer {
    /// Builds a buffer from raw bytes, inserting the sentinel spaces.
    ///
    /// A space is prepended unless the first byte already is one, and
    /// appended unless the last byte already is one.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        if bytes.first() != Some(&b' ') {
            bytes.insert(0, b' ');
        }
        if bytes.last() != Some(&b' ') {
            bytes.push(b' ');
        }
        Self { bytes }
    }

    /// Reads a file into a sentinel-wrapped buffer.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| CoreError::read(path, e))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Writes the full contents, sentinels included.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let path = path.as_ref();
        fs::write(path, &self.bytes).map_err(|e| CoreError::write(path, e))
    }

    /// Total length in bytes, sentinels included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the buffer holds nothing at all.
    ///
    /// A loaded buffer is never empty; the sentinels guarantee at least
    /// one byte.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The byte at `i`, or `None` past the end.
    pub fn at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    /// The bytes in `[i, j)`.
    ///
    /// Panics if the range is out of bounds, like slice indexing does.
    pub fn slice(&self, i: usize, j: usize) -> &[u8] {
        &self.bytes[i..j]
    }

    /// Replaces the bytes in `[i, j)` with `repl` in place.
    ///
    /// Panics if the range is out of bounds.
    pub fn splice(&mut self, i: usize, j: usize, repl: &[u8]) {
        self.bytes.splice(i..j, repl.iter().copied());
    }

    /// Replaces the entire contents, re-normalizing the sentinels.
    pub fn set_contents(&mut self, bytes: impl Into<Vec<u8>>) {
        *self = Self::from_bytes(bytes);
    }

    /// The whole buffer as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// An owned copy of the whole buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}
