//! Sds: growable, length-tracked byte string.
//!
//! Layout: one boxed allocation of `len + avail + 1` bytes. The first `len`
//! bytes are the content, `buf[len]` is always `0` so the content can be
//! handed to NUL-terminated consumers, and the rest is spare capacity.
//! Shrinking (`clear`, `resize` down) only moves `len`; the allocation is
//! replaced only when an append, resize or reserve needs more room.

use crate::error::Error;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{AddAssign, Index, IndexMut};
use std::borrow::Cow;
use std::ffi::{CStr, FromBytesWithNulError};

/// Above this target size growth adds a fixed increment instead of doubling.
pub const MAX_PREALLOC: usize = 1024 * 1024;

/// A mutable byte string with amortized appends and explicit capacity.
pub struct Sds {
    buf: Box<[u8]>,
    len: usize,
}

impl Sds {
    /// Empty string with no spare capacity.
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; 1].into_boxed_slice(),
            len: 0,
        }
    }

    /// Empty string able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity + 1].into_boxed_slice(),
            len: 0,
        }
    }

    /// Copies `bytes` into an exact-fit allocation.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = vec![0u8; bytes.len() + 1];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            buf: buf.into_boxed_slice(),
            len: bytes.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Spare bytes available past the content, terminator excluded.
    #[inline]
    pub fn avail(&self) -> usize {
        self.buf.len() - self.len - 1
    }

    /// Bytes the string can hold before the next reallocation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len() - 1
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }

    /// Content followed by its terminating `0`.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=self.len]
    }

    /// View as a C string; fails if the content holds an interior NUL.
    pub fn as_c_str(&self) -> Result<&CStr, FromBytesWithNulError> {
        CStr::from_bytes_with_nul(self.as_bytes_with_nul())
    }

    pub fn as_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut v = self.buf.into_vec();
        v.truncate(self.len);
        v
    }

    /// Byte at `index`, or `Error::OutOfRange` past the content.
    pub fn get(&self, index: usize) -> Result<u8, Error> {
        self.as_bytes().get(index).copied().ok_or(Error::OutOfRange {
            index,
            len: self.len,
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut u8, Error> {
        let len = self.len;
        self.as_bytes_mut()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Appends `bytes`, growing the allocation only if `avail()` is short.
    pub fn append(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
        let bytes = bytes.as_ref();
        self.grow_for(bytes.len());
        let end = self.len + bytes.len();
        self.buf[self.len..end].copy_from_slice(bytes);
        self.buf[end] = 0;
        self.len = end;
        self
    }

    /// Moves the length boundary to `new_len`.
    ///
    /// Shrinking never reallocates. Growing uses the append growth policy
    /// and exposes zero bytes; callers should still write real content.
    pub fn resize(&mut self, new_len: usize) {
        match new_len.cmp(&self.len) {
            Ordering::Equal => return,
            Ordering::Less => {}
            Ordering::Greater => {
                self.grow_for(new_len - self.len);
                self.buf[self.len..new_len].fill(0);
            }
        }
        self.len = new_len;
        self.buf[new_len] = 0;
    }

    /// Ensures `capacity() >= new_capacity`, reallocating to exactly that
    /// size when it is not already met.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity() {
            return;
        }
        self.realloc(new_capacity + 1);
    }

    /// Empties the string while keeping its allocation.
    pub fn clear(&mut self) {
        self.len = 0;
        self.buf[0] = 0;
    }

    fn grow_for(&mut self, add: usize) {
        if self.avail() >= add {
            return;
        }
        let target = self.len + add + 1;
        let size = if target < MAX_PREALLOC {
            target * 2
        } else {
            target + MAX_PREALLOC
        };
        self.realloc(size);
    }

    // `size` counts the terminator slot and always exceeds `len`.
    fn realloc(&mut self, size: usize) {
        debug_assert!(size > self.len);
        let mut buf = vec![0u8; size].into_boxed_slice();
        buf[..self.len].copy_from_slice(self.as_bytes());
        log::trace!(
            "sds realloc: len={} alloc {} -> {}",
            self.len,
            self.buf.len(),
            size
        );
        self.buf = buf;
    }
}

impl Default for Sds {
    fn default() -> Self {
        Self::new()
    }
}

// Copies keep the spare capacity of the source, like the allocation they mirror.
impl Clone for Sds {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            len: self.len,
        }
    }
}

impl fmt::Debug for Sds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.to_string_lossy(), f)
    }
}

impl fmt::Display for Sds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Write for Sds {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl PartialEq for Sds {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Sds {}

impl PartialOrd for Sds {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sds {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialEq<[u8]> for Sds {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for Sds {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Sds {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

// Must agree with `[u8]` so `Borrow<[u8]>` lookups land in the same bucket.
impl Hash for Sds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl Borrow<[u8]> for Sds {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Sds {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Index<usize> for Sds {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.as_bytes()[index]
    }
}

impl IndexMut<usize> for Sds {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.as_bytes_mut()[index]
    }
}

impl AddAssign<&str> for Sds {
    fn add_assign(&mut self, rhs: &str) {
        self.append(rhs);
    }
}

impl AddAssign<&String> for Sds {
    fn add_assign(&mut self, rhs: &String) {
        self.append(rhs);
    }
}

impl AddAssign<&[u8]> for Sds {
    fn add_assign(&mut self, rhs: &[u8]) {
        self.append(rhs);
    }
}

impl AddAssign<&Sds> for Sds {
    fn add_assign(&mut self, rhs: &Sds) {
        self.append(rhs);
    }
}

impl From<&str> for Sds {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<String> for Sds {
    fn from(s: String) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<&[u8]> for Sds {
    fn from(b: &[u8]) -> Self {
        Self::from_bytes(b)
    }
}

impl From<Vec<u8>> for Sds {
    fn from(mut v: Vec<u8>) -> Self {
        let len = v.len();
        v.push(0);
        Self {
            buf: v.into_boxed_slice(),
            len,
        }
    }
}

impl From<Sds> for Vec<u8> {
    fn from(s: Sds) -> Self {
        s.into_bytes()
    }
}

impl Extend<u8> for Sds {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        let bytes: Vec<u8> = iter.into_iter().collect();
        self.append(bytes);
    }
}

impl<'a> Extend<&'a u8> for Sds {
    fn extend<I: IntoIterator<Item = &'a u8>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl FromIterator<u8> for Sds {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Sds::from(iter.into_iter().collect::<Vec<u8>>())
    }
}
