//! Hash capabilities for `Dict`.
//!
//! The dictionary takes its hash function as an explicit `S: BuildHasher`
//! parameter. [`DefaultHashBuilder`] is hashbrown's default (aHash)
//! builder; [`IdentityState`] maps integer keys to themselves, which keeps
//! bucket placement predictable (key `n` lands in bucket `n & mask`).

use core::hash::{BuildHasher, Hasher};

pub use hashbrown::hash_map::DefaultHashBuilder;

/// Builder for [`IdentityHasher`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityState;

impl BuildHasher for IdentityState {
    type Hasher = IdentityHasher;

    #[inline]
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

/// Hasher that returns a lone integer unchanged.
///
/// A single integer write on a fresh hasher finishes to that integer.
/// Further writes are folded in, and byte input (strings, slices) goes
/// through FNV-1a, so composite keys still hash deterministically.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher(u64);

impl IdentityHasher {
    #[inline]
    fn fold(&mut self, v: u64) {
        self.0 = self.0.rotate_left(5) ^ v;
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut h = self.0 ^ 0xcbf2_9ce4_8422_2325;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        self.0 = h;
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }
    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }
    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }
    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }
    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }
    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.fold(i as u64);
    }
    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.fold(i as u64);
    }
    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.fold(i as u64);
    }
    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64);
    }
    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.fold(i as u64);
    }
}
