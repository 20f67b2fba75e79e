//! kvdict: an incrementally rehashed chained dictionary and the growable
//! byte string it usually stores.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) amortized insert/lookup/delete for an in-memory key/value
//!   engine, without ever stalling on a whole-table reallocation.
//! - Pieces:
//!   - `Sds`: length-tracked byte buffer with spare capacity and a NUL
//!     slot after the content. Small buffers double on growth, large ones
//!     grow by a fixed `MAX_PREALLOC` step.
//!   - `Dict<K, V, S>`: array of singly linked collision chains over a
//!     generational arena, with a second table that exists only during a
//!     rehash cycle.
//!   - `Iter` / `SafeIter`: cursors over both tables in bucket order.
//!
//! Rehashing
//! - An insert that sees `len >= table_size * resize_ratio` while no cycle
//!   is active swaps in a table of twice the size; the old one becomes the
//!   rehash source with a cursor at bucket 0.
//! - `insert`, `find_mut` and `remove` each migrate one batch of
//!   `max(1, source_size / 10)` buckets before doing their own work. There
//!   is no background driver: traffic pays for progress.
//! - New keys always go into the primary (new) table, so the source only
//!   ever drains. Lookups check the primary table, then the source.
//! - Resize requests during a cycle are declined. Tables never shrink
//!   except through `clear`, which also cancels the cycle.
//!
//! Ownership
//! - Each bucket owns the head of its chain and each entry owns its `next`
//!   link, as arena keys. Migration relinks keys; nothing is copied or
//!   reference-counted.
//! - Entries keep their `u64` hash, so migration never calls `K: Hash`.
//!
//! Reentrancy policy
//! - Public `Dict` operations mark the dictionary busy while they may run
//!   `K: Hash`/`K: Eq`. Nested entry from that user code panics in debug
//!   builds and costs nothing in release builds.
//!
//! Errors
//! - Out-of-range byte access and advancing an exhausted cursor return
//!   [`Error`]. Missing keys and replaced values are ordinary `Option`/`bool`
//!   results. Allocation failure aborts, as it does for `Vec`.
//!
//! Notes and non-goals
//! - Single-threaded: `Dict` is `!Sync`; no locks or atomics.
//! - Iterators borrow the dictionary, so `clear` or a table swap can never
//!   happen under a live cursor.
//! - No persistence, wire format or command layer.

pub mod dict;
mod dict_proptest;
pub mod error;
mod guard;
pub mod hash;
pub mod iter;
pub mod sds;

// Public surface
pub use dict::{Dict, DictConfig};
pub use error::Error;
pub use hash::{DefaultHashBuilder, IdentityState};
pub use iter::{Iter, SafeIter};
pub use sds::{Sds, MAX_PREALLOC};
