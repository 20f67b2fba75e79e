//! Recoverable failure conditions.

use core::fmt;

/// Out-of-range access on an [`Sds`](crate::Sds) or an exhausted iterator.
///
/// Missing keys and duplicate inserts are not errors; those report through
/// `bool`/`Option` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A byte position at or past the logical length was addressed.
    OutOfRange { index: usize, len: usize },
    /// An iterator was advanced after its last entry.
    IteratorExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Error::IteratorExhausted => f.write_str("iterator advanced past its last entry"),
        }
    }
}

impl std::error::Error for Error {}
