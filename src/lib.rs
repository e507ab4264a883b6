//! A growable, contiguous array whose every capacity change is built in a
//! fresh block first, so a failed allocation or a panicking constructor never
//! leaves a sequence half-updated.

#[macro_use]
mod logging;
mod block;
mod error;
mod growth;
mod guard;
mod iter;
mod macros;
mod sequence;
mod traits;

pub use block::RawBlock;
pub use error::{BoxError, Result, SequenceError};
pub use growth::next_capacity;
pub use guard::AllocGuard;
pub use iter::{Cursor, CursorMut, IntoIter, Iter, IterMut};
pub use sequence::Sequence;
pub use traits::SequenceIterator;

#[cfg(test)]
pub mod dropflag;
