//! Scoped construction into raw memory.
//!
//! Nothing in here may leave a half-built region behind. `InitCursor` tracks how many
//! slots of a region have been written, and destroys exactly those slots if it is
//! dropped before being disarmed, which includes unwinding out of a panicking
//! constructor. `AllocGuard` pairs a cursor with a freshly acquired `RawBlock`, so
//! an abandoned reallocation destroys its constructed prefix and then frees the block.
//!

use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::block::RawBlock;
use crate::error::{BoxError, Result, SequenceError};

/// Count of constructed slots at the start of an uninitialized region.
pub(crate) struct InitCursor<T> {
    start: *mut T,
    constructed: usize,
    _marker: PhantomData<T>,
}

impl<T> InitCursor<T> {
    /// Safety: `start` must point to writable, uninitialized slots that stay
    /// put for the lifetime of the cursor.
    #[inline]
    pub unsafe fn new(start: *mut T) -> InitCursor<T> {
        InitCursor {
            start,
            constructed: 0,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn constructed(&self) -> usize {
        self.constructed
    }

    /// Safety: the slot after the constructed prefix must be in bounds.
    #[inline(always)]
    pub unsafe fn write(&mut self, value: T) {
        trace!("constructing slot {}", self.constructed);
        ptr::write(self.start.add(self.constructed), value);
        self.constructed += 1;
    }

    /// Builds `count` elements from `make(i)`.
    ///
    /// Safety: `count` more slots must be in bounds.
    pub unsafe fn fill_with(&mut self, count: usize, mut make: impl FnMut(usize) -> T) {
        for i in 0..count {
            let value = make(i);
            self.write(value);
        }
    }

    /// Like `fill_with`, but stops at the first constructor error. The slots
    /// built so far stay owned by the cursor and go away with it.
    ///
    /// Safety: `count` more slots must be in bounds.
    pub unsafe fn try_fill_with<E>(&mut self, count: usize, mut make: impl FnMut(usize) -> std::result::Result<T, E>) -> Result<()>
        where E: Into<BoxError>
    {
        let base = self.constructed;
        for i in 0..count {
            match make(i) {
                Ok(value) => self.write(value),
                Err(e) => {
                    trace!("constructor failed at {} of {}", i, count);
                    return Err(SequenceError::Construction {
                        constructed: self.constructed - base,
                        requested: count,
                        source: e.into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Bitwise-moves `count` values in from `src`.
    ///
    /// Safety: `src` must hold `count` initialized values that the caller will
    /// never read or drop again, and must not overlap the target slots.
    #[inline]
    pub unsafe fn relocate_from(&mut self, src: *const T, count: usize) {
        ptr::copy_nonoverlapping(src, self.start.add(self.constructed), count);
        self.constructed += count;
    }

    /// Keeps the constructed prefix alive and returns its length.
    #[inline]
    pub fn disarm(self) -> usize {
        let constructed = self.constructed;
        mem::forget(self);
        constructed
    }
}

impl<T> Drop for InitCursor<T> {
    fn drop(&mut self) {
        if self.constructed == 0 {
            return;
        }
        debug!("rolling back {} constructed elements", self.constructed);
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.constructed));
        }
    }
}

/// Fresh block plus the construction progress inside it.
///
/// The block reaches its new owner only through `release`. Any other exit
/// drops the constructed prefix and then frees the block.
pub struct AllocGuard<T> {
    // field order is drop order: elements die before their memory is freed
    cursor: InitCursor<T>,
    block: RawBlock<T>,
}

impl<T> AllocGuard<T> {
    /// Acquires room for `capacity` elements. Nothing is constructed yet.
    pub fn acquire(capacity: usize) -> Result<AllocGuard<T>> {
        let block = RawBlock::allocate(capacity)?;
        let cursor = unsafe { InitCursor::new(block.as_ptr()) };
        Ok(AllocGuard { cursor, block })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    #[inline(always)]
    pub fn constructed(&self) -> usize {
        self.cursor.constructed()
    }

    #[inline(always)]
    fn remaining(&self) -> usize {
        self.block.capacity() - self.cursor.constructed()
    }

    /// Builds `count` elements from `make(i)`. A panic in `make` unwinds
    /// through the guard and rolls the block back.
    pub fn initialize_with(&mut self, count: usize, make: impl FnMut(usize) -> T) -> usize {
        assert!(count <= self.remaining(), "initialize {} elements into {} free slots", count, self.remaining());
        unsafe { self.cursor.fill_with(count, make) };
        self.cursor.constructed()
    }

    /// Builds `count` elements from a fallible constructor. On error the
    /// guard still owns what was built; dropping it rolls the block back.
    pub fn try_initialize_with<E>(&mut self, count: usize, make: impl FnMut(usize) -> std::result::Result<T, E>) -> Result<usize>
        where E: Into<BoxError>
    {
        assert!(count <= self.remaining(), "initialize {} elements into {} free slots", count, self.remaining());
        unsafe { self.cursor.try_fill_with(count, make)? };
        Ok(self.cursor.constructed())
    }

    /// Clones every element of `items` into the block.
    pub fn clone_from_slice(&mut self, items: &[T]) -> usize where T: Clone {
        self.initialize_with(items.len(), |i| items[i].clone())
    }

    /// Moves `count` elements in from `src` without running any constructor.
    ///
    /// Safety: see `InitCursor::relocate_from`.
    pub unsafe fn relocate_from(&mut self, src: *const T, count: usize) {
        assert!(count <= self.remaining(), "relocate {} elements into {} free slots", count, self.remaining());
        self.cursor.relocate_from(src, count);
    }

    /// Hands the block and its constructed count to the caller, disarming the guard.
    pub fn release(self) -> (RawBlock<T>, usize) {
        let AllocGuard { cursor, block } = self;
        let constructed = cursor.disarm();
        (block, constructed)
    }
}
