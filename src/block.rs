use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::error::{Result, SequenceError};

/// Owned, untyped storage for `capacity` values of `T`.
///
/// The block never constructs or drops elements, it only knows how big it is.
/// Dropping it returns the memory to the global allocator. A block of
/// capacity zero holds a dangling pointer and owns no allocation, and so does
/// a block of zero-sized `T` (whose capacity is bookkeeping only).
pub struct RawBlock<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _owns: PhantomData<T>,
}

unsafe impl<T: Send> Send for RawBlock<T> {}
unsafe impl<T: Sync> Sync for RawBlock<T> {}

impl<T> RawBlock<T> {
    #[inline]
    pub const fn empty() -> RawBlock<T> {
        RawBlock {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Requests room for `capacity` elements from the global allocator.
    pub fn allocate(capacity: usize) -> Result<RawBlock<T>> {
        if capacity == 0 {
            return Ok(RawBlock::empty());
        }
        let layout = Layout::array::<T>(capacity).map_err(|_| SequenceError::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(RawBlock {
                ptr: NonNull::dangling(),
                capacity,
                _owns: PhantomData,
            });
        }

        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(SequenceError::AllocationFailure {
            bytes: layout.size(),
            align: layout.align(),
        })?;
        debug!("allocated block of {} x {} bytes at {:?}", capacity, mem::size_of::<T>(), ptr);

        Ok(RawBlock {
            ptr,
            capacity,
            _owns: PhantomData,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// True if dropping this block hands memory back to the allocator.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.capacity != 0 && mem::size_of::<T>() != 0
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        if !self.is_allocated() {
            return;
        }
        debug!("freeing block of {} x {} bytes at {:?}", self.capacity, mem::size_of::<T>(), self.ptr);
        // the layout was valid when the block was allocated
        unsafe {
            let layout = Layout::array::<T>(self.capacity).unwrap_unchecked();
            alloc::dealloc(self.ptr.as_ptr().cast(), layout);
        }
    }
}
