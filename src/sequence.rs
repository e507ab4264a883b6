use std::alloc::{self, Layout};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{self, ManuallyDrop};
use std::ops::{Bound, Deref, DerefMut, Index, IndexMut, RangeBounds};
use std::ptr;
use std::slice::{self, SliceIndex};

use crate::block::RawBlock;
use crate::error::{BoxError, Result, SequenceError};
use crate::growth;
use crate::guard::{AllocGuard, InitCursor};
use crate::iter::{Cursor, CursorMut, IntoIter, Iter, IterMut};

/// Growable contiguous array.
///
/// The first `len` slots of the block hold live values, the rest are
/// uninitialized. Every operation that changes the capacity builds the new
/// block completely before the old one is touched, so a failed reallocation
/// leaves the sequence exactly as it was.
///
/// Operations that can allocate return `Result` instead of aborting on
/// allocator failure. Trait impls that cannot return an error (`Clone`,
/// `Extend`, `FromIterator`, `From<[T; N]>`) behave like `Vec` and diverge.
pub struct Sequence<T> {
    buf: RawBlock<T>,
    len: usize,
}

impl<T> Sequence<T> {
    /// Creates an empty sequence. Does not allocate.
    #[inline]
    pub const fn new() -> Sequence<T> {
        Sequence {
            buf: RawBlock::empty(),
            len: 0,
        }
    }

    /// Creates an empty sequence with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Sequence<T>> {
        Ok(Sequence {
            buf: RawBlock::allocate(capacity)?,
            len: 0,
        })
    }

    /// Creates a sequence of `len` default values.
    pub fn with_len(len: usize) -> Result<Sequence<T>> where T: Default {
        Sequence::from_fn(len, |_| T::default())
    }

    /// Creates a sequence of `len` clones of `value`.
    pub fn from_elem(value: T, len: usize) -> Result<Sequence<T>> where T: Clone {
        Sequence::from_fn(len, |_| value.clone())
    }

    /// Creates a sequence of `len` elements, element `i` being `make(i)`.
    ///
    /// If `make` panics, the elements built so far are dropped and the block
    /// is freed before the panic leaves this function.
    pub fn from_fn(len: usize, make: impl FnMut(usize) -> T) -> Result<Sequence<T>> {
        let mut guard = AllocGuard::acquire(len)?;
        guard.initialize_with(len, make);
        Ok(Sequence::from_guard(guard))
    }

    /// Like `from_fn` with a fallible constructor. The first error is
    /// returned as `SequenceError::Construction`, after the partial block has
    /// been torn down.
    pub fn try_from_fn<E>(len: usize, make: impl FnMut(usize) -> std::result::Result<T, E>) -> Result<Sequence<T>>
        where E: Into<BoxError>
    {
        let mut guard = AllocGuard::acquire(len)?;
        guard.try_initialize_with(len, make)?;
        Ok(Sequence::from_guard(guard))
    }

    #[doc(hidden)]
    pub fn __from_elem(value: T, len: usize) -> Sequence<T> where T: Clone {
        infallible(Sequence::from_elem(value, len))
    }

    fn from_guard(guard: AllocGuard<T>) -> Sequence<T> {
        let (buf, len) = guard.release();
        Sequence { buf, len }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// Checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        self.as_slice().get(index).ok_or(SequenceError::OutOfRange { index, len: self.len })
    }

    /// Checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice().get_mut(index).ok_or(SequenceError::OutOfRange { index, len })
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Moves the live elements into a new block of `capacity` slots.
    ///
    /// The old block is only released once the new one holds every element.
    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity >= self.len, "reallocate below len");
        let mut guard = AllocGuard::acquire(capacity)?;
        unsafe { guard.relocate_from(self.buf.as_ptr(), self.len) };
        let (block, _) = guard.release();
        debug!("reallocated {} elements, capacity {} -> {}", self.len, self.buf.capacity(), capacity);
        // elements were moved out, so the old block is freed without drops
        drop(mem::replace(&mut self.buf, block));
        Ok(())
    }

    /// Makes room for `additional` more elements using the growth policy.
    fn reserve_for_append(&mut self, additional: usize) -> Result<()> {
        let required = self.len.checked_add(additional).ok_or(SequenceError::CapacityOverflow)?;
        if required > self.buf.capacity() {
            self.reallocate(growth::grow_for_append(self.buf.capacity(), required))?;
        }
        Ok(())
    }

    /// Safety: `len < capacity`.
    #[inline(always)]
    unsafe fn write_next(&mut self, value: T) {
        trace!("appending at {} of capacity {}", self.len, self.buf.capacity());
        ptr::write(self.as_mut_ptr().add(self.len), value);
        self.len += 1;
    }

    /// Appends `value`, growing the block if it is full.
    ///
    /// On allocation failure the sequence is unchanged and `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.reserve_for_append(1)?;
        unsafe { self.write_next(value) };
        Ok(())
    }

    /// Makes room for one more element, then builds it in place with `make`.
    ///
    /// If `make` panics the length is unchanged, though the block may
    /// already have grown.
    pub fn push_with(&mut self, make: impl FnOnce() -> T) -> Result<()> {
        self.reserve_for_append(1)?;
        let value = make();
        unsafe { self.write_next(value) };
        Ok(())
    }

    /// Appends clones of `items`.
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()> where T: Clone {
        self.reserve_for_append(items.len())?;
        for item in items {
            let value = item.clone();
            unsafe { self.write_next(value) };
        }
        Ok(())
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        unsafe { Some(ptr::read(self.as_ptr().add(self.len))) }
    }

    /// Drops the last element. Does nothing on an empty sequence.
    #[inline]
    pub fn pop_back(&mut self) {
        drop(self.pop());
    }

    /// Drops every element past `len`. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(unsafe { self.as_mut_ptr().add(len) }, self.len - len);
        // shorten first, so a panicking drop can not expose dropped slots
        self.len = len;
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drops every element and keeps the block for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes to `count` elements, filling new slots with `T::default()`.
    pub fn resize(&mut self, count: usize) -> Result<()> where T: Default {
        self.resize_with(count, T::default)
    }

    /// Resizes to `count` elements, filling new slots with `make()`.
    ///
    /// Shrinking drops the tail and can not fail. Growing past the capacity
    /// reallocates first. If `make` panics, the new slots built so far are
    /// dropped and the length is unchanged; elements already moved into a
    /// larger block stay there.
    pub fn resize_with(&mut self, count: usize, mut make: impl FnMut() -> T) -> Result<()> {
        let extra = match self.prepare_resize(count)? {
            Some(extra) => extra,
            None => return Ok(()),
        };
        unsafe {
            let mut cursor = InitCursor::new(self.as_mut_ptr().add(self.len));
            cursor.fill_with(extra, |_| make());
            self.len += cursor.disarm();
        }
        Ok(())
    }

    /// Like `resize_with` with a fallible constructor.
    pub fn try_resize_with<E>(&mut self, count: usize, mut make: impl FnMut() -> std::result::Result<T, E>) -> Result<()>
        where E: Into<BoxError>
    {
        let extra = match self.prepare_resize(count)? {
            Some(extra) => extra,
            None => return Ok(()),
        };
        unsafe {
            let mut cursor = InitCursor::new(self.as_mut_ptr().add(self.len));
            cursor.try_fill_with(extra, |_| make())?;
            self.len += cursor.disarm();
        }
        Ok(())
    }

    /// Truncates and returns `None` when `count <= len`, otherwise makes room
    /// for `count` and returns how many trailing slots need building.
    fn prepare_resize(&mut self, count: usize) -> Result<Option<usize>> {
        if count <= self.len {
            self.truncate(count);
            return Ok(None);
        }
        if count > self.buf.capacity() {
            self.reallocate(growth::grow_for_resize(count))?;
        }
        Ok(Some(count - self.len))
    }

    /// Grows the capacity to at least `capacity` elements in total.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.buf.capacity() {
            self.reallocate(capacity)?;
        }
        Ok(())
    }

    /// Reallocates down to exactly `len` slots. An empty sequence gives its
    /// block back entirely.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.buf.capacity() > self.len {
            self.reallocate(self.len)?;
        }
        Ok(())
    }

    /// Removes the element at `index`, shifting everything after it left.
    ///
    /// Returns the index of the element that followed the removed one, which
    /// equals the new length when the last element was removed.
    pub fn erase(&mut self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(SequenceError::OutOfRange { index, len: self.len });
        }
        self.erase_range(index..index + 1)
    }

    /// Removes a contiguous range, keeping the remaining elements in order.
    ///
    /// Costs one move per element after the range. Returns the start of the
    /// range.
    pub fn erase_range(&mut self, range: impl RangeBounds<usize>) -> Result<usize> {
        let (start, end) = self.checked_range(range)?;
        if start == end {
            return Ok(start);
        }
        let tail = self.len - end;
        unsafe {
            let base = self.as_mut_ptr();
            self.len = start;
            let _shift = ShiftTail {
                base,
                from: end,
                to: start,
                count: tail,
                len: &mut self.len,
            };
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), end - start));
        }
        Ok(start)
    }

    fn checked_range(&self, range: impl RangeBounds<usize>) -> Result<(usize, usize)> {
        let len = self.len;
        let start = match range.start_bound() {
            Bound::Included(&start) => Some(start),
            Bound::Excluded(&start) => start.checked_add(1),
            Bound::Unbounded => Some(0),
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.checked_add(1),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => Some(len),
        };
        match (start, end) {
            (Some(start), Some(end)) if start <= end && end <= len => Ok((start, end)),
            // a reversed range reports its end, which lies before the start
            (Some(_), Some(end)) if end <= len => Err(SequenceError::OutOfRange { index: end, len }),
            (None, Some(end)) if end <= len => Err(SequenceError::OutOfRange { index: usize::MAX, len }),
            (_, end) => Err(SequenceError::OutOfRange { index: end.unwrap_or(usize::MAX), len }),
        }
    }

    /// Removes and returns the element at `index` in O(1) by moving the last
    /// element into its slot. Does not preserve order.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let len = self.len;
        if index >= len {
            return Err(SequenceError::OutOfRange { index, len });
        }
        let last = len - 1;
        unsafe {
            let base = self.as_mut_ptr();
            let value = ptr::read(base.add(index));
            if index != last {
                ptr::copy_nonoverlapping(base.add(last), base.add(index), 1);
            }
            self.len = last;
            Ok(value)
        }
    }

    /// Drops every element matching `pred` in a single pass, filling each
    /// hole with an element from the tail. Does not preserve order. Returns
    /// the number of elements removed.
    ///
    /// If `pred` panics, no element is lost, though some may have changed
    /// places.
    pub fn remove_if(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let base = self.as_mut_ptr();
        let mut current = 0;
        let mut last = self.len;
        while current < last {
            if pred(unsafe { &*base.add(current) }) {
                last -= 1;
                if current != last {
                    unsafe { ptr::swap(base.add(current), base.add(last)) };
                }
            } else {
                current += 1;
            }
        }
        let removed = self.len - last;
        trace!("remove_if dropping {} of {} elements", removed, self.len);
        self.truncate(last);
        removed
    }

    /// Exchanges contents with `other`. Never allocates.
    #[inline]
    pub fn swap(&mut self, other: &mut Sequence<T>) {
        mem::swap(self, other);
    }

    /// Moves the contents out, leaving this sequence empty with no block.
    #[inline]
    pub fn take(&mut self) -> Sequence<T> {
        mem::replace(self, Sequence::new())
    }

    /// Deep copy into a block sized exactly to `len`.
    pub fn try_clone(&self) -> Result<Sequence<T>> where T: Clone {
        let mut guard = AllocGuard::acquire(self.len)?;
        guard.clone_from_slice(self.as_slice());
        Ok(Sequence::from_guard(guard))
    }

    /// Replaces the contents with a deep copy of `source`. The copy is built
    /// in full before the current contents are released.
    pub fn try_clone_from(&mut self, source: &Sequence<T>) -> Result<()> where T: Clone {
        let mut fresh = source.try_clone()?;
        self.swap(&mut fresh);
        Ok(())
    }

    /// Replaces the contents with clones of `items`.
    ///
    /// An empty slice clears in place and keeps the block. Otherwise the copy
    /// is built in a fresh block and swapped in, so a failure leaves the
    /// current contents untouched.
    pub fn assign_from_slice(&mut self, items: &[T]) -> Result<()> where T: Clone {
        if items.is_empty() {
            self.clear();
            return Ok(());
        }
        let mut fresh = Sequence::try_from(items)?;
        self.swap(&mut fresh);
        Ok(())
    }

    /// Read-only cursor at the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor::new(self.as_slice(), 0)
    }

    /// Read-only cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(self.as_slice(), self.len)
    }

    #[inline]
    pub fn cbegin(&self) -> Cursor<'_, T> {
        self.begin()
    }

    #[inline]
    pub fn cend(&self) -> Cursor<'_, T> {
        self.end()
    }

    /// Cursor at `index`, which may be `len` for the end position.
    pub fn cursor_at(&self, index: usize) -> Result<Cursor<'_, T>> {
        if index > self.len {
            return Err(SequenceError::OutOfRange { index, len: self.len });
        }
        Ok(Cursor::new(self.as_slice(), index))
    }

    /// Writable cursor at the first element.
    #[inline]
    pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::new(self.as_mut_slice(), 0)
    }

    /// Writable cursor one past the last element.
    #[inline]
    pub fn end_mut(&mut self) -> CursorMut<'_, T> {
        let len = self.len;
        CursorMut::new(self.as_mut_slice(), len)
    }

    pub fn cursor_at_mut(&mut self, index: usize) -> Result<CursorMut<'_, T>> {
        if index > self.len {
            return Err(SequenceError::OutOfRange { index, len: self.len });
        }
        Ok(CursorMut::new(self.as_mut_slice(), index))
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.as_slice())
    }

    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.as_mut_slice())
    }
}

/// Moves the tail of an erased range into place, even if dropping the range
/// panics.
struct ShiftTail<'a, T> {
    base: *mut T,
    from: usize,
    to: usize,
    count: usize,
    len: &'a mut usize,
}

impl<T> Drop for ShiftTail<'_, T> {
    fn drop(&mut self) {
        unsafe { ptr::copy(self.base.add(self.from), self.base.add(self.to), self.count) };
        *self.len = self.to + self.count;
    }
}

/// Unwraps results for trait impls that have no error channel, diverging the
/// way std collections do.
fn infallible<R>(result: Result<R>) -> R {
    match result {
        Ok(value) => value,
        Err(SequenceError::AllocationFailure { bytes, align }) => match Layout::from_size_align(bytes, align) {
            Ok(layout) => alloc::handle_alloc_error(layout),
            Err(_) => panic!("allocation of {} bytes failed", bytes),
        },
        Err(e) => panic!("{}", e),
    }
}

impl<T> Drop for Sequence<T> {
    fn drop(&mut self) {
        trace!("dropping sequence of {} elements, capacity {}", self.len, self.buf.capacity());
        // the block is freed by its own drop, after the elements are gone
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Sequence::new()
    }
}

impl<T: Clone> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.try_clone_from(source))
    }
}

impl<T> Deref for Sequence<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Sequence<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for Sequence<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for Sequence<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>> Index<I> for Sequence<T> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, I: SliceIndex<[T]>> IndexMut<I> for Sequence<T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T> fmt::Debug for Sequence<T> where T: fmt::Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for i in self.iter() {
            list.entry(i);
        }
        list.finish()
    }
}

impl<T, U> PartialEq<Sequence<U>> for Sequence<T> where T: PartialEq<U> {
    fn eq(&self, other: &Sequence<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<[U]> for Sequence<T> where T: PartialEq<U> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for Sequence<T> where T: PartialEq<U> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T: PartialOrd> PartialOrd for Sequence<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        PartialOrd::partial_cmp(self.as_slice(), other.as_slice())
    }
}

impl<T: Ord> Ord for Sequence<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self.as_slice(), other.as_slice())
    }
}

impl<T: Hash> Hash for Sequence<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(self.as_slice(), state)
    }
}

impl<T, const N: usize> From<[T; N]> for Sequence<T> {
    fn from(items: [T; N]) -> Self {
        let mut guard = infallible(AllocGuard::acquire(N));
        let items = ManuallyDrop::new(items);
        unsafe { guard.relocate_from(items.as_ptr(), N) };
        Sequence::from_guard(guard)
    }
}

impl<T: Clone> TryFrom<&[T]> for Sequence<T> {
    type Error = SequenceError;

    fn try_from(items: &[T]) -> Result<Self> {
        let mut guard = AllocGuard::acquire(items.len())?;
        guard.clone_from_slice(items);
        Ok(Sequence::from_guard(guard))
    }
}

impl<T> Extend<T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        infallible(self.reserve_for_append(lower));
        for item in iter {
            infallible(self.push(item));
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sequence = Sequence::new();
        sequence.extend(iter);
        sequence
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let this = ManuallyDrop::new(self);
        // ownership of the block moves to the iterator; `this` is never dropped
        let buf = unsafe { ptr::read(&this.buf) };
        IntoIter::new(buf, this.len)
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Sequence<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
