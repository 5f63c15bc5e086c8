use core::ops::Deref;
use core::ptr;
use core::ptr::NonNull;
use core::slice;

use allocator_api2::alloc::{Allocator, Global, Layout};

/// A fixed-capacity, manually managed run of elements.
///
/// Elements `[0, len)` are initialised, `[len, capacity)` are not. The
/// capacity is chosen once at construction and never changes: a node sizes
/// its buffer to its order so the one transient overflow element before a
/// split always fits.
pub struct ElementBuf<T> {
    ptr: NonNull<T>,
    capacity: usize,
    len: usize,
}

impl<T> ElementBuf<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let layout = Self::layout(capacity);
        let ptr = match Global.allocate(layout) {
            Ok(ptr) => ptr.cast::<T>(),
            Err(_) => alloc::alloc::handle_alloc_error(layout),
        };

        Self {
            ptr,
            capacity,
            len: 0,
        }
    }

    fn layout(capacity: usize) -> Layout {
        match Layout::array::<T>(capacity) {
            Ok(layout) => layout,
            Err(_) => panic!("element buffer capacity {capacity} overflows the address space"),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `capacity` elements and the first `len` are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Inserts `value` at `idx`, shifting `[idx, len)` one position to the right.
    pub fn insert(&mut self, idx: usize, value: T) {
        assert!(idx <= self.len, "insertion index {idx} out of bounds");
        assert!(!self.is_full(), "element buffer is full");

        let base = self.ptr.as_ptr();
        // SAFETY: idx <= len < capacity, so both `base + idx` and `base + idx + 1` stay
        // within the allocation and the shifted run ends at `len + 1 <= capacity`.
        // `ptr::copy` handles the overlap.
        unsafe {
            ptr::copy(base.add(idx), base.add(idx + 1), self.len - idx);
        }
        // SAFETY: the slot at `idx` was vacated by the shift above.
        unsafe {
            ptr::write(base.add(idx), value);
        }
        self.len += 1;
    }

    pub fn push(&mut self, value: T) {
        assert!(!self.is_full(), "element buffer is full");
        // SAFETY: len < capacity and the slot at `len` is uninitialised.
        unsafe {
            ptr::write(self.ptr.as_ptr().add(self.len), value);
        }
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` is initialised and no longer counted,
        // so ownership moves out exactly once.
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Moves `[at, len)` into a new buffer of the same capacity, leaving `[0, at)` behind.
    pub fn split_off(&mut self, at: usize) -> Self {
        assert!(at <= self.len, "split index {at} out of bounds");

        let mut upper = Self::with_capacity(self.capacity());
        let moved = self.len - at;
        // SAFETY: the source run `[at, len)` is initialised; the destination is a fresh
        // allocation with room for `capacity >= moved` elements, so the ranges are disjoint.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr().add(at), upper.ptr.as_ptr(), moved);
        }
        upper.len = moved;
        self.len = at;

        upper
    }

    /// Drops every element past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: len < self.len <= capacity.
            unsafe { self.ptr.as_ptr().add(len) },
            self.len - len,
        );
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = len;
        // SAFETY: `tail` covers initialised elements that are no longer counted by `len`.
        unsafe {
            ptr::drop_in_place(tail);
        }
    }
}

impl<T> Deref for ElementBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Clone> ElementBuf<T> {
    /// Clones the initialised prefix into a new buffer of the same capacity.
    pub fn clone_buf(&self) -> Self {
        let mut copy = Self::with_capacity(self.capacity());
        // `push` bumps `len` per element, so a panicking `T::clone` leaves `copy`
        // holding only what it owns.
        for value in self.as_slice() {
            copy.push(value.clone());
        }
        copy
    }
}

impl<T> Drop for ElementBuf<T> {
    fn drop(&mut self) {
        // Deallocation must happen even if an element destructor panics.
        struct Dealloc<T> {
            ptr: NonNull<T>,
            layout: Layout,
        }
        impl<T> Drop for Dealloc<T> {
            fn drop(&mut self) {
                // SAFETY: `ptr` was allocated by `Global` with exactly this layout.
                unsafe {
                    Global.deallocate(self.ptr.cast(), self.layout);
                }
            }
        }

        let _guard = Dealloc {
            ptr: self.ptr,
            layout: Self::layout(self.capacity),
        };
        self.truncate(0);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use core::cell::Cell;

    use itertools::assert_equal;

    use super::ElementBuf;

    struct Tracked {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn insert_shifts_tail() {
        let mut buf = ElementBuf::with_capacity(5);
        buf.insert(0, 30);
        buf.insert(0, 10);
        buf.insert(1, 20);
        buf.insert(3, 40);

        assert_equal(buf.iter().copied(), [10, 20, 30, 40]);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.capacity(), 5);
    }

    #[test]
    fn split_off_moves_upper_half() {
        let mut buf = ElementBuf::with_capacity(5);
        for i in 1..=5 {
            buf.push(i.to_string());
        }

        let upper = buf.split_off(3);
        let separator = buf.pop();

        assert_eq!(separator.as_deref(), Some("3"));
        assert_equal(buf.iter().map(String::as_str), ["1", "2"]);
        assert_equal(upper.iter().map(String::as_str), ["4", "5"]);
        assert_eq!(upper.capacity(), 5);
    }

    #[test]
    fn clone_is_independent() {
        let mut buf = ElementBuf::with_capacity(4);
        buf.push(1);
        buf.push(3);

        let mut copy = buf.clone_buf();
        copy.insert(1, 2);

        assert_equal(buf.iter().copied(), [1, 3]);
        assert_equal(copy.iter().copied(), [1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "element buffer is full")]
    fn insert_into_full_buffer_panics() {
        let mut buf = ElementBuf::with_capacity(2);
        buf.push(1);
        buf.push(2);
        buf.insert(0, 0);
    }

    #[test]
    fn every_element_dropped_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut buf = ElementBuf::with_capacity(8);
            for _ in 0..6 {
                buf.push(Tracked {
                    drops: Rc::clone(&drops),
                });
            }
            let upper = buf.split_off(2);
            assert_eq!(drops.get(), 0);

            drop(buf.pop());
            assert_eq!(drops.get(), 1);

            drop(upper);
            assert_eq!(drops.get(), 5);
        }
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn zero_sized_elements() {
        let mut buf = ElementBuf::with_capacity(3);
        buf.push(());
        buf.insert(0, ());
        let upper = buf.split_off(1);
        assert_eq!(buf.len(), 1);
        assert_eq!(upper.len(), 1);
    }
}
