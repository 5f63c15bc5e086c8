use core::borrow::Borrow;
use core::fmt;
use core::ops::ControlFlow;

#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::io::Write;

use alloc::rc::Rc;
#[cfg(feature = "std")]
use alloc::vec::Vec;

use crate::cache;
use crate::error::Result;
use crate::order::Order;

mod cursor;
mod iters;
mod node;


pub use cursor::Cursor;
pub use iters::Iter;
use node::{make_unique, Insertion, Node, Splinter};

/// An ordered set backed by a copy-on-write B-tree.
///
/// Sets have value semantics: [`clone`](Clone::clone) is O(1) and shares
/// every node, and an insertion into one copy clones only the nodes on its
/// path that are still shared, so other copies never observe it.
///
/// Each node stores its elements in a single buffer sized to its order. The
/// default order is derived from the L1 data cache size; see [`Order`].
///
/// # Examples
///
/// ```
/// use cow_btree::BTreeSet;
///
/// let mut set = BTreeSet::with_order(4);
/// for i in [5, 1, 4, 2, 3] {
///     set.insert(i);
/// }
///
/// let snapshot = set.clone();
/// assert_eq!(set.insert(6), (true, 6));
/// assert_eq!(set.insert(6), (false, 6));
///
/// assert!(set.contains(&6));
/// assert!(!snapshot.contains(&6));
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6]);
/// ```
pub struct BTreeSet<T> {
    root: Rc<Node<T>>,
    order: Order,
}

impl<T> BTreeSet<T> {
    /// Creates an empty set, sizing nodes for the L1 data cache of this machine.
    pub fn new() -> Self {
        Self::with_cache_size(cache::l1_data_cache_size())
    }

    /// Creates an empty set, sizing nodes for an L1 data cache of `cache_size`
    /// bytes, or for [`Order::FALLBACK_CACHE_SIZE`] when `None`.
    pub fn with_cache_size(cache_size: Option<usize>) -> Self {
        Self::with_config(Order::for_element::<T>(cache_size))
    }

    /// Creates an empty set whose nodes all have the given order.
    ///
    /// # Panics
    ///
    /// Panics if `order < Order::MIN` or if nodes of that order cannot be laid
    /// out for `T`. See [`try_with_order`](Self::try_with_order).
    pub fn with_order(order: usize) -> Self {
        match Self::try_with_order(order) {
            Ok(set) => set,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates an empty set whose nodes all have the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrderTooSmall`](crate::Error::OrderTooSmall) if
    /// `order < Order::MIN`, and [`Error::OrderTooLarge`](crate::Error::OrderTooLarge)
    /// if it exceeds [`Order::max_for::<T>()`](Order::max_for).
    pub fn try_with_order(order: usize) -> Result<Self> {
        Self::try_with_config(Order::new(order)?)
    }

    /// # Panics
    ///
    /// Panics if either order exceeds [`Order::max_for::<T>()`](Order::max_for).
    pub fn with_config(order: Order) -> Self {
        match Self::try_with_config(order) {
            Ok(set) => set,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::OrderTooLarge`](crate::Error::OrderTooLarge) if either
    /// order exceeds [`Order::max_for::<T>()`](Order::max_for).
    pub fn try_with_config(order: Order) -> Result<Self> {
        let order = order.check_for::<T>()?;
        Ok(Self {
            root: Rc::new(Node::new(order.leaf())),
            order,
        })
    }

    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns `true` if the set contains no elements. O(1).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.len() == 0
    }

    /// Returns the number of elements by visiting every node.
    pub fn count(&self) -> usize {
        self.root.count()
    }

    /// Returns the number of levels; a set whose root is a leaf has height 1.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    pub fn first(&self) -> Option<&T> {
        self.root.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.root.last()
    }

    /// Calls `body` on every element in ascending order.
    pub fn for_each<F>(&self, mut body: F)
    where
        F: FnMut(&T),
    {
        let _ = self.root.try_for_each(&mut |element: &T| {
            body(element);
            ControlFlow::<()>::Continue(())
        });
    }

    /// Calls `body` on every element in ascending order, stopping at the
    /// first [`ControlFlow::Break`] and returning it.
    ///
    /// ```
    /// use core::ops::ControlFlow;
    /// use cow_btree::BTreeSet;
    ///
    /// let set: BTreeSet<u32> = (1..=100).collect();
    /// let found = set.try_for_each(|&i| {
    ///     if i * i > 50 { ControlFlow::Break(i) } else { ControlFlow::Continue(()) }
    /// });
    /// assert_eq!(found, ControlFlow::Break(8));
    /// ```
    pub fn try_for_each<B, F>(&self, mut body: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.root.try_for_each(&mut body)
    }

    /// Returns an iterator over the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root)
    }

    /// Returns a cursor at the smallest element, or [`end`](Self::end) if the set is empty.
    pub fn begin(&self) -> Cursor<T> {
        Cursor::start_of(&self.root)
    }

    /// Returns the cursor one past the largest element.
    pub fn end(&self) -> Cursor<T> {
        Cursor::end_of(&self.root)
    }

    /// Returns the element under `cursor`.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is the end cursor, belongs to another set, or was
    /// invalidated by an insertion.
    pub fn element(&self, cursor: &Cursor<T>) -> &T {
        cursor.validate_for(&self.root);
        // SAFETY: the cursor was built from `self.root`, which is alive for the
        // borrow of `self`, and the unchanged mutation counter proves no node
        // reachable from it has been modified since.
        match unsafe { cursor.path().value() } {
            Some(element) => element,
            None => panic!("cannot read the element at the end cursor"),
        }
    }

    /// Moves `cursor` to the next element, or to [`end`](Self::end) after the last.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is already the end cursor, belongs to another set,
    /// or was invalidated by an insertion.
    pub fn advance(&self, cursor: &mut Cursor<T>) {
        cursor.validate_for(&self.root);
        // SAFETY: as in `element`.
        unsafe { cursor.path_mut().form_successor() };
    }

    /// Moves `cursor` to the previous element.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is at the first element, belongs to another set, or
    /// was invalidated by an insertion.
    pub fn retreat(&self, cursor: &mut Cursor<T>) {
        cursor.validate_for(&self.root);
        // SAFETY: as in `element`.
        unsafe { cursor.path_mut().form_predecessor() };
    }

    /// Returns a cursor at the element after `cursor`. See [`advance`](Self::advance).
    pub fn successor(&self, cursor: &Cursor<T>) -> Cursor<T> {
        let mut next = cursor.clone();
        self.advance(&mut next);
        next
    }

    /// Returns a cursor at the element before `cursor`. See [`retreat`](Self::retreat).
    pub fn predecessor(&self, cursor: &Cursor<T>) -> Cursor<T> {
        let mut previous = cursor.clone();
        self.retreat(&mut previous);
        previous
    }
}

impl<T: Ord> BTreeSet<T> {
    /// Returns `true` if the set contains an element equal to `element`.
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.contains(element)
    }

    /// Returns the stored element equal to `element`, if any.
    pub fn get<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.get(element)
    }

    /// Checks every structural invariant of the tree.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found: unordered or
    /// duplicate elements, a node outside its size bounds, a wrong number of
    /// children, or leaves at different depths.
    pub fn validate(&self) {
        self.root.validate(0, None, None);
    }
}

impl<T: Ord + Clone> BTreeSet<T> {
    /// Adds `element` to the set.
    ///
    /// Returns `(true, element)` if it was not present. Otherwise the set is
    /// left unchanged and `(false, existing)` is returned, `existing` being a
    /// copy of the element already stored.
    ///
    /// Adding an element invalidates every cursor previously obtained from
    /// this set. Finding a duplicate touches no node, so cursors stay valid
    /// and a root shared with a copy is not cloned.
    pub fn insert(&mut self, element: T) -> (bool, T) {
        match self.insert_inner(element.clone()) {
            None => (true, element),
            Some(existing) => (false, existing),
        }
    }

    fn insert_inner(&mut self, element: T) -> Option<T> {
        if let Some(existing) = self.root.get(&element) {
            return Some(existing.clone());
        }

        match make_unique(&mut self.root).insert(element) {
            Insertion::Existing(existing) => Some(existing),
            Insertion::Inserted(None) => None,
            Insertion::Inserted(Some(splinter)) => {
                self.grow(splinter);
                None
            }
        }
    }

    /// Puts a new root above the current one, adding a level to the tree.
    fn grow(&mut self, splinter: Splinter<T>) {
        let trunk = Rc::clone(&self.root);
        self.root = Rc::new(Node::with_root(self.order.internal(), trunk, splinter));
        tracing::debug!(height = self.root.height(), "B-tree grew a level");
    }
}

#[cfg(feature = "std")]
impl<T: fmt::Debug> BTreeSet<T> {
    /// Renders the tree as a graphviz digraph, one record per node labelled
    /// with its mutation counter and elements.
    ///
    /// # Errors
    ///
    /// Returns `Err` if writing the output fails.
    pub fn to_dot(&self) -> Result<String, Box<dyn Error>> {
        let mut data = Vec::default();

        data.write_all(b"digraph G {\n")?;
        self.root.to_dot(&mut data)?;
        data.write_all(b"}\n")?;

        Ok(String::from_utf8(data)?)
    }
}

impl<T> Clone for BTreeSet<T> {
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            order: self.order,
        }
    }
}

impl<T> Default for BTreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for BTreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for BTreeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.root, &other.root) || self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for BTreeSet<T> {}

impl<T: Ord + Clone> FromIterator<T> for BTreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord + Clone> Extend<T> for BTreeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert_inner(element);
        }
    }
}

impl<'a, T> IntoIterator for &'a BTreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
