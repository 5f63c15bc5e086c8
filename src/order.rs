use core::mem::{align_of, size_of};

use crate::error::{Error, Result};

/// Node sizing for a [`BTreeSet`](crate::BTreeSet).
///
/// The order of a node is the maximum number of children it may have, so a
/// node holds at most `order - 1` elements at rest. Leaves and internal nodes
/// may use different orders: leaves hold the bulk of the elements and benefit
/// from filling a cache-sized buffer, while internal nodes are visited on
/// every lookup and stay small.
///
/// ```
/// use cow_btree::Order;
///
/// let order = Order::new(64)?.with_internal(16)?;
/// assert_eq!(order.leaf(), 64);
/// assert_eq!(order.internal(), 16);
/// # Ok::<(), cow_btree::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Order {
    leaf: usize,
    internal: usize,
}

impl Order {
    /// Smallest order for which splitting an overflowing node leaves both halves non-empty.
    pub const MIN: usize = 3;

    /// Floor applied to orders derived from the cache size.
    pub const MIN_DERIVED: usize = 16;

    /// Cache size assumed when the platform does not report one.
    pub const FALLBACK_CACHE_SIZE: usize = 32 * 1024;

    /// Uses `order` for every node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrderTooSmall`] if `order < Order::MIN`.
    pub const fn new(order: usize) -> Result<Self> {
        if order < Self::MIN {
            return Err(Error::OrderTooSmall {
                order,
                minimum: Self::MIN,
            });
        }
        Ok(Self {
            leaf: order,
            internal: order,
        })
    }

    /// Overrides the order of internal nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrderTooSmall`] if `internal < Order::MIN`.
    pub const fn with_internal(self, internal: usize) -> Result<Self> {
        if internal < Self::MIN {
            return Err(Error::OrderTooSmall {
                order: internal,
                minimum: Self::MIN,
            });
        }
        Ok(Self {
            leaf: self.leaf,
            internal,
        })
    }

    /// Derives an order for elements of type `T` so that a node's buffer fills
    /// about a quarter of an L1 data cache of `cache_size` bytes.
    pub fn for_element<T>(cache_size: Option<usize>) -> Self {
        let cache_size = cache_size.unwrap_or(Self::FALLBACK_CACHE_SIZE);
        let stride = size_of::<T>().max(1);
        let order = (cache_size / (4 * stride)).max(Self::MIN_DERIVED);

        tracing::debug!(
            order,
            cache_size,
            element_size = stride,
            "derived B-tree order from cache size"
        );

        Self {
            leaf: order,
            internal: order,
        }
    }

    /// Largest order whose element buffer, and children of an internal node,
    /// can be laid out for elements of type `T`.
    pub const fn max_for<T>() -> usize {
        let elements = (isize::MAX as usize - (align_of::<T>() - 1)) / max(size_of::<T>(), 1);
        let links = (isize::MAX as usize - (align_of::<usize>() - 1)) / size_of::<usize>() - 1;
        min(elements, links)
    }

    /// Checks that nodes of both orders can be allocated for elements of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrderTooLarge`] naming the larger order if it exceeds
    /// [`Order::max_for::<T>()`](Order::max_for).
    pub const fn check_for<T>(self) -> Result<Self> {
        let order = max(self.leaf, self.internal);
        let maximum = Self::max_for::<T>();
        if order > maximum {
            return Err(Error::OrderTooLarge { order, maximum });
        }
        Ok(self)
    }

    #[inline]
    pub const fn leaf(&self) -> usize {
        self.leaf
    }

    #[inline]
    pub const fn internal(&self) -> usize {
        self.internal
    }
}

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

const fn min(a: usize, b: usize) -> usize {
    if a < b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_tiny_orders() {
        assert_eq!(
            Order::new(2),
            Err(Error::OrderTooSmall {
                order: 2,
                minimum: 3
            })
        );
        assert!(Order::new(3).is_ok());
        assert!(Order::new(5).and_then(|o| o.with_internal(1)).is_err());
    }

    #[test]
    fn derived_order_tracks_cache_and_stride() {
        assert_eq!(Order::for_element::<u64>(Some(32 * 1024)).leaf(), 1024);
        assert_eq!(Order::for_element::<u32>(None).leaf(), 2048);
        assert_eq!(Order::for_element::<[u8; 4096]>(Some(32 * 1024)).leaf(), 16);
        assert_eq!(Order::for_element::<()>(Some(64)).internal(), 16);
    }

    #[test]
    fn rejects_orders_beyond_the_address_space() {
        let huge = Order::new(usize::MAX / 4).unwrap();
        assert_eq!(
            huge.check_for::<u64>(),
            Err(Error::OrderTooLarge {
                order: usize::MAX / 4,
                maximum: Order::max_for::<u64>()
            })
        );
        assert!(huge.check_for::<()>().is_err());

        let mixed = Order::new(64).and_then(|o| o.with_internal(usize::MAX / 2)).unwrap();
        assert!(mixed.check_for::<u8>().is_err());

        let fine = Order::new(1024).unwrap();
        assert_eq!(fine.check_for::<[u8; 4096]>(), Ok(fine));
        assert!(Order::max_for::<()>() < usize::MAX);
    }
}
