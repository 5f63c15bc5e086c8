/// Errors returned when configuring a [`BTreeSet`](crate::BTreeSet).
///
/// Everything past construction either succeeds or panics: misusing a cursor
/// or finding a broken invariant is a bug in the caller or in this crate, not
/// a condition to recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested order cannot keep both halves of a split non-empty.
    #[error("order {order} is too small: a B-tree node needs an order of at least {minimum}")]
    OrderTooSmall { order: usize, minimum: usize },
    /// Node buffers of the requested order would not fit in the address space.
    #[error("order {order} is too large: nodes of this element type allow an order of at most {maximum}")]
    OrderTooLarge { order: usize, maximum: usize },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
