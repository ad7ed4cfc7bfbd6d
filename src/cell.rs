//! Move-only, type-erased value cell.
//!
//! [`DynamicCell`] stores exactly one value of a type chosen at construction
//! time, without requiring a common base trait beyond [`Any`] and without a
//! heap allocation for small payloads. It is the storage primitive behind both
//! the descriptor registry and the instance caches.

use std::any::{Any, TypeId};
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ptr;

/// Size of the inline buffer in bytes.
pub const INLINE_CAPACITY: usize = 32;

/// Alignment guaranteed by the inline buffer.
pub const INLINE_ALIGN: usize = mem::align_of::<InlineBuffer>();

#[repr(C, align(16))]
struct InlineBuffer([MaybeUninit<u8>; INLINE_CAPACITY]);

impl InlineBuffer {
    #[inline(always)]
    fn uninit() -> Self {
        InlineBuffer([MaybeUninit::uninit(); INLINE_CAPACITY])
    }

    #[inline(always)]
    fn as_ptr<T>(&self) -> *const T {
        self.0.as_ptr().cast::<T>()
    }

    #[inline(always)]
    fn as_mut_ptr<T>(&mut self) -> *mut T {
        self.0.as_mut_ptr().cast::<T>()
    }
}

/// Storage strategy selected for the value held by a [`DynamicCell`].
///
/// # Examples
///
/// ```rust
/// use cellar_di::{CellStrategy, DynamicCell};
///
/// assert_eq!(DynamicCell::new(7u32).strategy(), CellStrategy::Trivial);
/// assert_eq!(DynamicCell::new(String::from("x")).strategy(), CellStrategy::Small);
/// assert_eq!(DynamicCell::new([0u64; 16]).strategy(), CellStrategy::Large);
/// assert_eq!(DynamicCell::empty().strategy(), CellStrategy::Empty);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStrategy {
    /// No value is held
    Empty,
    /// Inline, no drop glue
    Trivial,
    /// Inline, with a recorded drop function
    Small,
    /// Heap allocated
    Large,
}

enum Storage {
    Empty,
    Trivial(InlineBuffer),
    Small {
        buffer: InlineBuffer,
        drop_fn: unsafe fn(*mut u8),
    },
    Large(Box<dyn Any + Send + Sync>),
}

/// Drops a `T` living at `data`.
///
/// # Safety
///
/// `data` must point to a live, properly aligned `T` that is not used afterwards.
unsafe fn drop_inline<T>(data: *mut u8) {
    ptr::drop_in_place(data.cast::<T>());
}

#[inline(always)]
const fn fits_inline<T>() -> bool {
    mem::size_of::<T>() <= INLINE_CAPACITY && mem::align_of::<T>() <= INLINE_ALIGN
}

/// A move-only holder for one value of an unknown-at-compile-time type.
///
/// The strategy is picked from the value's type when it is stored:
///
/// - **Trivial**: no drop glue and fits the 32-byte inline buffer
/// - **Small**: fits inline but needs dropping; the drop function is recorded
/// - **Large**: boxed on the heap
///
/// A cell is never `Clone`. Moving it moves the held value; [`take_cell`](Self::take_cell)
/// moves the value into a new cell and leaves the source empty. Typed access is
/// checked against the stored [`TypeId`] and never panics on mismatch.
///
/// # Examples
///
/// ```rust
/// use cellar_di::DynamicCell;
///
/// let mut cell = DynamicCell::new(String::from("hello"));
/// assert_eq!(cell.cast::<String>().map(String::as_str), Some("hello"));
/// assert!(cell.cast::<u32>().is_none());
///
/// let mut moved = cell.take_cell();
/// assert!(cell.is_empty());
/// assert_eq!(moved.take::<String>().as_deref(), Some("hello"));
/// assert!(moved.is_empty());
/// ```
pub struct DynamicCell {
    type_id: Option<TypeId>,
    type_name: &'static str,
    storage: Storage,
}

impl DynamicCell {
    /// Creates an empty cell.
    pub const fn empty() -> Self {
        Self {
            type_id: None,
            type_name: "()",
            storage: Storage::Empty,
        }
    }

    /// Creates a cell holding `value`.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        let mut cell = Self::empty();
        cell.store(value);
        cell
    }

    /// Destroys the current value (if any) and stores `value`.
    pub fn emplace<T: Send + Sync + 'static>(&mut self, value: T) -> &mut T {
        self.reset();
        self.store(value);
        match self.cast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("freshly stored value has the stored type"),
        }
    }

    fn store<T: Send + Sync + 'static>(&mut self, value: T) {
        debug_assert!(self.is_empty());

        self.storage = if fits_inline::<T>() {
            let mut buffer = InlineBuffer::uninit();
            // SAFETY: the buffer is large enough and aligned for `T` (checked by `fits_inline`).
            unsafe { ptr::write(buffer.as_mut_ptr::<T>(), value) };
            if mem::needs_drop::<T>() {
                Storage::Small {
                    buffer,
                    drop_fn: drop_inline::<T>,
                }
            } else {
                Storage::Trivial(buffer)
            }
        } else {
            Storage::Large(Box::new(value))
        };
        self.type_id = Some(TypeId::of::<T>());
        self.type_name = std::any::type_name::<T>();
    }

    /// Destroys the held value and returns the cell to the empty state.
    pub fn reset(&mut self) {
        match mem::replace(&mut self.storage, Storage::Empty) {
            Storage::Small { mut buffer, drop_fn } => {
                // SAFETY: `drop_fn` was recorded for the exact type written into `buffer`,
                // and the buffer is no longer reachable through `self`.
                unsafe { drop_fn(buffer.as_mut_ptr::<u8>()) };
            }
            Storage::Large(boxed) => drop(boxed),
            Storage::Trivial(_) | Storage::Empty => {}
        }
        self.type_id = None;
        self.type_name = "()";
    }

    /// Returns `true` if the cell holds a value of type `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    /// Returns a reference to the held value if it is a `T`.
    #[inline]
    pub fn cast<T: 'static>(&self) -> Option<&T> {
        if !self.is::<T>() {
            return None;
        }
        match &self.storage {
            // SAFETY: the type check above guarantees the buffer holds a live `T`.
            Storage::Trivial(buffer) | Storage::Small { buffer, .. } => {
                Some(unsafe { &*buffer.as_ptr::<T>() })
            }
            Storage::Large(boxed) => boxed.downcast_ref::<T>(),
            Storage::Empty => None,
        }
    }

    /// Returns a mutable reference to the held value if it is a `T`.
    #[inline]
    pub fn cast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.is::<T>() {
            return None;
        }
        match &mut self.storage {
            // SAFETY: the type check above guarantees the buffer holds a live `T`.
            Storage::Trivial(buffer) | Storage::Small { buffer, .. } => {
                Some(unsafe { &mut *buffer.as_mut_ptr::<T>() })
            }
            Storage::Large(boxed) => boxed.downcast_mut::<T>(),
            Storage::Empty => None,
        }
    }

    /// Moves the held value out if it is a `T`, leaving the cell empty.
    ///
    /// On a type mismatch the cell is left untouched and `None` is returned.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        if !self.is::<T>() {
            return None;
        }
        let value = match mem::replace(&mut self.storage, Storage::Empty) {
            // SAFETY: the buffer holds a live `T`; ownership moves out and the
            // recorded drop function is discarded without being called.
            Storage::Trivial(buffer) | Storage::Small { buffer, .. } => unsafe {
                ptr::read(buffer.as_ptr::<T>())
            },
            Storage::Large(boxed) => match boxed.downcast::<T>() {
                Ok(value) => *value,
                Err(_) => unreachable!("type id matched but downcast failed"),
            },
            Storage::Empty => return None,
        };
        self.type_id = None;
        self.type_name = "()";
        Some(value)
    }

    /// Consumes the cell, returning the held `T` or the unchanged cell on mismatch.
    pub fn into_inner<T: 'static>(mut self) -> Result<T, Self> {
        match self.take::<T>() {
            Some(value) => Ok(value),
            None => Err(self),
        }
    }

    /// Moves the held value into a new cell and leaves `self` empty.
    pub fn take_cell(&mut self) -> DynamicCell {
        mem::take(self)
    }

    /// Swaps the contents of two cells.
    pub fn swap(&mut self, other: &mut DynamicCell) {
        mem::swap(self, other);
    }

    /// Returns `true` if no value is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.storage, Storage::Empty)
    }

    /// Type identity of the held value, or `None` when empty.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Type name of the held value; `"()"` when empty.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Storage strategy currently in use.
    pub fn strategy(&self) -> CellStrategy {
        match self.storage {
            Storage::Empty => CellStrategy::Empty,
            Storage::Trivial(_) => CellStrategy::Trivial,
            Storage::Small { .. } => CellStrategy::Small,
            Storage::Large(_) => CellStrategy::Large,
        }
    }
}

impl Default for DynamicCell {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for DynamicCell {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for DynamicCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicCell")
            .field("type_name", &self.type_name)
            .field("strategy", &self.strategy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn strategy_follows_type_shape() {
        assert_eq!(DynamicCell::new(1u8).strategy(), CellStrategy::Trivial);
        assert_eq!(DynamicCell::new(()).strategy(), CellStrategy::Trivial);
        assert_eq!(DynamicCell::new([0u8; INLINE_CAPACITY]).strategy(), CellStrategy::Trivial);
        assert_eq!(DynamicCell::new([0u8; INLINE_CAPACITY + 1]).strategy(), CellStrategy::Large);
        assert_eq!(DynamicCell::new(vec![1, 2, 3]).strategy(), CellStrategy::Small);
        assert_eq!(DynamicCell::new(Arc::new(5)).strategy(), CellStrategy::Small);

        #[repr(align(32))]
        struct OverAligned(#[allow(dead_code)] u8);
        assert_eq!(DynamicCell::new(OverAligned(1)).strategy(), CellStrategy::Large);
    }

    #[test]
    fn cast_checks_type_identity() {
        let cell = DynamicCell::new(42u64);
        assert_eq!(cell.cast::<u64>(), Some(&42));
        assert!(cell.cast::<i64>().is_none());
        assert!(cell.cast::<u32>().is_none());
        assert_eq!(cell.type_id(), Some(TypeId::of::<u64>()));
        assert_eq!(cell.type_name(), "u64");
    }

    #[test]
    fn empty_cell_reports_unit_type() {
        let cell = DynamicCell::default();
        assert!(cell.is_empty());
        assert_eq!(cell.type_id(), None);
        assert_eq!(cell.type_name(), "()");
        assert!(cell.cast::<()>().is_none());
    }

    #[test]
    fn cast_mut_writes_through_every_strategy() {
        let mut trivial = DynamicCell::new(1u32);
        *trivial.cast_mut::<u32>().unwrap() = 2;
        assert_eq!(trivial.cast::<u32>(), Some(&2));

        let mut small = DynamicCell::new(String::from("a"));
        small.cast_mut::<String>().unwrap().push('b');
        assert_eq!(small.cast::<String>().unwrap(), "ab");

        let mut large = DynamicCell::new([1u64; 8]);
        large.cast_mut::<[u64; 8]>().unwrap()[0] = 9;
        assert_eq!(large.cast::<[u64; 8]>().unwrap()[0], 9);
    }

    #[test]
    fn small_values_are_dropped_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let cell = DynamicCell::new(DropCounter(drops.clone()));
            assert_eq!(cell.strategy(), CellStrategy::Small);
            let moved = cell;
            let _moved_again = moved;
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn large_values_are_dropped_exactly_once() {
        struct Big {
            _pad: [u64; 8],
            _counter: DropCounter,
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let mut cell = DynamicCell::new(Big {
            _pad: [0; 8],
            _counter: DropCounter(drops.clone()),
        });
        assert_eq!(cell.strategy(), CellStrategy::Large);
        cell.reset();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        drop(cell);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_moves_out_without_dropping() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut cell = DynamicCell::new(DropCounter(drops.clone()));

        assert!(cell.take::<u32>().is_none());
        assert!(!cell.is_empty());

        let value = cell.take::<DropCounter>().expect("type matches");
        assert!(cell.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(value);
        drop(cell);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_cell_leaves_source_empty() {
        let mut source = DynamicCell::new(vec![1, 2, 3]);
        let target = source.take_cell();
        assert!(source.is_empty());
        assert_eq!(target.cast::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn emplace_replaces_previous_value() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut cell = DynamicCell::new(DropCounter(drops.clone()));
        *cell.emplace(10i32) += 1;
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(cell.cast::<i32>(), Some(&11));
        assert_eq!(cell.strategy(), CellStrategy::Trivial);
    }

    #[test]
    fn into_inner_returns_cell_on_mismatch() {
        let cell = DynamicCell::new(3.5f64);
        let cell = cell.into_inner::<f32>().unwrap_err();
        assert_eq!(cell.into_inner::<f64>().ok(), Some(3.5));
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = DynamicCell::new(1u8);
        let mut b = DynamicCell::new(String::from("b"));
        a.swap(&mut b);
        assert_eq!(a.cast::<String>().map(String::as_str), Some("b"));
        assert_eq!(b.cast::<u8>(), Some(&1));
    }

    #[test]
    fn cell_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DynamicCell>();
    }
}
