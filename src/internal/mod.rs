//! Internal implementation details.

pub(crate) mod sync;

pub(crate) use sync::{lock, DependencyList, FastMap, Mutex};
