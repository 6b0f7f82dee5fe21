//! Publish-once slots for lazily materialized data.
//!
//! Image-backed rows do not decode their dependent collections when they are created. The first
//! accessor computes the collection from the image into a local candidate, without holding any
//! lock, and then publishes it into a [`LazySlot`]. When two threads race on the first access
//! both compute a candidate, one publish succeeds and the other candidate is dropped. Every
//! caller observes the published value.
//!
//! The materialization function therefore has to be a pure function of the image data.
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::utils::{ItemList, LazySlot};
//!
//! let slot: LazySlot<ItemList<u32>> = LazySlot::empty();
//! assert!(!slot.is_materialized());
//!
//! let first = slot.get_or_materialize(|| Ok(ItemList::new(vec![1, 2, 3])))?;
//! let second = slot.get_or_materialize(|| Ok(ItemList::new(vec![])))?;
//! assert!(std::ptr::eq(first, second));
//! assert_eq!(second.to_vec(), vec![1, 2, 3]);
//! # Ok::<(), dotmodel::Error>(())
//! ```

use std::sync::{OnceLock, RwLock};

use crate::Result;

/// A slot that is filled at most once
pub struct LazySlot<T> {
    cell: OnceLock<T>,
}

impl<T> LazySlot<T> {
    /// An unmaterialized slot
    #[must_use]
    pub const fn empty() -> Self {
        LazySlot {
            cell: OnceLock::new(),
        }
    }

    /// A slot that already holds `value`
    #[must_use]
    pub fn ready(value: T) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        LazySlot { cell }
    }

    /// The published value, if any
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Returns true once a value has been published
    pub fn is_materialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the published value, computing and publishing it first if the slot is empty.
    ///
    /// `materialize` runs outside of any lock and may run concurrently on several threads, only
    /// one of the results is kept.
    ///
    /// # Errors
    /// Returns the error of `materialize`, the slot stays empty in that case
    pub fn get_or_materialize<F>(&self, materialize: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let candidate = materialize()?;
        Ok(self.cell.get_or_init(move || candidate))
    }

    /// Return the published value, publishing `value` first if the slot is empty
    pub fn get_or_insert(&self, value: T) -> &T {
        self.cell.get_or_init(move || value)
    }

    /// Replace the value of the slot, returning the previous one
    pub fn replace(&mut self, value: T) -> Option<T> {
        let previous = self.cell.take();
        self.cell = OnceLock::from(value);
        previous
    }
}

impl<T> Default for LazySlot<T> {
    fn default() -> Self {
        LazySlot::empty()
    }
}

/// A materialized collection that callers may edit
///
/// Structural edits of the same list from several threads are not ordered against each other,
/// callers are expected to serialize them.
pub struct ItemList<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Clone> ItemList<T> {
    /// Create a list holding `items`
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        ItemList {
            items: RwLock::new(items),
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        read_lock!(self.items).len()
    }

    /// Returns true if the list has no items
    pub fn is_empty(&self) -> bool {
        read_lock!(self.items).is_empty()
    }

    /// The item at `index`
    pub fn get(&self, index: usize) -> Option<T> {
        read_lock!(self.items).get(index).cloned()
    }

    /// A snapshot of all items
    pub fn to_vec(&self) -> Vec<T> {
        read_lock!(self.items).clone()
    }

    /// Append `item`
    pub fn push(&self, item: T) {
        write_lock!(self.items).push(item);
    }

    /// Remove and return the item at `index`
    pub fn remove(&self, index: usize) -> Option<T> {
        let mut items = write_lock!(self.items);
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    /// Keep only the items matching `keep`
    pub fn retain<F>(&self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        write_lock!(self.items).retain(keep);
    }

    /// Replace all items, returning the previous ones
    pub fn replace(&self, items: Vec<T>) -> Vec<T> {
        std::mem::replace(&mut *write_lock!(self.items), items)
    }
}

impl<T: Clone> Default for ItemList<T> {
    fn default() -> Self {
        ItemList::new(Vec::new())
    }
}

/// A lazily materialized single value that can be replaced at any time
///
/// Setting the value before the first read skips materialization entirely.
pub struct LazyValue<T> {
    slot: LazySlot<RwLock<T>>,
}

impl<T: Clone> LazyValue<T> {
    /// An unmaterialized value
    #[must_use]
    pub const fn empty() -> Self {
        LazyValue {
            slot: LazySlot::empty(),
        }
    }

    /// A value that is already materialized
    #[must_use]
    pub fn ready(value: T) -> Self {
        LazyValue {
            slot: LazySlot::ready(RwLock::new(value)),
        }
    }

    /// Returns true once the value has been materialized or set
    pub fn is_materialized(&self) -> bool {
        self.slot.is_materialized()
    }

    /// The current value, if materialized
    pub fn get(&self) -> Option<T> {
        self.slot.get().map(|value| read_lock!(value).clone())
    }

    /// The current value, materializing it first if needed
    ///
    /// # Errors
    /// Returns the error of `materialize`
    pub fn get_or_materialize<F>(&self, materialize: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let value = self
            .slot
            .get_or_materialize(|| materialize().map(RwLock::new))?;
        Ok(read_lock!(value).clone())
    }

    /// Replace the value
    pub fn set(&self, value: T) {
        let lock = self.slot.get_or_insert(RwLock::new(value.clone()));
        *write_lock!(lock) = value;
    }
}

impl<T: Clone> Default for LazyValue<T> {
    fn default() -> Self {
        LazyValue::empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    };

    use super::*;

    #[test]
    fn slot_publishes_once() {
        let slot = LazySlot::empty();
        assert!(slot.get().is_none());

        let first = slot.get_or_materialize(|| Ok(vec![1u32])).unwrap();
        let second = slot.get_or_materialize(|| Ok(vec![2u32])).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second, &vec![1]);
        assert!(slot.is_materialized());
    }

    #[test]
    fn slot_error_leaves_empty() {
        let slot: LazySlot<u32> = LazySlot::empty();
        assert!(slot
            .get_or_materialize(|| Err(malformed_error!("broken")))
            .is_err());
        assert!(!slot.is_materialized());
        assert_eq!(*slot.get_or_materialize(|| Ok(5)).unwrap(), 5);
    }

    #[test]
    fn slot_replace() {
        let mut slot = LazySlot::ready(1u32);
        assert_eq!(slot.replace(2), Some(1));
        assert_eq!(slot.get(), Some(&2));

        let mut slot: LazySlot<u32> = LazySlot::empty();
        assert_eq!(slot.replace(3), None);
        assert_eq!(slot.get(), Some(&3));
    }

    #[test]
    fn slot_race() {
        const THREADS: usize = 16;

        let slot: Arc<LazySlot<ItemList<usize>>> = Arc::new(LazySlot::empty());
        let barrier = Arc::new(Barrier::new(THREADS));
        let computed = Arc::new(AtomicUsize::new(0));

        let handles = (0..THREADS)
            .map(|thread| {
                let slot = slot.clone();
                let barrier = barrier.clone();
                let computed = computed.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    let list = slot
                        .get_or_materialize(|| {
                            computed.fetch_add(1, Ordering::SeqCst);
                            Ok(ItemList::new(vec![thread]))
                        })
                        .unwrap();
                    list as *const ItemList<usize> as usize
                })
            })
            .collect::<Vec<_>>();

        let addresses = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        assert!(addresses.iter().all(|address| *address == addresses[0]));
        assert!(computed.load(Ordering::SeqCst) >= 1);
        assert_eq!(slot.get().unwrap().len(), 1);
    }

    #[test]
    fn item_list() {
        let list = ItemList::new(vec![1, 2, 3]);
        list.push(4);
        assert_eq!(list.len(), 4);
        assert_eq!(list.remove(0), Some(1));
        assert_eq!(list.remove(10), None);
        list.retain(|item| *item != 3);
        assert_eq!(list.to_vec(), vec![2, 4]);
        assert_eq!(list.replace(vec![9]), vec![2, 4]);
        assert_eq!(list.get(0), Some(9));
        assert!(!list.is_empty());
    }

    #[test]
    fn lazy_value() {
        let value: LazyValue<Option<u32>> = LazyValue::empty();
        assert_eq!(value.get(), None);
        assert_eq!(value.get_or_materialize(|| Ok(Some(1))).unwrap(), Some(1));
        value.set(None);
        assert_eq!(value.get_or_materialize(|| Ok(Some(7))).unwrap(), None);

        let value: LazyValue<u32> = LazyValue::empty();
        value.set(3);
        assert!(value.is_materialized());
        assert_eq!(value.get_or_materialize(|| Ok(9)).unwrap(), 3);
    }
}
