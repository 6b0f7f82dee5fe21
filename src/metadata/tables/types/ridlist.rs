//! Row id lists.
//!
//! A [`RidList`] is the answer to "which rows of table X belong to parent row Y". Most of the
//! time these rows are a consecutive range (fields and methods of a type without indirection
//! tables, children in sorted tables), which only needs a start and a length. When an
//! indirection table (`FieldPtr`, `MethodPtr`) is present, or a child table is not sorted, the
//! rows are scattered and are collected one by one into a [`RandomRidList`].
//!
//! Positional access never fails: an index past the end returns rid 0, which is never a valid
//! row.
//!
//! # Examples
//!
//! ```rust
//! use dotmodel::metadata::tables::{RandomRidList, RidList};
//!
//! let fields = RidList::contiguous(10, 5);
//! assert_eq!(fields.at(0), 10);
//! assert_eq!(fields.at(4), 14);
//! assert_eq!(fields.at(5), 0);
//!
//! let mut methods = RandomRidList::with_capacity(2);
//! methods.append(7);
//! methods.append(3);
//! let methods = RidList::from(methods);
//! assert_eq!(methods.count(), 2);
//! assert_eq!(methods.iter().collect::<Vec<_>>(), vec![7, 3]);
//! ```

/// A consecutive range of rids `[start, start + length)`, immutable after construction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContiguousRidList {
    start: u32,
    length: u32,
}

impl ContiguousRidList {
    /// Create a range of `length` rids starting at `start`
    #[must_use]
    pub const fn new(start: u32, length: u32) -> Self {
        ContiguousRidList { start, length }
    }

    /// The first rid of the range
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of rids in the range
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// The rid at `index`, or 0 if `index` is out of range
    #[must_use]
    pub fn at(&self, index: u32) -> u32 {
        if index >= self.length {
            return 0;
        }

        self.start.wrapping_add(index)
    }
}

/// An explicit, append-only sequence of rids
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomRidList {
    rids: Vec<u32>,
}

impl RandomRidList {
    /// Create an empty list with space for `capacity` rids
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RandomRidList {
            rids: Vec::with_capacity(capacity),
        }
    }

    /// Append `rid` to the end of the list
    pub fn append(&mut self, rid: u32) {
        self.rids.push(rid);
    }

    /// Number of rids in the list
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn length(&self) -> u32 {
        self.rids.len() as u32
    }

    /// The rid at `index`, or 0 if `index` is out of range
    #[must_use]
    pub fn at(&self, index: u32) -> u32 {
        self.rids.get(index as usize).copied().unwrap_or(0)
    }
}

/// The rids of the children of one parent row
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RidList {
    /// Children occupy a consecutive range
    Contiguous(ContiguousRidList),
    /// Children are scattered
    Random(RandomRidList),
}

impl RidList {
    /// The shared empty list (start 0, length 0)
    pub const EMPTY: RidList = RidList::Contiguous(ContiguousRidList::new(0, 0));

    /// Create a contiguous list of `length` rids starting at `start`
    #[must_use]
    pub fn contiguous(start: u32, length: u32) -> Self {
        if length == 0 {
            return RidList::EMPTY;
        }

        RidList::Contiguous(ContiguousRidList::new(start, length))
    }

    /// Create an empty sparse list with room for `capacity` rids
    #[must_use]
    pub fn random_with_capacity(capacity: usize) -> Self {
        RidList::Random(RandomRidList::with_capacity(capacity))
    }

    /// Number of rids in the list
    #[must_use]
    pub fn length(&self) -> u32 {
        match self {
            RidList::Contiguous(list) => list.length(),
            RidList::Random(list) => list.length(),
        }
    }

    /// Number of rids in the list, as a signed value
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn count(&self) -> i32 {
        self.length() as i32
    }

    /// Returns true if the list holds no rids
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// The rid at `index`, or 0 if `index` is out of range
    #[must_use]
    pub fn at(&self, index: u32) -> u32 {
        match self {
            RidList::Contiguous(list) => list.at(index),
            RidList::Random(list) => list.at(index),
        }
    }

    /// The rid at a signed `index`, or 0 if `index` is negative or out of range
    #[must_use]
    pub fn at_signed(&self, index: i32) -> u32 {
        match u32::try_from(index) {
            Ok(index) => self.at(index),
            Err(_) => 0,
        }
    }

    /// Iterate over all rids in order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.length()).map(move |index| self.at(index))
    }
}

impl From<RandomRidList> for RidList {
    fn from(list: RandomRidList) -> Self {
        RidList::Random(list)
    }
}

impl Default for RidList {
    fn default() -> Self {
        RidList::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous() {
        let list = RidList::contiguous(10, 5);

        assert_eq!(list.length(), 5);
        assert_eq!(list.count(), 5);
        for index in 0..5 {
            assert_eq!(list.at(index), 10 + index);
            assert_eq!(list.at_signed(index as i32), 10 + index);
        }
        for index in [5, 6, 1000, u32::MAX] {
            assert_eq!(list.at(index), 0);
        }
        assert_eq!(list.at_signed(-1), 0);
        assert_eq!(list.at_signed(i32::MAX), 0);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn random() {
        let rids = [4, 9, 2, 17];
        let mut random = RandomRidList::with_capacity(rids.len());
        for rid in rids {
            random.append(rid);
        }
        let list = RidList::from(random);

        assert_eq!(list.count(), 4);
        assert_eq!(list.length(), 4);
        for (index, rid) in rids.iter().enumerate() {
            assert_eq!(list.at(index as u32), *rid);
        }
        assert_eq!(list.at(4), 0);
        assert_eq!(list.at_signed(-3), 0);
        assert_eq!(list.iter().collect::<Vec<_>>(), rids.to_vec());
    }

    #[test]
    fn empty() {
        let list = RidList::EMPTY;
        assert!(list.is_empty());
        assert_eq!(list.count(), 0);
        assert_eq!(list.at(0), 0);
        assert_eq!(RidList::contiguous(42, 0), RidList::EMPTY);
        assert_eq!(RidList::default(), RidList::EMPTY);
        assert_eq!(RidList::from(RandomRidList::default()).iter().count(), 0);
    }

    #[test]
    fn five_children_from_rid_ten() {
        let list = RidList::contiguous(10, 5);
        assert_eq!(
            (0..5).map(|index| list.at(index)).collect::<Vec<_>>(),
            vec![10, 11, 12, 13, 14]
        );
        assert_eq!(list.at(5), 0);
    }
}
