//! FIFO frontier of entries awaiting processing.

use std::collections::VecDeque;

use crate::types::EntryId;

/// Breadth-first work queue of [`EntryId`]s.
///
/// Seeded by the scanner, drained from the front by the file processor, and
/// grown at the back as containers reveal new dependencies.
///
/// # Examples
///
/// ```
/// use bd_core::{EntryId, Worklist};
///
/// let mut work: Worklist = [EntryId::new(0), EntryId::new(1)].into_iter().collect();
/// work.push(EntryId::new(2));
///
/// assert_eq!(work.pop(), Some(EntryId::new(0)));
/// assert_eq!(work.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklist {
    queue: VecDeque<EntryId>,
}

impl Worklist {
    /// Creates an empty worklist.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the back.
    #[inline]
    pub fn push(&mut self, id: EntryId) {
        self.queue.push_back(id);
    }

    /// Removes the entry at the front.
    #[inline]
    pub fn pop(&mut self) -> Option<EntryId> {
        self.queue.pop_front()
    }

    /// Number of queued entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl FromIterator<EntryId> for Worklist {
    fn from_iter<I: IntoIterator<Item = EntryId>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl Extend<EntryId> for Worklist {
    fn extend<I: IntoIterator<Item = EntryId>>(&mut self, iter: I) {
        self.queue.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut work = Worklist::new();
        assert!(work.is_empty());
        work.extend([EntryId::new(3), EntryId::new(1)]);
        work.push(EntryId::new(2));

        let drained: Vec<_> = std::iter::from_fn(|| work.pop()).map(EntryId::index).collect();
        assert_eq!(drained, vec![3, 1, 2]);
        assert!(work.pop().is_none());
    }
}
