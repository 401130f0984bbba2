//! Deferred-work queue: bounded list of window offsets for the slow path.
//!
//! # Invariants
//! - `len <= slots.len()` at all times.
//! - Offsets in `0..len` are strictly increasing.
//!
//! The storage is supplied by the caller and never reallocated, so the scan
//! loop stays allocation-free. The scanner only appends; draining is the
//! caller's job ([`DeferredQueue::clear`]).

/// Fixed-capacity queue of deferred window offsets, backed by caller storage.
#[derive(Debug)]
pub struct DeferredQueue<'a> {
    slots: &'a mut [usize],
    len: usize,
}

impl<'a> DeferredQueue<'a> {
    /// Create an empty queue whose capacity is `slots.len()`.
    pub fn new(slots: &'a mut [usize]) -> Self {
        Self { slots, len: 0 }
    }

    /// Wrap storage whose first `len` entries are already queued.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the storage or the entries are not strictly
    /// increasing.
    pub fn with_len(slots: &'a mut [usize], len: usize) -> Self {
        assert!(len <= slots.len(), "DeferredQueue length exceeds capacity");
        assert!(
            slots[..len].windows(2).all(|w| w[0] < w[1]),
            "DeferredQueue entries must be strictly increasing"
        );
        Self { slots, len }
    }

    /// Append a window offset.
    ///
    /// Returns `false` without modifying the queue if it is full or if
    /// `offset` does not follow the last entry.
    #[inline]
    pub fn push(&mut self, offset: usize) -> bool {
        if self.is_full() {
            return false;
        }
        if let Some(&last) = self.last() {
            if offset <= last {
                return false;
            }
        }
        self.slots[self.len] = offset;
        self.len += 1;
        true
    }

    /// Number of queued offsets.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of offsets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Remaining free slots.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.slots.len() - self.len
    }

    /// True if no more offsets can be queued.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Most recently queued offset.
    #[inline]
    pub fn last(&self) -> Option<&usize> {
        self.as_slice().last()
    }

    /// Queued offsets in increasing order.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.slots[..self.len]
    }

    /// Iterate over queued offsets.
    pub fn iter(&self) -> core::slice::Iter<'_, usize> {
        self.as_slice().iter()
    }

    /// Drop all entries, keeping the storage.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<'q> IntoIterator for &'q DeferredQueue<'_> {
    type Item = &'q usize;
    type IntoIter = core::slice::Iter<'q, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
