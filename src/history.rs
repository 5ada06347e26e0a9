// history.rs

use tracing::trace;

/// Bounded log of submitted lines, kept as the raw bytes that were read.
///
/// Entries sit in a ring of at most `capacity` slots that grows as lines
/// arrive. `total` counts every line ever recorded, so the displayed index of
/// the oldest retained entry is `total - capacity` once the ring has wrapped,
/// and indices are never reused.
pub struct HistoryStore {
    slots: Vec<Vec<u8>>,
    capacity: usize,
    head: usize,
    total: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity: capacity.max(1),
            head: 0,
            total: 0,
        }
    }

    pub fn record<L: AsRef<[u8]>>(&mut self, line: L) {
        let line = line.as_ref().to_vec();
        if self.slots.len() < self.capacity {
            self.slots.push(line);
        } else {
            let evicted = std::mem::replace(&mut self.slots[self.head], line);
            trace!(
                index = self.start(),
                line = %String::from_utf8_lossy(&evicted),
                "evicting history entry"
            );
            self.head = (self.head + 1) % self.capacity;
        }
        self.total += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of lines ever recorded, evicted ones included.
    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Displayed index of the oldest retained entry.
    pub fn start(&self) -> usize {
        self.total.saturating_sub(self.capacity)
    }

    fn at(&self, pos: usize) -> &[u8] {
        &self.slots[(self.head + pos) % self.slots.len()]
    }

    /// Retained entries, oldest first, paired with their displayed index.
    /// Call `.rev()` for the newest-first listing.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (usize, &[u8])> + '_ {
        let start = self.start();
        (0..self.len()).map(move |pos| (start + pos, self.at(pos)))
    }

    pub fn lookup(&self, index: usize) -> Option<&[u8]> {
        let pos = index.checked_sub(self.start())?;
        (pos < self.len()).then(|| self.at(pos))
    }

    pub fn last(&self) -> Option<&[u8]> {
        if self.is_empty() {
            return None;
        }
        Some(self.at(self.len() - 1))
    }
}
