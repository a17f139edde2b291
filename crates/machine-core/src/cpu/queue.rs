//! Bounded FIFO of fetched words waiting for the execution unit.

use tracing::warn;

/// Prefetch queue depth of the 8086.
pub const PREFETCH_QUEUE_CAPACITY: usize = 6;

/// Rejected enqueue on a full prefetch queue.
///
/// The word is dropped; the fetch itself still completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueFull {
    /// Word that did not fit.
    pub word: u64,
}

/// Ring buffer of up to [`PREFETCH_QUEUE_CAPACITY`] words in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrefetchQueue {
    words: [u64; PREFETCH_QUEUE_CAPACITY],
    head: usize,
    len: usize,
}

impl PrefetchQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; PREFETCH_QUEUE_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    /// Number of queued words.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no words are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true when the queue has no remaining capacity.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == PREFETCH_QUEUE_CAPACITY
    }

    /// Appends `word` at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] and leaves the queue unchanged when it already
    /// holds [`PREFETCH_QUEUE_CAPACITY`] words.
    pub fn enqueue(&mut self, word: u64) -> Result<(), QueueFull> {
        if self.is_full() {
            warn!(word, capacity = PREFETCH_QUEUE_CAPACITY, "prefetch queue full");
            return Err(QueueFull { word });
        }
        let tail = (self.head + self.len) % PREFETCH_QUEUE_CAPACITY;
        self.words[tail] = word;
        self.len += 1;
        Ok(())
    }

    /// Removes the oldest word.
    pub fn dequeue(&mut self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let word = self.words[self.head];
        self.head = (self.head + 1) % PREFETCH_QUEUE_CAPACITY;
        self.len -= 1;
        Some(word)
    }

    /// Oldest word without removing it.
    #[must_use]
    pub const fn peek(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.words[self.head])
        }
    }

    /// Drops every queued word, as a jump does.
    pub fn flush(&mut self) {
        *self = Self::new();
    }
}
