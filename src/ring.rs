//! A lock-free byte ring buffer shared between interrupt and normal context.
//!
//! The buffer follows the single-producer/single-consumer convention: interrupt context only ever
//! advances the write cursor (`tail`), and normal context only ever advances the read cursor
//! (`head`). One slot is always left empty, so a buffer of size `N` holds at most `N - 1` bytes
//! and full can be told apart from empty using the two cursors alone.
//!
//! Neither side ever blocks. A second producer (for example a nested interrupt preempting one
//! that is mid-push) or a second consumer is turned away rather than allowed to race on a cursor.

use core::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// A fixed-size circular byte buffer.
pub struct RingBuffer<const N: usize> {
    slots: UnsafeCell<[u8; N]>,
    /// Read cursor, advanced by the consumer.
    head: AtomicUsize,
    /// Write cursor, advanced by the producer.
    tail: AtomicUsize,
    producing: AtomicBool,
    consuming: AtomicBool,
}

// SAFETY: A slot is only written by the producer while it lies outside `head..tail`, and only read
// by the consumer while it lies inside. The cursors are published with release stores and observed
// with acquire loads, so a slot's contents are visible before the cursor that hands it over. The
// `producing` and `consuming` flags ensure there is at most one of each at a time.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const NON_TRIVIAL: () = assert!(N >= 2, "a ring buffer needs at least two slots");

    /// Creates an empty buffer.
    pub const fn new() -> Self {
        let () = Self::NON_TRIVIAL;
        Self {
            slots: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            producing: AtomicBool::new(false),
            consuming: AtomicBool::new(false),
        }
    }

    /// The maximum number of bytes the buffer can hold at once.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the number of bytes currently held.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail + N - head) % N
    }

    /// Returns whether no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a byte, returning `false` if it was dropped.
    ///
    /// A byte is dropped if the buffer is full or if another producer is mid-push. This never
    /// blocks.
    pub fn push(&self, byte: u8) -> bool {
        if self
            .producing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let tail = self.tail.load(Ordering::Relaxed);
        let next = (tail + 1) % N;
        let pushed = if next == self.head.load(Ordering::Acquire) {
            false
        } else {
            // SAFETY: `tail` is in bounds, and the slot is not visible to the consumer until the
            // release store below.
            unsafe { self.slots.get().cast::<u8>().add(tail).write(byte) };
            self.tail.store(next, Ordering::Release);
            true
        };

        self.producing.store(false, Ordering::Release);
        pushed
    }

    /// Removes the oldest byte.
    ///
    /// Returns `None` if the buffer is empty or if another consumer is currently draining.
    pub fn pop(&self) -> Option<u8> {
        let mut popped = None;
        self.drain_while(|byte| {
            popped = Some(byte);
            false
        });
        popped
    }

    /// Removes every held byte, oldest first, handing each to `sink`.
    ///
    /// Bytes pushed while draining are drained as well. Returns the number of bytes drained, which
    /// is zero if another consumer is already draining.
    pub fn drain<F>(&self, mut sink: F) -> usize
    where
        F: FnMut(u8),
    {
        self.drain_while(|byte| {
            sink(byte);
            true
        })
    }

    fn drain_while<F>(&self, mut sink: F) -> usize
    where
        F: FnMut(u8) -> bool,
    {
        if self
            .consuming
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return 0;
        }

        let mut drained = 0;
        let mut head = self.head.load(Ordering::Relaxed);
        while head != self.tail.load(Ordering::Acquire) {
            // SAFETY: `head` is in bounds, and the acquire load of `tail` makes the producer's
            // write to this slot visible.
            let byte = unsafe { self.slots.get().cast::<u8>().add(head).read() };
            head = (head + 1) % N;
            self.head.store(head, Ordering::Release);
            drained += 1;
            if !sink(byte) {
                break;
            }
        }

        self.consuming.store(false, Ordering::Release);
        drained
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
