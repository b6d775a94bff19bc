//! Capabilities the harness needs from the platform it runs on.
//!
//! The harness itself never touches hardware or the scheduler. Everything it needs is expressed as
//! one of the narrow traits below, and anything implementing all of them is a [`Platform`].

use core::num::NonZeroUsize;

/// An opaque, comparable identity for a thread (or RTOS task).
///
/// A task handle is usually a pointer to a control block, which makes a natural non-zero value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ThreadId(NonZeroUsize);

impl ThreadId {
    /// Creates an identity from a raw value, returning `None` for zero.
    pub const fn new(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns the raw value this identity was created from.
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

/// The debug port's character transmitter.
pub trait Transmitter {
    /// Sends a single raw byte.
    ///
    /// This is only ever called from normal (non-interrupt) context, so it may block until the
    /// port is ready.
    fn transmit(&self, byte: u8);
}

/// Access to the scheduler's notion of the current thread.
pub trait Threads {
    /// Returns the identity of the calling thread.
    fn current_thread(&self) -> ThreadId;
}

/// Detection of asynchronous (interrupt) execution context.
pub trait InterruptState {
    /// Returns whether the caller is currently executing an interrupt handler.
    fn in_interrupt(&self) -> bool;
}

/// A monotonically increasing tick counter.
pub trait Clock {
    /// Returns the current tick count.
    fn ticks(&self) -> u32;

    /// Stops the system after an unrecoverable fault.
    ///
    /// The default implementation spins forever, which leaves the debug port readable.
    fn halt(&self) -> ! {
        loop {
            core::hint::spin_loop()
        }
    }
}

/// Everything the harness needs from the platform.
///
/// This is implemented automatically for any type implementing each of the capability traits. It
/// must be `Sync`, since checks can fail on any thread and in interrupt handlers.
pub trait Platform: Transmitter + Threads + InterruptState + Clock + Sync {}

impl<T> Platform for T where T: Transmitter + Threads + InterruptState + Clock + Sync {}

#[cfg(test)]
mod tests {
    use super::ThreadId;
    use claims::{assert_none, assert_some};

    #[test]
    fn thread_id_zero() {
        assert_none!(ThreadId::new(0));
    }

    #[test]
    fn thread_id_round_trip() {
        assert_eq!(assert_some!(ThreadId::new(42)).get(), 42);
    }

    #[test]
    fn thread_id_eq() {
        assert_eq!(ThreadId::new(7), ThreadId::new(7));
        assert_ne!(ThreadId::new(7), ThreadId::new(8));
    }
}
