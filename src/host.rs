//! A platform for running the harness on a hosted (`std`) target.
//!
//! This is mostly useful for exercising tests off-target: transmitted bytes are captured in memory
//! (and optionally echoed to standard output), every OS thread gets its own identity, and
//! interrupt context can be simulated for the duration of a closure.

use crate::platform::{Clock, InterruptState, ThreadId, Threads, Transmitter};
use std::{
    cell::Cell,
    io::Write,
    string::String,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    time::Instant,
    vec::Vec,
};

static NEXT_THREAD: AtomicUsize = AtomicUsize::new(1);

std::thread_local! {
    static THREAD: usize = NEXT_THREAD.fetch_add(1, Ordering::Relaxed);
    static IN_INTERRUPT: Cell<bool> = const { Cell::new(false) };
}

/// A [`Platform`](crate::Platform) backed by the host operating system.
#[derive(Debug)]
pub struct HostPlatform {
    output: Mutex<Vec<u8>>,
    echo: bool,
    start: Instant,
}

impl HostPlatform {
    /// Creates a platform capturing all transmitted output.
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Vec::new()),
            echo: false,
            start: Instant::now(),
        }
    }

    /// Creates a platform that also echoes transmitted output to standard output.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Returns everything transmitted so far.
    pub fn output(&self) -> String {
        let output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&output).into_owned()
    }

    /// Returns everything transmitted so far and clears the capture.
    pub fn take_output(&self) -> String {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let taken = String::from_utf8_lossy(&output).into_owned();
        output.clear();
        taken
    }

    /// Runs `f` as though it were an interrupt handler on the calling thread.
    pub fn interrupt<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        /// Restores the previous context even if `f` panics.
        struct Restore(bool);

        impl Drop for Restore {
            fn drop(&mut self) {
                IN_INTERRUPT.with(|flag| flag.set(self.0));
            }
        }

        let _restore = Restore(IN_INTERRUPT.with(|flag| flag.replace(true)));
        f()
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter for HostPlatform {
    fn transmit(&self, byte: u8) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(byte);
        if self.echo {
            let _ = std::io::stdout().write_all(&[byte]);
        }
    }
}

impl Threads for HostPlatform {
    fn current_thread(&self) -> ThreadId {
        let raw = THREAD.with(|thread| *thread);
        // Identities are handed out from 1 upwards.
        ThreadId::new(raw).unwrap_or_else(|| unreachable!("thread identity counter wrapped"))
    }
}

impl InterruptState for HostPlatform {
    fn in_interrupt(&self) -> bool {
        IN_INTERRUPT.with(Cell::get)
    }
}

impl Clock for HostPlatform {
    fn ticks(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn halt(&self) -> ! {
        panic!("platform halted")
    }
}

#[cfg(test)]
mod tests {
    use super::HostPlatform;
    use crate::platform::{InterruptState, Threads, Transmitter};
    use std::thread;

    #[test]
    fn captures_output() {
        let platform = HostPlatform::new();

        platform.transmit(b'o');
        platform.transmit(b'k');

        assert_eq!(platform.output(), "ok");
        assert_eq!(platform.take_output(), "ok");
        assert_eq!(platform.output(), "");
    }

    #[test]
    fn threads_are_distinct() {
        let platform = HostPlatform::new();
        let here = platform.current_thread();
        let there = thread::scope(|scope| {
            scope
                .spawn(|| platform.current_thread())
                .join()
                .unwrap()
        });

        assert_eq!(here, platform.current_thread());
        assert_ne!(here, there);
    }

    #[test]
    fn interrupt_is_scoped() {
        let platform = HostPlatform::new();

        assert!(!platform.in_interrupt());
        assert!(HostPlatform::interrupt(|| platform.in_interrupt()));
        assert!(!platform.in_interrupt());
    }

    #[test]
    fn interrupt_nests() {
        let platform = HostPlatform::new();

        HostPlatform::interrupt(|| {
            HostPlatform::interrupt(|| {});
            assert!(platform.in_interrupt());
        });
        assert!(!platform.in_interrupt());
    }
}
