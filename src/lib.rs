//! An in-target unit test harness for firmware running under a real-time operating system.
//!
//! Tests are compiled into the firmware image, registered with a [`Suite`] from a known entry
//! point, and run one at a time on a single thread. Results are reported as plain text lines over
//! the debug port, ending with a sentinel line of `EOT PASS` or `EOT FAIL`.
//!
//! A failed check never crashes the device. Where it is safe to do so, the check aborts its test
//! by returning a [`FailureSignal`], which the test body propagates with `?`. Where it is not
//! (outside of any test, on a thread the test spawned, inside an interrupt handler, while another
//! failure is propagating, or in a destructor) the failure is recorded against the running test
//! and execution continues.
//!
//! # Example
//! ```
//! use rtos_test::{check, check_eq, host::HostPlatform, test_case, Channel, Check, Harness, Suite, Tester};
//!
//! #[test_case]
//! fn queue_starts_empty(tester: &Tester) -> Check {
//!     let queue: Vec<u8> = Vec::new();
//!     check!(tester, queue.is_empty());
//!     check_eq!(tester, queue.len(), 0);
//!     Ok(())
//! }
//!
//! static SUITE: Suite = Suite::new();
//!
//! let platform = HostPlatform::new();
//! let channel = Channel::new(&platform);
//! let harness = Harness::new(&channel);
//!
//! SUITE.register_test(&queue_starts_empty).unwrap();
//! assert!(SUITE.run_all(&harness));
//! assert!(platform.output().ends_with("EOT PASS\n"));
//! ```
//!
//! # Features
//! - `macros` (default): the [`test_case`] attribute.
//! - `std` (default): [`host::HostPlatform`], panic capture at the test boundary, and
//!   [`check_panics!`].
//! - `log` (default): [`ChannelLogger`] and progress logging through the `log` facade.
//! - `serde`: `Serialize` for [`Summary`] and the classification types.
//! - `cortex-m`: an ITM transmitter and interrupt detector for Armv7-M.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(doc_cfg, feature(doc_cfg))]

#[cfg(test)]
extern crate self as rtos_test;

mod channel;
mod check;
mod harness;
mod log;
mod outcome;
mod platform;
mod registry;
mod ring;
mod signal;
mod suite;
mod test_case;

#[cfg(feature = "cortex-m")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "cortex-m")))]
pub mod cortex_m;
#[cfg(any(test, feature = "std"))]
#[cfg_attr(doc_cfg, doc(cfg(feature = "std")))]
pub mod host;
#[cfg(feature = "log")]
mod logger;

pub use channel::{Channel, DEFERRED_LOG_CAPACITY};
pub use harness::{Classification, Disposition, FailureKind, Harness, Origin, Site};
#[cfg(feature = "log")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "log")))]
pub use logger::ChannelLogger;
pub use outcome::{Outcome, Summary};
pub use platform::{Clock, InterruptState, Platform, ThreadId, Threads, Transmitter};
pub use registry::{Iter, Link, Linked, List, RegistryError};
pub use ring::RingBuffer;
#[cfg(feature = "macros")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "macros")))]
pub use rtos_test_macros::test_case;
pub use signal::{Check, FailureSignal, Fault, Termination};
pub use suite::{Suite, Tester};
pub use test_case::{Helper, HookFn, Phase, TestCase, TestFn};

#[doc(hidden)]
pub mod __private {
    pub use crate::check::function_path;
    #[cfg(feature = "std")]
    pub use std::panic::{catch_unwind, AssertUnwindSafe};
}
