//! The execution context and failure classification.
//!
//! A [`Harness`] holds the state of the test run: how many tests are nested on the owning thread's
//! stack, whether the current test has recorded a failure, which thread owns the current test, and
//! whether a failure signal is currently propagating. Every failed check passes through
//! [`Harness::fail()`], which decides from that state whether the check may abort its test or
//! must only record the failure and let execution continue.
//!
//! Only an ordinary failure (a check on the owning thread, outside any interrupt handler, while
//! nothing else is propagating, not inside a destructor) may abort. Aborting anywhere else would
//! return through a stack the engine does not control.

use crate::{
    log,
    platform::{Platform, ThreadId},
    Channel, Check, FailureSignal,
};
use core::{
    fmt,
    panic::PanicInfo,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// The kind of code a check was written in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    /// Ordinary code, able to propagate a failure signal.
    Body,
    /// A `Drop` implementation, which has no way to propagate anything.
    Destructor,
}

/// Where a check was written.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Site {
    /// The source file.
    pub file: &'static str,
    /// The source line.
    pub line: u32,
    /// The enclosing function.
    pub function: &'static str,
    /// The kind of code the check was written in.
    pub origin: Origin,
}

impl Site {
    /// Creates a site. This is normally done by the check macros.
    pub const fn new(file: &'static str, line: u32, function: &'static str, origin: Origin) -> Self {
        Self {
            file,
            line,
            function,
            origin,
        }
    }

    /// The file name without its directories.
    pub fn short_file(&self) -> &'static str {
        match self.file.rfind(['/', '\\']) {
            Some(index) => &self.file[index + 1..],
            None => self.file,
        }
    }
}

/// How a failed check was classified.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FailureKind {
    /// A failure while running a test, eligible to abort it.
    Ordinary,
    /// No test was running.
    OutsideTest,
    /// The failing test was run from inside another test.
    Nested,
    /// The check failed on a thread other than the one running the test.
    SecondaryThread,
    /// The check failed inside an interrupt handler.
    Interrupt,
    /// The check failed while an earlier failure was still propagating.
    DuringUnwind,
    /// The check failed inside a `Drop` implementation.
    Destructor,
}

impl FailureKind {
    /// The tag starting the reported line.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ordinary => "ASSERT FAILED",
            Self::OutsideTest => "ASSERT FAILED OUTSIDE TESTS",
            Self::Nested => "NESTED ASSERT FAILED",
            Self::SecondaryThread => "ASSERT FAILED IN SECONDARY THREAD",
            Self::Interrupt => "ASSERT FAILED IN INTERRUPT",
            Self::DuringUnwind => "ASSERT FAILED DURING UNWIND",
            Self::Destructor => "ASSERT FAILED IN DESTRUCTOR",
        }
    }
}

/// What happens after a failed check has been reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Disposition {
    /// Nothing is recorded; execution continues at the call site.
    Continue,
    /// The running test is marked failed; execution continues at the call site.
    Record,
    /// The running test is marked failed and aborted with a [`FailureSignal`].
    Unwind,
}

/// The result of classifying a failed check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Classification {
    /// The tag to report.
    pub kind: FailureKind,
    /// What to do about it.
    pub disposition: Disposition,
}

/// A snapshot of everything classification depends on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Circumstances {
    pub(crate) depth: usize,
    pub(crate) owner: Option<ThreadId>,
    pub(crate) current: ThreadId,
    pub(crate) in_interrupt: bool,
    pub(crate) unwinding: bool,
    pub(crate) origin: Origin,
}

/// Decides how a failed check is handled. The first matching rule wins, except that a nested
/// test only changes the reported kind.
pub(crate) fn classify(circumstances: &Circumstances) -> Classification {
    if circumstances.depth == 0 {
        return Classification {
            kind: FailureKind::OutsideTest,
            disposition: Disposition::Continue,
        };
    }

    let (kind, disposition) = if circumstances.owner != Some(circumstances.current) {
        (FailureKind::SecondaryThread, Disposition::Record)
    } else if circumstances.in_interrupt {
        (FailureKind::Interrupt, Disposition::Record)
    } else if circumstances.unwinding {
        (FailureKind::DuringUnwind, Disposition::Record)
    } else if circumstances.origin == Origin::Destructor {
        (FailureKind::Destructor, Disposition::Record)
    } else {
        (FailureKind::Ordinary, Disposition::Unwind)
    };

    Classification {
        kind: if circumstances.depth > 1 {
            FailureKind::Nested
        } else {
            kind
        },
        disposition,
    }
}

/// The state of the enclosing test, saved while a nested test runs.
#[derive(Debug)]
pub(crate) struct Frame {
    failure: bool,
    owner: usize,
    unwinding: bool,
}

/// The execution context of a test run.
pub struct Harness<'a> {
    channel: &'a Channel<'a>,
    depth: AtomicUsize,
    failure: AtomicBool,
    /// Raw [`ThreadId`] of the owning thread, or zero.
    owner: AtomicUsize,
    /// Set while a failure signal propagates out of a test body.
    unwinding: AtomicBool,
}

impl<'a> Harness<'a> {
    /// Creates an idle harness reporting through `channel`.
    pub const fn new(channel: &'a Channel<'a>) -> Self {
        Self {
            channel,
            depth: AtomicUsize::new(0),
            failure: AtomicBool::new(false),
            owner: AtomicUsize::new(0),
            unwinding: AtomicBool::new(false),
        }
    }

    /// The channel failures are reported through.
    pub fn channel(&self) -> &'a Channel<'a> {
        self.channel
    }

    fn platform(&self) -> &'a dyn Platform {
        self.channel.platform()
    }

    /// The number of tests currently nested on the owning thread's stack.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Whether a test is currently running.
    pub fn is_running(&self) -> bool {
        self.depth() > 0
    }

    /// The thread running the current test, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        ThreadId::new(self.owner.load(Ordering::Acquire))
    }

    /// Whether the current test has recorded a failure that did not abort it.
    pub fn failure_recorded(&self) -> bool {
        self.failure.load(Ordering::Acquire)
    }

    fn unwinding(&self) -> bool {
        self.unwinding.load(Ordering::Acquire) || panicking()
    }

    /// Classifies a failure in code of the given origin, as if it happened right now on the
    /// calling thread.
    pub fn classify(&self, origin: Origin) -> Classification {
        let platform = self.platform();
        classify(&Circumstances {
            depth: self.depth(),
            owner: self.owner(),
            current: platform.current_thread(),
            in_interrupt: platform.in_interrupt(),
            unwinding: self.unwinding(),
            origin,
        })
    }

    /// Reports a failed check and decides whether it aborts the running test.
    ///
    /// Returns `Err(FailureSignal)` only for an ordinary failure; the caller must propagate it.
    /// Every other failure is recorded against the running test (if there is one) and returns
    /// `Ok(())`, so execution continues at the call site.
    pub fn fail(&self, site: &Site, message: fmt::Arguments<'_>) -> Check {
        let classification = self.classify(site.origin);

        self.channel.end_line();
        self.channel.line(format_args!(
            "{} '{}' {} {}:{}",
            classification.kind.tag(),
            message,
            site.function,
            site.short_file(),
            site.line
        ));
        self.channel.flush();

        match classification.disposition {
            Disposition::Continue => Ok(()),
            Disposition::Record => {
                self.failure.store(true, Ordering::Release);
                Ok(())
            }
            Disposition::Unwind => {
                self.failure.store(true, Ordering::Release);
                self.unwinding.store(true, Ordering::Release);
                Err(FailureSignal::new())
            }
        }
    }

    /// Reports a fault that is not a failed check, marking the running test failed.
    ///
    /// The reported line reads `FAILED - Test failed with <description>`.
    pub fn fault(&self, description: fmt::Arguments<'_>) {
        self.channel.end_line();
        self.channel
            .line(format_args!("FAILED - Test failed with {description}"));
        self.channel.flush();
        if self.is_running() {
            self.failure.store(true, Ordering::Release);
        }
    }

    /// Reports an unrecoverable fault and halts the platform.
    pub fn fatal(&self, message: fmt::Arguments<'_>) -> ! {
        log::error!("fatal: {}", message);
        self.channel.end_line();
        self.channel.line(format_args!("FATAL {message}"));
        self.channel.flush();
        self.platform().halt()
    }

    /// Reports a panic that could not be recovered from and halts the platform.
    ///
    /// This is meant to be called from a firmware's `#[panic_handler]`.
    pub fn report_panic(&self, info: &PanicInfo<'_>) -> ! {
        self.fatal(format_args!("{info}"))
    }

    /// Marks the start of a test on the calling thread.
    pub(crate) fn enter(&self) -> Frame {
        let owner = self.platform().current_thread().get();
        self.depth.fetch_add(1, Ordering::AcqRel);
        Frame {
            failure: self.failure.swap(false, Ordering::AcqRel),
            owner: self.owner.swap(owner, Ordering::AcqRel),
            unwinding: self.unwinding.swap(false, Ordering::AcqRel),
        }
    }

    /// Marks the end of a test, restoring the enclosing test's state. Returns whether the test
    /// passed.
    pub(crate) fn leave(&self, frame: Frame) -> bool {
        let passed = !self.failure.load(Ordering::Acquire);
        self.failure.store(frame.failure, Ordering::Release);
        self.owner.store(frame.owner, Ordering::Release);
        self.unwinding.store(frame.unwinding, Ordering::Release);
        self.depth.fetch_sub(1, Ordering::AcqRel);
        passed
    }
}

impl fmt::Debug for Harness<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Harness")
            .field("depth", &self.depth())
            .field("failure", &self.failure_recorded())
            .field("owner", &self.owner())
            .field("unwinding", &self.unwinding.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(feature = "std")]
fn panicking() -> bool {
    std::thread::panicking()
}

#[cfg(not(feature = "std"))]
fn panicking() -> bool {
    false
}
