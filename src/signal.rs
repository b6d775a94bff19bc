//! The failure signal and the return types accepted from test bodies.
//!
//! A failed check that is allowed to abort its test returns `Err(FailureSignal)`, which the test
//! body propagates with `?` back up to the engine. Nothing else can produce the signal: its
//! constructor is private, so the engine's classification is the only way to abort a test.

use crate::Harness;
use core::{
    fmt,
    fmt::{Display, Formatter},
};

/// Raised by a failed check to abort the current test.
///
/// The signal carries no data. By the time it exists, the failure has already been reported.
#[derive(Debug, Eq, PartialEq)]
#[must_use = "a failure signal must be propagated to abort the test"]
pub struct FailureSignal {
    _private: (),
}

impl FailureSignal {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

impl Display for FailureSignal {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("test aborted by a failed check")
    }
}

impl core::error::Error for FailureSignal {}

/// The result of a check.
///
/// `Ok(())` means execution should continue, either because the check passed or because it failed
/// in a context where aborting is unsafe and the failure was only recorded.
pub type Check = Result<(), FailureSignal>;

/// An error returned from a test body that is not a failed check.
///
/// Returning `Err(Fault::Error(_))` is reported as an uncategorized test failure. A failure signal
/// converts into a `Fault`, so checks can still be propagated with `?` in bodies returning
/// `Result<(), Fault>`.
#[derive(Debug, Eq, PartialEq)]
pub enum Fault {
    /// A failed check aborted the test.
    Aborted(FailureSignal),
    /// The test body gave up with an error.
    Error(&'static str),
}

impl From<FailureSignal> for Fault {
    fn from(signal: FailureSignal) -> Self {
        Self::Aborted(signal)
    }
}

impl From<&'static str> for Fault {
    fn from(message: &'static str) -> Self {
        Self::Error(message)
    }
}

impl Display for Fault {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            Self::Aborted(signal) => Display::fmt(signal, formatter),
            Self::Error(message) => formatter.write_str(message),
        }
    }
}

/// A trait for the return types accepted from test bodies.
///
/// This is implemented for `()`, for [`Check`], and for `Result<(), Fault>`. Each is converted to a
/// [`Check`] at the test boundary; faults are reported and recorded against the running test on
/// the way.
pub trait Termination {
    /// Converts the body's return value to the engine's result.
    fn terminate(self, harness: &Harness<'_>) -> Check;
}

impl Termination for () {
    fn terminate(self, _harness: &Harness<'_>) -> Check {
        Ok(())
    }
}

impl Termination for Check {
    fn terminate(self, _harness: &Harness<'_>) -> Check {
        self
    }
}

impl Termination for Result<(), Fault> {
    fn terminate(self, harness: &Harness<'_>) -> Check {
        match self {
            Ok(()) => Ok(()),
            Err(Fault::Aborted(signal)) => Err(signal),
            Err(Fault::Error(message)) => {
                harness.fault(format_args!("error: {message}"));
                Err(FailureSignal::new())
            }
        }
    }
}
