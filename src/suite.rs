//! Logic for running registered tests.
//!
//! A [`Suite`] holds the test and helper registries. [`Suite::run()`] executes every registered
//! test in registration order, reporting progress and a final summary through the harness's
//! channel. The report always ends with a sentinel line, `EOT PASS` or `EOT FAIL`, which is what
//! an off-target test runner should be listening for.
//!
//! Each test is run by [`Suite::run_one()`], which brackets the test body with the registered
//! helpers:
//!
//! 1. `Setup` helpers.
//! 2. The test is marked as running on the current thread.
//! 3. `Start` helpers, the test body, then (if the body returned normally) `Finish` helpers.
//! 4. The test is marked as no longer running.
//! 5. `Teardown` helpers, unconditionally.
//!
//! With the `std` feature, a panic anywhere in step 3 is caught and reported as a test failure.

use crate::{
    log,
    outcome::{Outcome, Summary},
    registry::{Iter, List, RegistryError},
    test_case::{Helper, Phase, TestCase},
    Check, Harness,
};
use core::{fmt, ops::Deref};

/// The registered tests and helpers.
///
/// Registration is meant to happen from a single entry point before the run starts. A suite can
/// live in a `static`, since both registries are built from atomics.
pub struct Suite {
    tests: List<TestCase>,
    helpers: List<Helper>,
}

impl Suite {
    /// Creates an empty suite.
    pub const fn new() -> Self {
        Self {
            tests: List::new(),
            helpers: List::new(),
        }
    }

    /// Adds a test to the end of the run.
    pub fn register_test(&self, test: &'static TestCase) -> Result<(), RegistryError> {
        self.tests.register(test)
    }

    /// Removes a test from the run.
    pub fn unregister_test(&self, test: &'static TestCase) -> Result<(), RegistryError> {
        self.tests.unregister(test)
    }

    /// Adds a helper, run after any helpers already registered for the same phase.
    pub fn register_helper(&self, helper: &'static Helper) -> Result<(), RegistryError> {
        self.helpers.register(helper)
    }

    /// Removes a helper.
    pub fn unregister_helper(&self, helper: &'static Helper) -> Result<(), RegistryError> {
        self.helpers.unregister(helper)
    }

    /// The registered tests, in registration order.
    pub fn tests(&self) -> Iter<'_, TestCase> {
        self.tests.iter()
    }

    /// The registered helpers, in registration order.
    pub fn helpers(&self) -> Iter<'_, Helper> {
        self.helpers.iter()
    }

    fn run_helpers(&self, phase: Phase) {
        for helper in self.helpers().filter(|helper| helper.phase() == phase) {
            helper.run();
        }
    }

    /// Runs a single test, returning whether it passed.
    ///
    /// The test does not need to be registered with this suite. Called from inside another test,
    /// the test runs nested: failures in it are reported as nested failures, and the enclosing
    /// test's state is restored afterwards.
    pub fn run_one(&self, harness: &Harness<'_>, test: &TestCase) -> bool {
        let channel = harness.channel();
        channel.end_line();

        self.run_helpers(Phase::Setup);
        let frame = harness.enter();
        let tester = Tester::new(harness, self);
        guarded(harness, || {
            self.run_helpers(Phase::Start);
            test.run(&tester)?;
            self.run_helpers(Phase::Finish);
            Ok(())
        });
        let passed = harness.leave(frame);
        self.run_helpers(Phase::Teardown);

        channel.end_line();
        passed
    }

    /// Runs every registered test in registration order and reports the results.
    pub fn run(&self, harness: &Harness<'_>) -> Summary {
        let channel = harness.channel();
        let mut summary = Summary::default();

        channel.line(format_args!("== RUNNING TEST CASES =="));
        for test in self.tests() {
            log::info!("running test: {}", test.name());
            channel.line(format_args!("=== TEST: {} ===", test.name()));

            let outcome = Outcome::from(self.run_one(harness, test));
            log::info!("test {}: {}", test.name(), outcome.as_str());
            summary.record(outcome);

            if outcome == Outcome::Failed {
                channel.line(format_args!(
                    "=== TEST FAILED: {} File '{}' line {} ===",
                    test.name(),
                    test.file(),
                    test.line()
                ));
            }
        }
        log::info!("tests finished");

        channel.line(format_args!("== TEST SUMMARY =="));
        channel.line(format_args!("{} Total Tests", summary.total));
        channel.line(format_args!("{} Tests Passed", summary.passed));
        if summary.all_passed() {
            channel.line(format_args!("== TESTS PASSED =="));
            channel.line(format_args!("EOT PASS"));
        } else {
            channel.line(format_args!("{} Failed Tests", summary.failed()));
            channel.line(format_args!("== TESTS FAILED =="));
            channel.line(format_args!("EOT FAIL"));
        }
        channel.flush();

        summary
    }

    /// Runs every registered test, returning whether all of them passed.
    pub fn run_all(&self, harness: &Harness<'_>) -> bool {
        self.run(harness).all_passed()
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Suite")
            .field("tests", &self.tests.len())
            .field("helpers", &self.helpers.len())
            .finish()
    }
}

/// Runs the guarded part of a test, intercepting the failure signal.
#[cfg(not(feature = "std"))]
fn guarded<F>(_harness: &Harness<'_>, body: F)
where
    F: FnOnce() -> Check,
{
    if let Err(_signal) = body() {
        log::info!("test aborted");
    }
}

/// Runs the guarded part of a test, intercepting the failure signal and any panic.
#[cfg(feature = "std")]
fn guarded<F>(harness: &Harness<'_>, body: F)
where
    F: FnOnce() -> Check,
{
    use std::{
        panic::{catch_unwind, AssertUnwindSafe},
        string::String,
    };

    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => {}
        Ok(Err(_signal)) => {
            log::info!("test aborted");
        }
        Err(payload) => {
            log::info!("test panicked");
            if let Some(message) = payload.downcast_ref::<&str>() {
                harness.fault(format_args!("panic: {message}"));
            } else if let Some(message) = payload.downcast_ref::<String>() {
                harness.fault(format_args!("panic: {message}"));
            } else {
                harness.fault(format_args!("unknown panic."));
            }
        }
    }
}

/// The handle passed to test bodies.
///
/// A `Tester` dereferences to the [`Harness`] running the test, so checks can be made against it
/// directly. It can be shared with threads spawned by the test; checks failing on those threads
/// are recorded against the test without aborting anything.
#[derive(Clone, Copy)]
pub struct Tester<'t> {
    harness: &'t Harness<'t>,
    suite: &'t Suite,
}

impl<'t> Tester<'t> {
    /// Creates a tester running checks against `harness`.
    pub fn new(harness: &'t Harness<'t>, suite: &'t Suite) -> Self {
        Self { harness, suite }
    }

    /// The harness running the test.
    pub fn harness(&self) -> &'t Harness<'t> {
        self.harness
    }

    /// The suite running the test.
    pub fn suite(&self) -> &'t Suite {
        self.suite
    }

    /// Runs another test nested inside the current one, returning whether it passed.
    pub fn run_one(&self, test: &TestCase) -> bool {
        self.suite.run_one(self.harness, test)
    }
}

impl<'t> Deref for Tester<'t> {
    type Target = Harness<'t>;

    fn deref(&self) -> &Self::Target {
        self.harness
    }
}

impl fmt::Debug for Tester<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Tester")
            .field("harness", self.harness)
            .finish_non_exhaustive()
    }
}
