//! All types related to defining tests and helpers.
//!
//! A [`TestCase`] is a named test body together with the location it was defined at. A [`Helper`]
//! is a hook run around every test at one of four [`Phase`]s. Both embed a registry
//! [`Link`](crate::Link), so they are meant to live in `static`s and be registered with a
//! [`Suite`](crate::Suite).
//!
//! The easiest way to define a test case is the [`test_case`](crate::test_case) attribute:
//!
//! ```
//! use rtos_test::{check, test_case, Check, Tester};
//!
//! #[test_case]
//! fn addition(tester: &Tester) -> Check {
//!     check!(tester, 1 + 1 == 2);
//!     Ok(())
//! }
//! ```

use crate::{
    registry::{Link, Linked},
    Check, Tester,
};
use core::{fmt, fmt::Formatter};

/// The signature of a test body, as stored in a [`TestCase`].
pub type TestFn = fn(&Tester<'_>) -> Check;

/// A test registered with a [`Suite`](crate::Suite).
pub struct TestCase {
    test: TestFn,
    name: &'static str,
    file: &'static str,
    line: u32,
    link: Link<TestCase>,
}

impl TestCase {
    /// Defines a test case.
    pub const fn new(test: TestFn, name: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            test,
            name,
            file,
            line,
            link: Link::new(),
        }
    }

    /// The name of the test.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The file the test was defined in.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// The line the test was defined on.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Calls the test body directly, without any of the engine's bookkeeping.
    ///
    /// Use [`Tester::run_one()`] to run a test the way the engine does.
    pub fn run(&self, tester: &Tester<'_>) -> Check {
        (self.test)(tester)
    }
}

impl Linked for TestCase {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("TestCase")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

/// When a [`Helper`] runs, relative to each test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Phase {
    /// Before the test is marked as running.
    Setup,
    /// After the test is marked as running, before its body.
    Start,
    /// After the body returns normally, while the test is still running.
    Finish,
    /// After the test is no longer marked as running.
    Teardown,
}

/// The signature of a helper hook.
pub type HookFn = fn();

/// A hook run around every test.
///
/// `Setup` and `Teardown` helpers run outside the test, so failed checks inside them are reported
/// as failures outside tests. `Start` and `Finish` helpers run as part of the test.
pub struct Helper {
    hook: HookFn,
    phase: Phase,
    link: Link<Helper>,
}

impl Helper {
    /// Defines a helper running `hook` at `phase`.
    pub const fn new(hook: HookFn, phase: Phase) -> Self {
        Self {
            hook,
            phase,
            link: Link::new(),
        }
    }

    /// The phase this helper runs at.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Calls the hook.
    pub fn run(&self) {
        (self.hook)()
    }
}

impl Linked for Helper {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("Helper")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
