//! Macros for writing checks.
//!
//! Every check takes the harness (or a [`Tester`](crate::Tester)) as its first argument. A check
//! that fails reports a line naming the check, the enclosing function and the location, then
//! returns early with `?` if the harness decided the failure aborts the test. Checks can therefore
//! only be used in functions returning [`Check`](crate::Check) or `Result<(), Fault>`.
//!
//! The exception is [`drop_check!`](crate::drop_check), which is meant for `Drop` impls and never
//! returns early.

/// Expands to the path of the enclosing function, as a `&'static str`.
///
/// A function nested in a block of the same name (which is how `#[test_case]` lays out test
/// bodies) is reported by its outer path, so `tests::foo::foo` reads as `tests::foo`.
///
/// ```
/// fn foo() -> &'static str {
///     rtos_test::function_name!()
/// }
///
/// assert!(foo().ends_with("::foo"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::__private::function_path(type_name_of(f))
    }};
}

/// Turns the type name of a marker function `f` into the path of the function enclosing it.
#[doc(hidden)]
pub fn function_path(name: &'static str) -> &'static str {
    let name = name.strip_suffix("::f").unwrap_or(name);
    if let Some((parent, last)) = name.rsplit_once("::") {
        let outer = parent.rsplit_once("::").map_or(parent, |(_, outer)| outer);
        if outer == last {
            return parent;
        }
    }
    name
}

#[doc(hidden)]
#[macro_export]
macro_rules! __site {
    ($origin:ident) => {
        $crate::Site::new(
            ::core::file!(),
            ::core::line!(),
            $crate::function_name!(),
            $crate::Origin::$origin,
        )
    };
}

/// Checks that a condition holds.
///
/// ```
/// use rtos_test::{check, Check, Tester};
///
/// fn ready(tester: &Tester) -> Check {
///     let queue: [u8; 0] = [];
///     check!(tester, queue.is_empty());
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! check {
    ($harness:expr, $condition:expr $(,)?) => {
        if !$condition {
            ($harness).fail(
                &$crate::__site!(Body),
                ::core::format_args!("check!({})", ::core::stringify!($condition)),
            )?;
        }
    };
}

/// Checks that a condition is `true`.
#[macro_export]
macro_rules! check_true {
    ($harness:expr, $condition:expr $(,)?) => {
        if !$condition {
            ($harness).fail(
                &$crate::__site!(Body),
                ::core::format_args!("check_true!({})", ::core::stringify!($condition)),
            )?;
        }
    };
}

/// Checks that a condition is `false`.
#[macro_export]
macro_rules! check_false {
    ($harness:expr, $condition:expr $(,)?) => {
        if $condition {
            ($harness).fail(
                &$crate::__site!(Body),
                ::core::format_args!("check_false!({})", ::core::stringify!($condition)),
            )?;
        }
    };
}

/// Checks that two values are equal, reporting both on failure.
#[macro_export]
macro_rules! check_eq {
    ($harness:expr, $left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    ($harness).fail(
                        &$crate::__site!(Body),
                        ::core::format_args!(
                            "check_eq!({}, {}) left: {:?} right: {:?}",
                            ::core::stringify!($left),
                            ::core::stringify!($right),
                            left,
                            right
                        ),
                    )?;
                }
            }
        }
    };
}

/// Checks that an expression evaluates to `Err`.
#[macro_export]
macro_rules! check_err {
    ($harness:expr, $expression:expr $(,)?) => {
        if ::core::result::Result::is_ok(&$expression) {
            ($harness).fail(
                &$crate::__site!(Body),
                ::core::format_args!("check_err!({})", ::core::stringify!($expression)),
            )?;
        }
    };
}

/// Fails unconditionally with a formatted message.
///
/// ```
/// use rtos_test::{fail, Check, Tester};
///
/// fn unreachable_state(tester: &Tester, state: u8) -> Check {
///     if state > 3 {
///         fail!(tester, "unexpected state {}", state);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! fail {
    ($harness:expr, $($arg:tt)+) => {
        ($harness).fail(&$crate::__site!(Body), ::core::format_args!($($arg)+))?
    };
}

/// Checks that evaluating an expression panics.
#[cfg(feature = "std")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "std")))]
#[macro_export]
macro_rules! check_panics {
    ($harness:expr, $expression:expr $(,)?) => {
        if $crate::__private::catch_unwind($crate::__private::AssertUnwindSafe(|| {
            let _ = $expression;
        }))
        .is_ok()
        {
            ($harness).fail(
                &$crate::__site!(Body),
                ::core::format_args!("check_panics!({})", ::core::stringify!($expression)),
            )?;
        }
    };
}

/// Checks that a condition holds, from inside a `Drop` impl.
///
/// A failure is always recorded against the running test and never aborts anything, so this can
/// be used where `?` is unavailable.
///
/// ```
/// use rtos_test::{drop_check, Tester};
///
/// struct Lease<'a> {
///     tester: &'a Tester<'a>,
///     returned: bool,
/// }
///
/// impl Drop for Lease<'_> {
///     fn drop(&mut self) {
///         drop_check!(self.tester, self.returned);
///     }
/// }
/// ```
#[macro_export]
macro_rules! drop_check {
    ($harness:expr, $condition:expr $(,)?) => {
        if !$condition {
            // Destructor failures are only ever recorded.
            let _ = ($harness).fail(
                &$crate::__site!(Destructor),
                ::core::format_args!("drop_check!({})", ::core::stringify!($condition)),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::function_path;
    use crate::{host::HostPlatform, Channel, Check, Fault, Harness};
    use claims::{assert_err, assert_ok};

    fn run<F>(body: F) -> (std::string::String, Check)
    where
        F: FnOnce(&Harness) -> Check,
    {
        let platform = HostPlatform::new();
        let channel = Channel::new(&platform);
        let harness = Harness::new(&channel);

        let frame = harness.enter();
        let result = body(&harness);
        harness.leave(frame);

        (platform.output(), result)
    }

    #[test]
    fn function_name() {
        fn enclosing() -> &'static str {
            function_name!()
        }

        assert_eq!(
            enclosing(),
            "rtos_test::check::tests::function_name::enclosing"
        );
    }

    #[test]
    fn function_name_in_same_named_block() {
        fn outer() -> &'static str {
            fn outer() -> &'static str {
                function_name!()
            }
            outer()
        }

        assert_eq!(
            outer(),
            "rtos_test::check::tests::function_name_in_same_named_block::outer"
        );
    }

    #[test]
    fn function_path_folds_repeated_segment() {
        assert_eq!(
            function_path("firmware::tests::queue_push::queue_push::f"),
            "firmware::tests::queue_push"
        );
    }

    #[test]
    fn function_path_keeps_distinct_segments() {
        assert_eq!(
            function_path("firmware::tests::queue_push::f"),
            "firmware::tests::queue_push"
        );
        assert_eq!(function_path("main::f"), "main");
        assert_eq!(function_path("main"), "main");
    }

    #[test]
    fn check_passes() {
        let (output, result) = run(|harness| {
            check!(harness, 2 > 1);
            Ok(())
        });

        assert_ok!(result);
        assert_eq!(output, "");
    }

    #[test]
    fn check_fails() {
        let (output, result) = run(|harness| {
            check!(harness, 1 > 2);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check!(1 > 2)' rtos_test::check::tests::"));
        assert!(output.contains(" check.rs:"));
    }

    #[test]
    fn check_true_fails() {
        let (output, result) = run(|harness| {
            check_true!(harness, false);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check_true!(false)' "));
    }

    #[test]
    fn check_false_fails() {
        let (output, result) = run(|harness| {
            check_false!(harness, true);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check_false!(true)' "));
    }

    #[test]
    fn check_false_passes() {
        let (_, result) = run(|harness| {
            check_false!(harness, 1 == 2);
            Ok(())
        });

        assert_ok!(result);
    }

    #[test]
    fn check_eq_fails() {
        let (output, result) = run(|harness| {
            let length = 3;
            check_eq!(harness, length, 4);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check_eq!(length, 4) left: 3 right: 4' "));
    }

    #[test]
    fn check_err_passes() {
        let (_, result) = run(|harness| {
            check_err!(harness, "x".parse::<u8>());
            Ok(())
        });

        assert_ok!(result);
    }

    #[test]
    fn check_err_fails() {
        let (output, result) = run(|harness| {
            check_err!(harness, "7".parse::<u8>());
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check_err!(\"7\".parse::<u8>())' "));
    }

    #[test]
    fn fail_formats_message() {
        let (output, result) = run(|harness| {
            fail!(harness, "got {} of {}", 1, 2);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'got 1 of 2' "));
    }

    #[test]
    fn fail_escapes_message() {
        let (output, _) = run(|harness| {
            fail!(harness, "a\nb");
            Ok(())
        });

        assert!(output.starts_with("ASSERT FAILED 'a\\nb' "));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn check_panics_passes() {
        let (_, result) = run(|harness| {
            check_panics!(harness, [0_u8; 2][harness.depth() + 2]);
            Ok(())
        });

        assert_ok!(result);
    }

    #[test]
    fn check_panics_fails() {
        let (output, result) = run(|harness| {
            check_panics!(harness, 1 + 1);
            Ok(())
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check_panics!(1 + 1)' "));
    }

    #[test]
    fn drop_check_records() {
        let (output, result) = run(|harness| {
            drop_check!(harness, false);
            check!(harness, !harness.failure_recorded());
            Ok(())
        });

        // The recorded destructor failure makes the following check fail too.
        assert_err!(result);
        let mut lines = output.lines();
        assert!(lines
            .next()
            .is_some_and(|line| line.starts_with("ASSERT FAILED IN DESTRUCTOR 'drop_check!(false)' ")));
        assert!(lines
            .next()
            .is_some_and(|line| line.starts_with("ASSERT FAILED 'check!(!harness.failure_recorded())' ")));
    }

    #[test]
    fn checks_in_fault_bodies() {
        let (output, result) = run(|harness| {
            let body = || -> Result<(), Fault> {
                check!(harness, false);
                Ok(())
            };
            match body() {
                Err(Fault::Aborted(signal)) => Err(signal),
                _ => Ok(()),
            }
        });

        assert_err!(result);
        assert!(output.starts_with("ASSERT FAILED 'check!(false)' "));
    }
}
