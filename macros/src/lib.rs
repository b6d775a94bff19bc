//! Provides the `#[test_case]` attribute for declaring tests to be run by `rtos_test`.
//!
//! ## Usage
//! Annotate a function taking either no arguments or a single `&Tester` argument. The function
//! may return `()`, `rtos_test::Check`, or `Result<(), rtos_test::Fault>`:
//!
//! ``` rust
//! use rtos_test::{check, test_case, Check, Tester};
//!
//! #[test_case]
//! fn it_works(t: &Tester) -> Check {
//!     let result = 2 + 2;
//!     check!(t, result == 4);
//!     Ok(())
//! }
//! ```
//!
//! The attribute replaces the function with a `static` of the same name holding an
//! `rtos_test::TestCase`. The test is not run until it is registered with a `Suite`, which should
//! be done from the firmware's test entry point before the run starts:
//!
//! ``` rust
//! # use rtos_test::{test_case, Suite};
//! # #[test_case]
//! # fn it_works() {}
//! let suite = Suite::new();
//! suite.register_test(&it_works).unwrap();
//! ```

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse, spanned::Spanned, Error, Ident, ItemFn};

/// Defines a test to be run by the `rtos_test` harness.
///
/// # Example
/// ```
/// #[rtos_test_macros::test_case]
/// fn foo(t: &rtos_test::Tester) -> rtos_test::Check {
///     rtos_test::check!(t, true);
///     Ok(())
/// }
/// ```
///
/// Tests without a `Tester` argument are also accepted. They can still fail through panics or by
/// returning an `Err(Fault)`:
///
/// ```
/// #[rtos_test_macros::test_case]
/// fn bar() -> Result<(), rtos_test::Fault> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test_case(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut function: ItemFn = match parse(item) {
        Ok(function) => function,
        Err(error) => return error.into_compile_error().into(),
    };
    let name = function.sig.ident.clone();
    let vis = function.vis.clone();
    let call = match function.sig.inputs.len() {
        0 => quote! { #name() },
        1 => quote! { #name(tester) },
        _ => {
            return Error::new(
                function.sig.inputs.span(),
                "a test case takes either no arguments or a single `&Tester`",
            )
            .into_compile_error()
            .into()
        }
    };
    let runner = Ident::new(&format!("__rtos_test_run_{name}"), Span::call_site());

    // The function itself lives inside the static's initializer, so it no longer needs to be
    // visible outside of it. Its path therefore repeats its name, which `function_name!` folds
    // back into one segment.
    function.vis = syn::Visibility::Inherited;

    TokenStream::from(quote! {
        #[allow(non_upper_case_globals)]
        #vis static #name: ::rtos_test::TestCase = ::rtos_test::TestCase::new(
            {
                #function

                fn #runner(tester: &::rtos_test::Tester<'_>) -> ::rtos_test::Check {
                    ::rtos_test::Termination::terminate(#call, tester)
                }

                #runner
            },
            stringify!(#name),
            file!(),
            line!(),
        );
    })
}
