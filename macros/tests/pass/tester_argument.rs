use rtos_test::{check, Check, Tester};
use rtos_test_macros::test_case;

#[test_case]
fn tester_argument(tester: &Tester) -> Check {
    check!(tester, 1 + 1 == 2);
    Ok(())
}

fn main() {
    assert_eq!(tester_argument.name(), "tester_argument");
    assert!(tester_argument.file().ends_with("tester_argument.rs"));
}
