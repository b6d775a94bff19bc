use rtos_test::{check, Fault, Tester};
use rtos_test_macros::test_case;

#[test_case]
fn fault_result(tester: &Tester) -> Result<(), Fault> {
    check!(tester, true);
    Err(Fault::Error("not implemented"))
}

fn main() {}
