use rtos_test_macros::test_case;

#[test_case]
fn no_arguments() {}

fn main() {
    assert_eq!(no_arguments.name(), "no_arguments");
}
