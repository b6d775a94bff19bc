mod drivers {
    use rtos_test_macros::test_case;

    #[test_case]
    pub fn exported() {}

    #[test_case]
    pub(crate) fn crate_visible(_tester: &rtos_test::Tester) -> rtos_test::Check {
        Ok(())
    }
}

fn main() {
    let suite = rtos_test::Suite::new();
    suite.register_test(&drivers::exported).unwrap();
    suite.register_test(&drivers::crate_visible).unwrap();
}
