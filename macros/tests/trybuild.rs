#[test]
fn test_case() {
    let tests = trybuild::TestCases::new();
    tests.pass("tests/pass/*.rs");
}
