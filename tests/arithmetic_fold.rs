use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/arithmetic_fold.mon";
const EXPECTED: Expected = Expected {
    stdout: "5\n2\n2.5\n",
    stderr: "",
};

/// Property P8: arithmetic folds left-to-right, not right-to-left, and
/// integer division truncates toward zero while float division is exact.
#[test]
fn compile_and_run_arithmetic_fold() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
