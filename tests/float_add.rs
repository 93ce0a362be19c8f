use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/float_add.mon";
const EXPECTED: Expected = Expected {
    stdout: "3.5\n",
    stderr: "",
};

/// Scenario S3: mixing an `Int` and a `Float` operand promotes to `Float`.
#[test]
fn compile_and_run_float_add() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
