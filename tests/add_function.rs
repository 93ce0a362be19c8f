use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/add_function.mon";
const EXPECTED: Expected = Expected {
    stdout: "5\n",
    stderr: "",
};

/// Scenario S2: short-form function definition desugars to a lambda and
/// materialises a callable `Function` entry.
#[test]
fn compile_and_run_add_function() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
