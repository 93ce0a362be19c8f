use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/char_literal.mon";
const EXPECTED: Expected = Expected {
    stdout: "A\n",
    stderr: "",
};

#[test]
fn compile_and_run_char_literal() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
