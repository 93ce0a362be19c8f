use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/bin_oct.mon";
const EXPECTED: Expected = Expected {
    stdout: "0b1010\n0o17\n",
    stderr: "",
};

#[test]
fn compile_and_run_bin_oct() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
