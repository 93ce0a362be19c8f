use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/hex_literal.mon";
const EXPECTED: Expected = Expected {
    stdout: "0xFF\n",
    stderr: "",
};

/// Scenario S1: a `Hex`-provenance literal prints with the `0x%lX\n` format.
#[test]
fn compile_and_run_hex_literal() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
