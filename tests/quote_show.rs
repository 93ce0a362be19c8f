use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/quote_show.mon";
const EXPECTED: Expected = Expected {
    stdout: "(+ 1 2)\n",
    stderr: "",
};

/// Scenario S5: `(show '(+ 1 2))` pretty-prints the quoted list verbatim.
#[test]
fn compile_and_run_quote_show() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
