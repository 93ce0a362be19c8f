use std::path::Path;

use test_utils::check_failing_compilation;

/// Scenario S4: mixing two distinct special integer variants is a compile
/// error — their provenance is display-defining and cannot be reconciled.
#[test]
fn mixing_hex_and_bin_fails_to_compile() {
    check_failing_compilation(Path::new("./demos/mix_hex_bin_error.mon")).unwrap();
}

/// Referencing an undefined name is a reference error, not a silent zero.
#[test]
fn unbound_variable_fails_to_compile() {
    check_failing_compilation(Path::new("./demos/unbound_variable.mon")).unwrap();
}
